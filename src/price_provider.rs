use anyhow::Result;
use async_trait::async_trait;

/// A quoted price in the currency the upstream API natively reports.
#[derive(Debug, Clone)]
pub struct Quote {
    pub price: f64,
    pub currency: String,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<Quote>;
}
