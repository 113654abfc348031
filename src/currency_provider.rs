//! Provides currency rate conversion for the application.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Returns the spot multiplier that converts one unit of `from` into `to`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;

    /// Converts `amount` from one currency to another using the spot rate.
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let rate = self.get_rate(from, to).await?;
        Ok(amount * rate)
    }
}
