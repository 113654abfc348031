//! Composes a quote lookup with an exchange-rate lookup to price a symbol in
//! the currency the user asked for.

use anyhow::{Context, Result};
use tracing::debug;

use crate::currency_provider::CurrencyRateProvider;
use crate::price_provider::PriceProvider;

/// Fetches the latest price for `symbol`, converted into `target_currency`.
///
/// A failed exchange-rate lookup is an error for the whole symbol, never a
/// silently unconverted price labelled with the wrong currency.
pub async fn price_in_currency(
    symbol: &str,
    target_currency: &str,
    prices: &(dyn PriceProvider + Send + Sync),
    rates: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<f64> {
    let quote = prices.fetch_price(symbol).await?;

    if quote.currency == target_currency {
        return Ok(quote.price);
    }

    let converted = rates
        .convert(quote.price, &quote.currency, target_currency)
        .await
        .with_context(|| {
            format!(
                "Could not convert {} quote from {} to {}",
                symbol, quote.currency, target_currency
            )
        })?;
    debug!(
        symbol,
        quoted = quote.price,
        converted,
        "Converted quote from {} to {}",
        quote.currency,
        target_currency
    );
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_provider::Quote;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FixedQuote(f64);

    #[async_trait]
    impl PriceProvider for FixedQuote {
        async fn fetch_price(&self, _symbol: &str) -> Result<Quote> {
            Ok(Quote {
                price: self.0,
                currency: "USD".to_string(),
            })
        }
    }

    struct FixedRate(Option<f64>);

    #[async_trait]
    impl CurrencyRateProvider for FixedRate {
        async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
            self.0.ok_or_else(|| anyhow!("No rate for {from}{to}"))
        }
    }

    #[tokio::test]
    async fn same_currency_skips_rate_lookup() {
        let price = price_in_currency("VOO", "USD", &FixedQuote(412.5), &FixedRate(None))
            .await
            .unwrap();
        assert_eq!(price, 412.5);
    }

    #[tokio::test]
    async fn applies_exchange_rate_for_other_currencies() {
        let price = price_in_currency("VOO", "EUR", &FixedQuote(100.0), &FixedRate(Some(0.9)))
            .await
            .unwrap();
        assert!((price - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rate_failure_fails_the_symbol() {
        let result = price_in_currency("VOO", "EUR", &FixedQuote(100.0), &FixedRate(None)).await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Could not convert VOO quote from USD to EUR"));
    }
}
