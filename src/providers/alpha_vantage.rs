use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::currency_provider::CurrencyRateProvider;
use crate::price_provider::{PriceProvider, Quote};

/// Alpha Vantage quotes equities in USD regardless of the exchange.
const QUOTE_CURRENCY: &str = "USD";

/// Client for the Alpha Vantage query API, serving both equity quotes and
/// currency exchange rates.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("folioplan/0.1")
            .build()?;
        Ok(AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    // Alpha Vantage returns numbers as strings, keyed with ordinal prefixes.
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    #[instrument(name = "AlphaVantageQuote", skip(self), fields(symbol = %symbol))]
    async fn fetch_price(&self, symbol: &str) -> Result<Quote> {
        debug!("Requesting GLOBAL_QUOTE for {symbol}");

        let response = self
            .client
            .get(self.query_url())
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let data = response
            .json::<GlobalQuoteResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse quote response for {}: {}", symbol, e))?;

        // Rate-limited responses come back as 200 with a "Note" body and no
        // "Global Quote" object, so a missing field covers that case too.
        let raw = data
            .global_quote
            .and_then(|quote| quote.price)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let price: f64 = raw
            .parse()
            .map_err(|_| anyhow!("Unparsable price '{}' for symbol: {}", raw, symbol))?;

        Ok(Quote {
            price,
            currency: QUOTE_CURRENCY.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    exchange_rate: Option<ExchangeRate>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    rate: Option<String>,
}

#[async_trait]
impl CurrencyRateProvider for AlphaVantageProvider {
    #[instrument(name = "AlphaVantageRate", skip(self), fields(from = %from, to = %to))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        debug!("Requesting CURRENCY_EXCHANGE_RATE for {from}/{to}");

        let response = self
            .client
            .get(self.query_url())
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from),
                ("to_currency", to),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}{}", e, from, to))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}{}",
                response.status(),
                from,
                to
            ));
        }

        let text = response.text().await?;
        let data: ExchangeRateResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rate response for {}{}: {}", from, to, e))?;

        let raw = data
            .exchange_rate
            .and_then(|rate| rate.rate)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}{}", from, to))?;

        raw.parse()
            .map_err(|_| anyhow!("Unparsable rate '{}' for currency pair: {}{}", raw, from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_quote(server: &MockServer, symbol: &str, body: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", symbol))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mock_rate(server: &MockServer, from: &str, to: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "CURRENCY_EXCHANGE_RATE"))
            .and(query_param("from_currency", from))
            .and(query_param("to_currency", to))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn provider(server: &MockServer) -> AlphaVantageProvider {
        AlphaVantageProvider::new(&server.uri(), "test-key").unwrap()
    }

    #[tokio::test]
    async fn successful_quote_fetch() {
        let server = MockServer::start().await;
        let body = r#"{
            "Global Quote": {
                "01. symbol": "AAPL",
                "05. price": "178.7200",
                "07. latest trading day": "2024-03-01"
            }
        }"#;
        mock_quote(&server, "AAPL", body, 200).await;

        let quote = provider(&server).fetch_price("AAPL").await.unwrap();
        assert_eq!(quote.price, 178.72);
        assert_eq!(quote.currency, "USD");
    }

    #[tokio::test]
    async fn rate_limit_note_is_missing_price_data() {
        let server = MockServer::start().await;
        let body = r#"{
            "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."
        }"#;
        mock_quote(&server, "AAPL", body, 200).await;

        let result = provider(&server).fetch_price("AAPL").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn empty_quote_object_is_missing_price_data() {
        let server = MockServer::start().await;
        mock_quote(&server, "UNKNOWN", r#"{"Global Quote": {}}"#, 200).await;

        let result = provider(&server).fetch_price("UNKNOWN").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No price data found for symbol: UNKNOWN"
        );
    }

    #[tokio::test]
    async fn unparsable_price_string_is_an_error() {
        let server = MockServer::start().await;
        let body = r#"{"Global Quote": {"05. price": "not-a-number"}}"#;
        mock_quote(&server, "AAPL", body, 200).await;

        let result = provider(&server).fetch_price("AAPL").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Unparsable price 'not-a-number' for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn http_error_is_reported_with_status() {
        let server = MockServer::start().await;
        mock_quote(&server, "AAPL", "", 500).await;

        let result = provider(&server).fetch_price("AAPL").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn successful_rate_fetch() {
        let server = MockServer::start().await;
        let body = r#"{
            "Realtime Currency Exchange Rate": {
                "1. From_Currency Code": "USD",
                "3. To_Currency Code": "EUR",
                "5. Exchange Rate": "0.90120000"
            }
        }"#;
        mock_rate(&server, "USD", "EUR", body).await;

        let rate = provider(&server).get_rate("USD", "EUR").await.unwrap();
        assert_eq!(rate, 0.9012);
    }

    #[tokio::test]
    async fn convert_applies_the_fetched_rate() {
        let server = MockServer::start().await;
        let body = r#"{
            "Realtime Currency Exchange Rate": {
                "5. Exchange Rate": "2.0000"
            }
        }"#;
        mock_rate(&server, "USD", "GBP", body).await;

        let converted = provider(&server)
            .convert(150.5, "USD", "GBP")
            .await
            .unwrap();
        assert_eq!(converted, 301.0);
    }

    #[tokio::test]
    async fn missing_rate_field_is_an_error() {
        let server = MockServer::start().await;
        mock_rate(&server, "USD", "EUR", r#"{"Error Message": "Invalid API call"}"#).await;

        let result = provider(&server).get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USDEUR"
        );
    }

    #[tokio::test]
    async fn malformed_rate_json_is_a_parse_error() {
        let server = MockServer::start().await;
        mock_rate(&server, "USD", "EUR", "not json at all").await;

        let result = provider(&server).get_rate("USD", "EUR").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse rate response for USDEUR")
        );
    }
}
