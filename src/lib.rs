pub mod config;
pub mod currency_provider;
pub mod log;
pub mod portfolio;
pub mod price_provider;
pub mod pricing;
pub mod providers;
pub mod ui;

use anyhow::Result;
use tracing::{debug, info};

use crate::portfolio::{PortfolioRequest, RiskTier, build_portfolio};
use crate::providers::alpha_vantage::AlphaVantageProvider;

/// Loads the configuration, prices an equal-weight portfolio for the given
/// request, and prints it as a table or as JSON.
pub async fn run_plan(
    amount: f64,
    risk: RiskTier,
    currency: Option<String>,
    config_path: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    config.validate()?;

    let currency = currency
        .unwrap_or_else(|| config.currency.clone())
        .to_uppercase();
    let request = PortfolioRequest {
        amount,
        risk,
        currency,
    };
    info!(
        "Planning {} risk portfolio for {:.2} {}",
        request.risk, request.amount, request.currency
    );

    let api_key = config.resolve_api_key()?;
    let provider = AlphaVantageProvider::new(&config.provider.base_url, &api_key)?;

    let symbol_count = config.tiers.get(&request.risk).map_or(0, Vec::len);
    let pb = ui::new_progress_bar(symbol_count as u64);
    pb.set_message("Fetching quotes...");

    let result = build_portfolio(&request, &config.tiers, &provider, &provider, &|| {
        pb.inc(1)
    })
    .await;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.display_as_table());
    }
    Ok(())
}
