//! Equal-weight allocation over the symbol set of a risk tier.

use clap::ValueEnum;
use comfy_table::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::currency_provider::CurrencyRateProvider;
use crate::price_provider::PriceProvider;
use crate::pricing;
use crate::ui;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Ordered symbol list per risk tier, fixed at startup.
pub type SymbolSets = BTreeMap<RiskTier, Vec<String>>;

#[derive(Debug, Clone)]
pub struct PortfolioRequest {
    pub amount: f64,
    pub risk: RiskTier,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetAllocation {
    pub symbol: String,
    /// Unit price in the requested currency.
    pub price: f64,
    /// Fractional shares, rounded to 4 decimals.
    pub shares: f64,
    /// `shares * price`, rounded to 2 decimals.
    pub allocated: f64,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResult {
    pub total: f64,
    pub currency: String,
    pub risk: RiskTier,
    pub breakdown: Vec<AssetAllocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PortfolioResult {
    fn rejected(request: &PortfolioRequest, message: impl Into<String>) -> Self {
        PortfolioResult {
            total: 0.0,
            currency: request.currency.clone(),
            risk: request.risk,
            breakdown: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn display_as_table(&self) -> String {
        if let Some(error) = &self.error {
            return ui::style_text(error, ui::StyleType::Error);
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell(&format!("Price ({})", self.currency)),
            ui::header_cell("Shares"),
            ui::header_cell(&format!("Allocated ({})", self.currency)),
        ]);

        for asset in &self.breakdown {
            table.add_row(vec![
                Cell::new(&asset.symbol),
                ui::amount_cell(format!("{:.2}", asset.price)),
                ui::amount_cell(format!("{:.4}", asset.shares)),
                ui::amount_cell(format!("{:.2}", asset.allocated)),
            ]);
        }

        let allocated: f64 = self.breakdown.iter().map(|a| a.allocated).sum();

        let mut output = format!(
            "Portfolio: {}\n\n",
            ui::style_text(&format!("{} risk", self.risk), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nAllocated {} of {} {}",
            ui::style_text(&format!("{allocated:.2}"), ui::StyleType::TotalValue),
            ui::style_text(&format!("{:.2}", self.total), ui::StyleType::TotalLabel),
            self.currency
        ));

        output
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Builds an equal-weight portfolio for `request` over the configured symbol
/// sets.
///
/// Validation failures and total fetch failure are reported through
/// `PortfolioResult::error`; this function never fails outright. Symbols whose
/// price lookup fails are skipped, and a partial breakdown is still a success.
/// `on_progress` is invoked once per symbol attempted.
pub async fn build_portfolio(
    request: &PortfolioRequest,
    symbol_sets: &SymbolSets,
    prices: &(dyn PriceProvider + Send + Sync),
    rates: &(dyn CurrencyRateProvider + Send + Sync),
    on_progress: &(dyn Fn() + Sync),
) -> PortfolioResult {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return PortfolioResult::rejected(request, "Investment amount must be a positive number");
    }
    if request.currency.trim().is_empty() {
        return PortfolioResult::rejected(request, "Target currency must be provided");
    }
    let symbols = match symbol_sets.get(&request.risk) {
        Some(symbols) if !symbols.is_empty() => symbols,
        _ => {
            return PortfolioResult::rejected(
                request,
                format!("No symbols configured for {} risk tier", request.risk),
            );
        }
    };

    let per_asset = request.amount / symbols.len() as f64;
    debug!(
        risk = %request.risk,
        symbols = symbols.len(),
        per_asset,
        "Allocating equally across tier"
    );

    let mut breakdown = Vec::new();
    for symbol in symbols {
        let lookup = pricing::price_in_currency(symbol, &request.currency, prices, rates).await;
        on_progress();

        let price = match lookup {
            Ok(price) if price > 0.0 => price,
            Ok(price) => {
                warn!(symbol = %symbol, price, "Skipping symbol with non-positive price");
                continue;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Skipping symbol after failed price lookup");
                continue;
            }
        };

        let shares = round_to(per_asset / price, 4);
        let allocated = round_to(shares * price, 2);
        breakdown.push(AssetAllocation {
            symbol: symbol.clone(),
            price,
            shares,
            allocated,
        });
    }

    let error = if breakdown.is_empty() {
        Some(
            "Could not fetch prices for any assets. API rate limit may have been reached."
                .to_string(),
        )
    } else {
        None
    };

    PortfolioResult {
        total: request.amount,
        currency: request.currency.clone(),
        risk: request.risk,
        breakdown,
        error,
    }
}
