use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use folioplan::log::init_logging;
use folioplan::portfolio::RiskTier;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Plan an equal-weight portfolio allocation
    Plan {
        /// Amount to invest
        #[arg(short, long)]
        amount: f64,

        /// Risk tolerance tier
        #[arg(short, long, value_enum)]
        risk: RiskTier,

        /// Target currency code, defaults to the configured currency
        #[arg(long)]
        currency: Option<String>,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(Commands::Plan {
            amount,
            risk,
            currency,
            json,
        }) => folioplan::run_plan(amount, risk, currency, cli.config_path.as_deref(), json).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> Result<()> {
    use anyhow::Context;

    let path = folioplan::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
tiers:
  low: ["VOO", "BND", "JNJ", "PG", "KO"]
  medium: ["AAPL", "MSFT", "VTI", "GOOGL", "AMZN"]
  high: ["TSLA", "NVDA", "COIN", "AMD", "PLTR"]

provider:
  base_url: "https://www.alphavantage.co"

currency: "USD"

# The Alpha Vantage API key is read from the ALPHAVANTAGE_API_KEY environment
# variable. Uncomment to store it here instead:
# api_key: "..."
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    println!("Created default configuration at {}", path.display());
    Ok(())
}
