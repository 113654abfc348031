use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

use crate::portfolio::{RiskTier, SymbolSets};

/// Environment variable holding the Alpha Vantage API key. Takes precedence
/// over the `api_key` config entry.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://www.alphavantage.co".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Symbols held per risk tier, in allocation order.
    #[serde(default = "default_tiers")]
    pub tiers: SymbolSets,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Currency used when the request does not specify one.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Prefer the environment variable for the key; this entry exists for
    /// setups where exporting one is impractical.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_tiers() -> SymbolSets {
    let tier = |symbols: [&str; 5]| symbols.iter().map(|s| s.to_string()).collect();
    SymbolSets::from([
        (RiskTier::Low, tier(["VOO", "BND", "JNJ", "PG", "KO"])),
        (
            RiskTier::Medium,
            tier(["AAPL", "MSFT", "VTI", "GOOGL", "AMZN"]),
        ),
        (
            RiskTier::High,
            tier(["TSLA", "NVDA", "COIN", "AMD", "PLTR"]),
        ),
    ])
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tiers: default_tiers(),
            provider: ProviderConfig::default(),
            currency: default_currency(),
            api_key: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "folioplan", "folioplan")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Every configured tier must carry at least one symbol.
    pub fn validate(&self) -> Result<()> {
        for (tier, symbols) in &self.tiers {
            if symbols.is_empty() {
                bail!("Risk tier '{tier}' has no symbols configured");
            }
            if symbols.iter().any(|s| s.trim().is_empty()) {
                bail!("Risk tier '{tier}' contains a blank symbol");
            }
        }
        Ok(())
    }

    /// Resolves the API key from the environment, then the config file.
    pub fn resolve_api_key(&self) -> Result<String> {
        env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
            .with_context(|| {
                format!("No API key found: set {API_KEY_ENV} or add api_key to the config file")
            })
    }
}
