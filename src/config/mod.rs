//! Configuration management for GoldFeed
//!
//! Loads defaults, optional config files and environment variables via .env

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

pub const SINA_QUOTE_URL: &str = "http://hq.sinajs.cn/list=hf_XAU,gds_AUTD,USDCNY";
pub const BINANCE_PAXG_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=PAXGUSDT";
pub const COINBASE_PAXG_URL: &str = "https://api.coinbase.com/v2/prices/PAXG-USD/spot";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub poller: PollerConfig,
    pub sources: SourcesConfig,
    pub alerts: AlertsConfig,
    pub visibility: VisibilityConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (GOLDFEED_*)
            .add_source(Environment::with_prefix("GOLDFEED").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Builder preloaded with every default
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            .set_default("poller.interval_ms", 2000)?
            // Sources
            .set_default("sources.primary_url", SINA_QUOTE_URL)?
            .set_default("sources.fallback_a_url", BINANCE_PAXG_URL)?
            .set_default("sources.fallback_b_url", COINBASE_PAXG_URL)?
            .set_default("sources.referer", "https://finance.sina.com.cn/")?
            .set_default("sources.user_agent", BROWSER_USER_AGENT)?
            .set_default("sources.connect_timeout_ms", 10_000)?
            .set_default("sources.request_timeout_ms", 10_000)?
            // Alerts
            .set_default("alerts.domestic_max", 0.0)?
            .set_default("alerts.domestic_min", 0.0)?
            .set_default("alerts.international_max", 0.0)?
            .set_default("alerts.international_min", 0.0)?
            .set_default("alerts.cooldown_secs", 600)?
            // Visibility
            .set_default("visibility.enabled", false)?
            .set_default("visibility.domestic_min", 0.0)?
            .set_default("visibility.domestic_max", 0.0)?
            .set_default("visibility.international_min", 0.0)?
            .set_default("visibility.international_max", 0.0)?
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "interval_ms={} primary={} timeouts={}ms/{}ms alerts(d={}..{} i={}..{}) visibility={}",
            self.poller.interval_ms,
            self.sources.primary_url,
            self.sources.connect_timeout_ms,
            self.sources.request_timeout_ms,
            self.alerts.domestic_min,
            self.alerts.domestic_max,
            self.alerts.international_min,
            self.alerts.international_max,
            self.visibility.enabled
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
