//! Configuration section types

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Delay between poll cycles in milliseconds
    pub interval_ms: u64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Sina quote list (hf_XAU, gds_AUTD, USDCNY)
    pub primary_url: String,
    /// First international fallback (Binance PAXGUSDT)
    pub fallback_a_url: String,
    /// Second international fallback (Coinbase PAXG-USD)
    pub fallback_b_url: String,
    /// Referer sent to the primary feed
    pub referer: String,
    /// User-Agent sent to the primary feed
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl SourcesConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Price alert thresholds. Zero disables a rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertsConfig {
    pub domestic_max: f64,
    pub domestic_min: f64,
    pub international_max: f64,
    pub international_min: f64,
    /// Minimum seconds between two firings of the same rule
    pub cooldown_secs: u64,
}

/// Show prices only while inside these bands. 0/0 means unbounded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisibilityConfig {
    pub enabled: bool,
    pub domestic_min: f64,
    pub domestic_max: f64,
    pub international_min: f64,
    pub international_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of the pretty formatter
    pub json: bool,
}
