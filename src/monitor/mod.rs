//! Snapshot consumers
//!
//! Alerting, trend arrows, visibility band and the holding-cost calculator.
//! All of them read a published snapshot and never feed back into the oracle.

mod alerts;
mod cost_basis;
mod trend;

pub use alerts::{AlertKind, AlertMonitor, AlertRules, PriceAlert};
pub use cost_basis::{average_cost, Holding};
pub use trend::{Trend, TrendTracker, Trends};

use crate::config::VisibilityConfig;

/// Inclusive price band, unbounded when both ends are zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn contains(&self, value: f64) -> bool {
        (self.min == 0.0 && self.max == 0.0) || (value >= self.min && value <= self.max)
    }
}

/// Hides prices that fall outside the configured bands
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisibilityBand {
    pub enabled: bool,
    pub domestic: Band,
    pub international: Band,
}

impl VisibilityBand {
    pub fn from_config(cfg: &VisibilityConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            domestic: Band {
                min: cfg.domestic_min,
                max: cfg.domestic_max,
            },
            international: Band {
                min: cfg.international_min,
                max: cfg.international_max,
            },
        }
    }

    pub fn should_show(&self, domestic: f64, international: f64) -> bool {
        !self.enabled || (self.domestic.contains(domestic) && self.international.contains(international))
    }
}
