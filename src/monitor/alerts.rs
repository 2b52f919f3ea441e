//! Price alerts with per-rule cooldown

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;

use crate::config::AlertsConfig;
use crate::types::{format_price, PublishedSnapshot, Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    DomesticAbove,
    DomesticBelow,
    InternationalAbove,
    InternationalBelow,
}

impl AlertKind {
    pub fn quantity(&self) -> Quantity {
        match self {
            AlertKind::DomesticAbove | AlertKind::DomesticBelow => Quantity::Domestic,
            AlertKind::InternationalAbove | AlertKind::InternationalBelow => {
                Quantity::International
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub kind: AlertKind,
    pub price: f64,
    pub threshold: f64,
    pub ts: DateTime<Utc>,
}

impl fmt::Display for PriceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.kind {
            AlertKind::DomesticAbove | AlertKind::InternationalAbove => "above",
            AlertKind::DomesticBelow | AlertKind::InternationalBelow => "below",
        };
        write!(
            f,
            "{} price {} is {} {}",
            self.kind.quantity(),
            format_price(self.price),
            direction,
            format_price(self.threshold)
        )
    }
}

/// Threshold rules; a zero threshold disables its rule
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlertRules {
    pub domestic_max: f64,
    pub domestic_min: f64,
    pub international_max: f64,
    pub international_min: f64,
}

impl AlertRules {
    /// Rules breached by `snapshot`, with their thresholds
    fn breaches(&self, snapshot: &PublishedSnapshot) -> Vec<(AlertKind, f64, f64)> {
        let mut out = Vec::new();
        let d = snapshot.domestic;
        let i = snapshot.international;

        if self.domestic_max > 0.0 && d >= self.domestic_max {
            out.push((AlertKind::DomesticAbove, d, self.domestic_max));
        }
        if self.domestic_min > 0.0 && d > 0.0 && d <= self.domestic_min {
            out.push((AlertKind::DomesticBelow, d, self.domestic_min));
        }
        if self.international_max > 0.0 && i >= self.international_max {
            out.push((AlertKind::InternationalAbove, i, self.international_max));
        }
        if self.international_min > 0.0 && i > 0.0 && i <= self.international_min {
            out.push((AlertKind::InternationalBelow, i, self.international_min));
        }
        out
    }
}

pub struct AlertMonitor {
    rules: AlertRules,
    cooldown: Duration,
    last_fired: HashMap<AlertKind, DateTime<Utc>>,
}

impl AlertMonitor {
    pub fn new(rules: AlertRules, cooldown: Duration) -> Self {
        Self {
            rules,
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn from_config(cfg: &AlertsConfig) -> Self {
        let rules = AlertRules {
            domestic_max: cfg.domestic_max,
            domestic_min: cfg.domestic_min,
            international_max: cfg.international_max,
            international_min: cfg.international_min,
        };
        let cooldown = Duration::from_std(std::time::Duration::from_secs(cfg.cooldown_secs))
            .unwrap_or_else(|_| Duration::days(365));
        Self::new(rules, cooldown)
    }

    /// Alerts that fire for `snapshot` at `now`, honouring each rule's cooldown
    pub fn evaluate(&mut self, snapshot: &PublishedSnapshot, now: DateTime<Utc>) -> Vec<PriceAlert> {
        if !snapshot.has_prices() {
            return Vec::new();
        }

        let mut fired = Vec::new();
        for (kind, price, threshold) in self.rules.breaches(snapshot) {
            let ready = self
                .last_fired
                .get(&kind)
                .map_or(true, |last| now - *last > self.cooldown);
            if !ready {
                continue;
            }
            self.last_fired.insert(kind, now);
            fired.push(PriceAlert {
                kind,
                price,
                threshold,
                ts: now,
            });
        }
        fired
    }
}
