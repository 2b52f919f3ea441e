//! Core types used throughout GoldFeed
//!
//! Defines the per-cycle raw reading, the published snapshot and the
//! last-known-good cache shared by the oracle and its consumers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hard floor for the USD/CNY rate when nothing was ever observed
pub const DEFAULT_RATE_FLOOR: f64 = 7.20;

/// The three quantities the engine tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    /// London spot gold, USD per troy ounce
    International,
    /// Shanghai Gold Exchange Au(T+D), CNY per gram
    Domestic,
    /// USD -> CNY
    Rate,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::International => write!(f, "international"),
            Quantity::Domestic => write!(f, "domestic"),
            Quantity::Rate => write!(f, "rate"),
        }
    }
}

/// Upstream quote feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSource {
    /// Sina finance scraped feed (international, domestic, rate)
    Sina,
    /// Binance PAXG/USDT ticker (international only)
    Binance,
    /// Coinbase PAXG-USD spot (international only)
    Coinbase,
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSource::Sina => write!(f, "Sina"),
            QuoteSource::Binance => write!(f, "Binance"),
            QuoteSource::Coinbase => write!(f, "Coinbase"),
        }
    }
}

/// Keep a value only if it is a finite, strictly positive number
pub fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Partial reading assembled during one poll cycle.
///
/// Fields are private so a present value is always strictly positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawReading {
    international: Option<f64>,
    domestic: Option<f64>,
    rate: Option<f64>,
}

impl RawReading {
    pub fn new(international: f64, domestic: f64, rate: f64) -> Self {
        Self {
            international: positive(international),
            domestic: positive(domestic),
            rate: positive(rate),
        }
    }

    pub fn international(&self) -> Option<f64> {
        self.international
    }

    pub fn domestic(&self) -> Option<f64> {
        self.domestic
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::International => self.international,
            Quantity::Domestic => self.domestic,
            Quantity::Rate => self.rate,
        }
    }

    /// Store a value; non-positive or non-finite input leaves the field absent
    pub fn set(&mut self, quantity: Quantity, value: f64) {
        let slot = match quantity {
            Quantity::International => &mut self.international,
            Quantity::Domestic => &mut self.domestic,
            Quantity::Rate => &mut self.rate,
        };
        *slot = positive(value);
    }

    pub fn with(mut self, quantity: Quantity, value: f64) -> Self {
        self.set(quantity, value);
        self
    }

    /// Fill absent fields from `other`, keeping fields already present
    pub fn merge(&mut self, other: &RawReading) {
        self.international = self.international.or(other.international);
        self.domestic = self.domestic.or(other.domestic);
        self.rate = self.rate.or(other.rate);
    }

    pub fn is_empty(&self) -> bool {
        self.international.is_none() && self.domestic.is_none() && self.rate.is_none()
    }
}

/// Output of one reconciliation, handed to presentation collaborators.
///
/// Numeric fields are either positive or `0.0` meaning "no value yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    pub international: f64,
    pub domestic: f64,
    pub rate: f64,
    pub market_closed: bool,
}

impl PublishedSnapshot {
    pub fn get(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::International => self.international,
            Quantity::Domestic => self.domestic,
            Quantity::Rate => self.rate,
        }
    }

    /// Key -> value view (`market_closed` as 1.0 / 0.0)
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("international", self.international),
            ("domestic", self.domestic),
            ("rate", self.rate),
            ("market_closed", if self.market_closed { 1.0 } else { 0.0 }),
        ])
    }

    pub fn has_prices(&self) -> bool {
        self.domestic > 0.0 || self.international > 0.0
    }
}

impl fmt::Display for PublishedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "domestic={} international={} rate={:.4} closed={}",
            format_price(self.domestic),
            format_price(self.international),
            self.rate,
            self.market_closed
        )
    }
}

/// Two-decimal rendering, `--` for the zero sentinel
pub fn format_price(value: f64) -> String {
    if value > 0.0 {
        format!("{:.2}", value)
    } else {
        "--".to_string()
    }
}

/// Most recent positive value seen for each quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastKnownGood {
    pub international: f64,
    pub domestic: f64,
    pub rate: f64,
}

impl Default for LastKnownGood {
    fn default() -> Self {
        Self {
            international: 0.0,
            domestic: 0.0,
            rate: DEFAULT_RATE_FLOOR,
        }
    }
}

impl LastKnownGood {
    /// Copy of `self` advanced by the positive fields of `snapshot`
    pub fn advanced_by(&self, snapshot: &PublishedSnapshot) -> Self {
        Self {
            international: positive(snapshot.international).unwrap_or(self.international),
            domestic: positive(snapshot.domestic).unwrap_or(self.domestic),
            rate: positive(snapshot.rate).unwrap_or(self.rate),
        }
    }
}
