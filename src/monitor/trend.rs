//! Tick-to-tick price direction

use serde::Serialize;
use std::fmt;

use crate::types::PublishedSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
    /// No previous price to compare against
    Unknown,
}

impl Trend {
    pub fn between(current: f64, previous: f64) -> Self {
        if previous <= 0.0 {
            Trend::Unknown
        } else if current > previous {
            Trend::Up
        } else if current < previous {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "▲"),
            Trend::Down => write!(f, "▼"),
            Trend::Flat | Trend::Unknown => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trends {
    pub domestic: Trend,
    pub international: Trend,
}

/// Remembers the previous displayed prices
#[derive(Debug, Clone, Default)]
pub struct TrendTracker {
    prev_domestic: f64,
    prev_international: f64,
}

impl TrendTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare with the previous snapshot, per quantity. A zero price reports
    /// `Unknown` and leaves that quantity's history alone.
    pub fn observe(&mut self, snapshot: &PublishedSnapshot) -> Trends {
        Trends {
            domestic: Self::advance(&mut self.prev_domestic, snapshot.domestic),
            international: Self::advance(&mut self.prev_international, snapshot.international),
        }
    }

    fn advance(previous: &mut f64, current: f64) -> Trend {
        if current <= 0.0 {
            return Trend::Unknown;
        }
        let trend = Trend::between(current, *previous);
        *previous = current;
        trend
    }
}
