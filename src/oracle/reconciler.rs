//! Price Reconciler - Decides which domestic price to publish
//!
//! Combines one cycle's raw reading with the market status and the
//! last-known-good cache:
//! - Closed market: the exchange quote is a stale close, publish the live
//!   cross-rate estimate `international / 31.1034768 * rate` instead
//! - Open market: keep the exchange quote unless it is missing or deviates
//!   more than 5% from the estimate
//! - Missing inputs fall back to the most recent positive value

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{LastKnownGood, PublishedSnapshot, RawReading, DEFAULT_RATE_FLOOR};

/// Grams per troy ounce
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

/// Relative deviation above which an open-market quote is treated as bad data
pub const MAX_DOMESTIC_DEVIATION: f64 = 0.05;

/// Round half-up (away from zero) to `dp` decimal places
pub fn round_half_up(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Unrounded cross-rate estimate in CNY per gram, 0 when `international` is unusable
fn cross_rate(international: f64, rate: f64) -> f64 {
    if international > 0.0 {
        (international / GRAMS_PER_TROY_OUNCE) * rate
    } else {
        0.0
    }
}

/// USD per troy ounce -> CNY per gram, rounded to cents
pub fn convert(international_usd_oz: f64, usd_cny: f64) -> f64 {
    if international_usd_oz <= 0.0 || usd_cny <= 0.0 {
        return 0.0;
    }
    round_half_up(cross_rate(international_usd_oz, usd_cny), 2)
}

/// How the published domestic price was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomesticDecision {
    /// Exchange quote kept
    Raw,
    /// Closed market, live estimate published
    ClosedEstimate,
    /// Open market, exchange quote missing
    MissingQuote,
    /// Open market, exchange quote deviated beyond the threshold
    Anomaly,
    /// Nothing usable this cycle, last published value reused
    Cached,
}

/// Result of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub snapshot: PublishedSnapshot,
    pub cache: LastKnownGood,
    pub decision: DomesticDecision,
}

/// Pure reconciliation of one cycle.
///
/// Returns the snapshot to publish together with the advanced cache; the
/// input cache is left untouched.
pub fn reconcile(raw: &RawReading, market_closed: bool, cache: &LastKnownGood) -> Reconciliation {
    // 1. Rate for the estimate: raw, then cached, then the hard floor
    let mut calc_rate = raw.rate().unwrap_or(cache.rate);
    if calc_rate <= 0.0 {
        calc_rate = DEFAULT_RATE_FLOOR;
    }

    // 2-3. International for the estimate, and the estimate itself
    let international = raw.international().unwrap_or(cache.international);
    let calculated = cross_rate(international, calc_rate);

    // 4. Override the raw domestic quote?
    let raw_domestic = raw.domestic();
    let (override_raw, reason) = if market_closed {
        (calculated > 0.0, DomesticDecision::ClosedEstimate)
    } else {
        match raw_domestic {
            None => (true, DomesticDecision::MissingQuote),
            // Guarded so the deviation is never computed against a zero estimate
            Some(quoted) if calculated > 0.0 => (
                (quoted - calculated).abs() / calculated > MAX_DOMESTIC_DEVIATION,
                DomesticDecision::Anomaly,
            ),
            Some(_) => (false, DomesticDecision::Raw),
        }
    };

    // 5. Choose the published domestic price
    let (domestic, decision) = if override_raw && calculated > 0.0 {
        (calculated, reason)
    } else {
        match raw_domestic {
            None => (cache.domestic, DomesticDecision::Cached),
            Some(quoted) => (quoted, DomesticDecision::Raw),
        }
    };
    let domestic = round_half_up(domestic, 2);

    // 6. International falls back to the cache
    let international = raw.international().unwrap_or(cache.international);

    // 7. Snapshot; only an observed rate is published
    let snapshot = PublishedSnapshot {
        international,
        domestic,
        rate: raw.rate().unwrap_or(0.0),
        market_closed,
    };

    // 8. Cache only moves toward fresh positive values
    Reconciliation {
        snapshot,
        cache: cache.advanced_by(&snapshot),
        decision,
    }
}

/// Owns the last-known-good cache across poll cycles
#[derive(Debug, Clone, Default)]
pub struct PriceReconciler {
    cache: LastKnownGood,
}

impl PriceReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: LastKnownGood) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &LastKnownGood {
        &self.cache
    }

    /// Reconcile one cycle and commit the cache update
    pub fn apply(&mut self, raw: &RawReading, market_closed: bool) -> PublishedSnapshot {
        let outcome = reconcile(raw, market_closed, &self.cache);

        match outcome.decision {
            DomesticDecision::Raw => {}
            DomesticDecision::Cached => tracing::debug!(
                domestic = outcome.snapshot.domestic,
                "No domestic quote or estimate, reusing last known value"
            ),
            decision => tracing::debug!(
                ?decision,
                raw_domestic = ?raw.domestic(),
                estimate = outcome.snapshot.domestic,
                "Domestic quote replaced by cross-rate estimate"
            ),
        }
        if raw.international().is_none() && outcome.snapshot.international > 0.0 {
            tracing::debug!(
                international = outcome.snapshot.international,
                "No international quote, reusing last known value"
            );
        }

        self.cache = outcome.cache;
        outcome.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quantity;

    fn raw(international: f64, domestic: f64, rate: f64) -> RawReading {
        RawReading::new(international, domestic, rate)
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert(2000.0, 7.0), 450.11);
        assert_eq!(convert(0.0, 7.0), 0.0);
        assert_eq!(convert(2000.0, 0.0), 0.0);
        assert_eq!(convert(-5.0, 7.0), 0.0);
    }

    #[test]
    fn test_round_half_up_not_bankers() {
        assert_eq!(round_half_up(2.5, 0), 3.0);
        assert_eq!(round_half_up(0.125, 2), 0.13);
        assert_eq!(round_half_up(1.005, 2), 1.0); // 1.005 is stored as 1.00499...
        assert_eq!(round_half_up(450.11045, 2), 450.11);
    }

    #[test]
    fn test_closed_market_uses_estimate() {
        let cache = LastKnownGood::default();
        let out = reconcile(&raw(2000.0, 0.0, 7.3), true, &cache);

        let expected = convert(2000.0, 7.3);
        assert_eq!(out.snapshot.domestic, expected);
        assert!((out.snapshot.domestic - (2000.0 / GRAMS_PER_TROY_OUNCE) * 7.3).abs() < 0.01);
        assert!(out.snapshot.market_closed);
        assert_eq!(out.decision, DomesticDecision::ClosedEstimate);
    }

    #[test]
    fn test_closed_market_ignores_raw_quote() {
        let out = reconcile(&raw(2000.0, 452.0, 7.3), true, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, convert(2000.0, 7.3));
    }

    #[test]
    fn test_open_market_anomaly_is_replaced() {
        let out = reconcile(&raw(2000.0, 600.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 450.11);
        assert_eq!(out.decision, DomesticDecision::Anomaly);
    }

    #[test]
    fn test_open_market_keeps_close_quote() {
        let out = reconcile(&raw(2000.0, 452.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 452.0);
        assert_eq!(out.decision, DomesticDecision::Raw);
        assert!(!out.snapshot.market_closed);
    }

    #[test]
    fn test_open_market_deviation_threshold() {
        // Estimate is 450.11: 472 is ~4.86% off and kept
        let out = reconcile(&raw(2000.0, 472.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 472.0);
        assert_eq!(out.decision, DomesticDecision::Raw);

        // 473 is ~5.09% off and replaced
        let out = reconcile(&raw(2000.0, 473.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 450.11);
        assert_eq!(out.decision, DomesticDecision::Anomaly);
    }

    #[test]
    fn test_open_market_missing_quote_uses_estimate() {
        let out = reconcile(&raw(2000.0, 0.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 450.11);
        assert_eq!(out.decision, DomesticDecision::MissingQuote);
    }

    #[test]
    fn test_raw_quote_kept_when_no_estimate_possible() {
        // No international anywhere: estimate is 0, the guard skips the deviation check
        let out = reconcile(&raw(0.0, 452.0, 7.0), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 452.0);

        let out = reconcile(&raw(0.0, 452.0, 7.0), true, &LastKnownGood::default());
        assert_eq!(out.snapshot.domestic, 452.0);
    }

    #[test]
    fn test_total_failure_publishes_zeros() {
        let out = reconcile(&RawReading::default(), false, &LastKnownGood::default());
        assert_eq!(out.snapshot.international, 0.0);
        assert_eq!(out.snapshot.domestic, 0.0);
        assert_eq!(out.snapshot.rate, 0.0);
        assert_eq!(out.snapshot.to_map()["rate"], 0.0);
        assert_eq!(out.decision, DomesticDecision::Cached);
        assert_eq!(out.cache.rate, DEFAULT_RATE_FLOOR);
    }

    #[test]
    fn test_rate_falls_back_to_cache_then_floor() {
        let cache = LastKnownGood {
            international: 0.0,
            domestic: 0.0,
            rate: 7.1,
        };
        let out = reconcile(&raw(2000.0, 0.0, 0.0), true, &cache);
        assert_eq!(out.snapshot.domestic, convert(2000.0, 7.1));
        // Not observed this cycle, so not published
        assert_eq!(out.snapshot.rate, 0.0);
        assert_eq!(out.cache.rate, 7.1);

        let cache = LastKnownGood {
            rate: 0.0,
            ..cache
        };
        let out = reconcile(&raw(2000.0, 0.0, 0.0), true, &cache);
        assert_eq!(out.snapshot.domestic, convert(2000.0, DEFAULT_RATE_FLOOR));
        assert_eq!(out.snapshot.rate, 0.0);
    }

    #[test]
    fn test_cached_international_drives_estimate() {
        let cache = LastKnownGood {
            international: 2000.0,
            domestic: 449.0,
            rate: 7.0,
        };
        let out = reconcile(&RawReading::default(), true, &cache);
        assert_eq!(out.snapshot.international, 2000.0);
        assert_eq!(out.snapshot.domestic, 450.11);
    }

    #[test]
    fn test_cached_domestic_when_nothing_else() {
        let cache = LastKnownGood {
            international: 0.0,
            domestic: 449.0,
            rate: 7.0,
        };
        let out = reconcile(&RawReading::default(), false, &cache);
        assert_eq!(out.snapshot.domestic, 449.0);
        assert_eq!(out.decision, DomesticDecision::Cached);
    }

    #[test]
    fn test_cache_is_monotonic() {
        let mut reconciler = PriceReconciler::new();
        reconciler.apply(&raw(2000.0, 452.0, 7.0), false);
        assert_eq!(
            *reconciler.cache(),
            LastKnownGood {
                international: 2000.0,
                domestic: 452.0,
                rate: 7.0,
            }
        );

        // A cycle where only the rate arrives
        let snapshot = reconciler.apply(&RawReading::default().with(Quantity::Rate, 7.2), false);
        assert_eq!(snapshot.international, 2000.0);
        assert_eq!(reconciler.cache().international, 2000.0);
        assert_eq!(reconciler.cache().rate, 7.2);
        assert!(reconciler.cache().domestic > 0.0);
    }

    #[test]
    fn test_input_cache_untouched() {
        let cache = LastKnownGood::default();
        let out = reconcile(&raw(2000.0, 452.0, 7.0), false, &cache);
        assert_eq!(cache, LastKnownGood::default());
        assert_eq!(out.cache.domestic, 452.0);
    }
}
