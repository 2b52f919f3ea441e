//! Oracle module - Domestic gold price reconciliation
//!
//! Polls the Sina quote feed (with Binance and Coinbase as international
//! fallbacks), classifies the Shanghai Gold Exchange as open or closed and
//! publishes one trustworthy snapshot per cycle.

mod aggregator;
pub mod clock;
mod reconciler;
pub mod sources;

pub use aggregator::SnapshotAssembler;
pub use clock::{FixedTime, MarketClock, MarketStatus, SystemTime, TimeSource};
pub use reconciler::{
    convert, reconcile, round_half_up, DomesticDecision, PriceReconciler, Reconciliation,
    GRAMS_PER_TROY_OUNCE, MAX_DOMESTIC_DEVIATION,
};

use anyhow::Result;

use crate::config::SourcesConfig;
use crate::types::{LastKnownGood, PublishedSnapshot};

/// One poll cycle: assemble, classify, reconcile
pub struct PriceEngine {
    assembler: SnapshotAssembler,
    clock: MarketClock,
    reconciler: PriceReconciler,
}

impl PriceEngine {
    pub fn new(assembler: SnapshotAssembler, clock: MarketClock) -> Self {
        Self {
            assembler,
            clock,
            reconciler: PriceReconciler::new(),
        }
    }

    /// Engine wired to the configured HTTP sources and the wall clock
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        Self::with_clock(cfg, MarketClock::system())
    }

    pub fn with_clock(cfg: &SourcesConfig, clock: MarketClock) -> Result<Self> {
        let (primary, fallbacks) = sources::default_sources(cfg)?;
        Ok(Self::new(SnapshotAssembler::new(primary, fallbacks), clock))
    }

    pub fn cache(&self) -> &LastKnownGood {
        self.reconciler.cache()
    }

    /// Run one cycle. Never fails; total outage yields a zero snapshot.
    pub async fn tick(&mut self) -> PublishedSnapshot {
        let raw = self.assembler.assemble().await;
        let status = self.clock.status();
        if status.is_closed() {
            tracing::debug!(%status, "Exchange closed, domestic quote is a stale close");
        }
        self.reconciler.apply(&raw, status.is_closed())
    }
}
