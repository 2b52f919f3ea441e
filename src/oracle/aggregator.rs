//! Snapshot Assembler - Merges source readings for one poll cycle
//!
//! The primary feed supplies all three quantities. Only when it has no
//! international price are the fallbacks asked, one at a time in priority
//! order, stopping at the first that answers.

use crate::oracle::sources::{self, PriceSource};
use crate::types::RawReading;

pub struct SnapshotAssembler {
    primary: Box<dyn PriceSource>,
    /// International-only sources, highest priority first
    fallbacks: Vec<Box<dyn PriceSource>>,
}

impl SnapshotAssembler {
    pub fn new(primary: Box<dyn PriceSource>, fallbacks: Vec<Box<dyn PriceSource>>) -> Self {
        Self { primary, fallbacks }
    }

    /// Produce this cycle's raw reading. Never fails; missing data stays absent.
    pub async fn assemble(&self) -> RawReading {
        let mut reading = sources::read(self.primary.as_ref()).await;

        if reading.international().is_none() {
            for fallback in &self.fallbacks {
                let partial = sources::read(fallback.as_ref()).await;
                if let Some(price) = partial.international() {
                    tracing::info!(
                        source = %fallback.source(),
                        international = price,
                        "International price from fallback"
                    );
                    reading.merge(&partial);
                    break;
                }
            }
        }

        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::sources::FetchError;
    use crate::types::{Quantity, QuoteSource};
    use async_trait::async_trait;
    use mockall::{mock, Sequence};

    mock! {
        Source {}

        #[async_trait]
        impl PriceSource for Source {
            fn source(&self) -> QuoteSource;
            async fn fetch(&self) -> Result<RawReading, FetchError>;
        }
    }

    fn source(kind: QuoteSource, reading: Option<RawReading>, calls: usize) -> MockSource {
        let mut mock = MockSource::new();
        mock.expect_source().return_const(kind);
        mock.expect_fetch().times(calls).returning(move || match reading {
            Some(r) => Ok(r),
            None => Err(FetchError::Status(503)),
        });
        mock
    }

    #[tokio::test]
    async fn test_primary_complete_skips_fallbacks() {
        let primary = source(
            QuoteSource::Sina,
            Some(RawReading::new(2000.0, 452.0, 7.0)),
            1,
        );
        let binance = source(QuoteSource::Binance, None, 0);
        let coinbase = source(QuoteSource::Coinbase, None, 0);

        let assembler =
            SnapshotAssembler::new(Box::new(primary), vec![Box::new(binance), Box::new(coinbase)]);
        let reading = assembler.assemble().await;

        assert_eq!(reading, RawReading::new(2000.0, 452.0, 7.0));
    }

    #[tokio::test]
    async fn test_first_fallback_wins() {
        let primary = source(
            QuoteSource::Sina,
            Some(RawReading::new(0.0, 452.0, 7.0)),
            1,
        );
        let binance = source(
            QuoteSource::Binance,
            Some(RawReading::default().with(Quantity::International, 2001.5)),
            1,
        );
        let coinbase = source(QuoteSource::Coinbase, None, 0);

        let assembler =
            SnapshotAssembler::new(Box::new(primary), vec![Box::new(binance), Box::new(coinbase)]);
        let reading = assembler.assemble().await;

        assert_eq!(reading.international(), Some(2001.5));
        assert_eq!(reading.domestic(), Some(452.0));
        assert_eq!(reading.rate(), Some(7.0));
    }

    #[tokio::test]
    async fn test_fallbacks_tried_in_order() {
        let mut seq = Sequence::new();

        let mut primary = MockSource::new();
        primary.expect_source().return_const(QuoteSource::Sina);
        primary
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(FetchError::Status(500)));

        let mut binance = MockSource::new();
        binance.expect_source().return_const(QuoteSource::Binance);
        binance
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(FetchError::Body("not json".to_string())));

        let mut coinbase = MockSource::new();
        coinbase.expect_source().return_const(QuoteSource::Coinbase);
        coinbase
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(RawReading::default().with(Quantity::International, 1999.0)));

        let assembler =
            SnapshotAssembler::new(Box::new(primary), vec![Box::new(binance), Box::new(coinbase)]);
        let reading = assembler.assemble().await;

        assert_eq!(reading.international(), Some(1999.0));
        assert_eq!(reading.domestic(), None);
        assert_eq!(reading.rate(), None);
    }

    #[tokio::test]
    async fn test_everything_down_is_empty() {
        let primary = source(QuoteSource::Sina, None, 1);
        let binance = source(QuoteSource::Binance, None, 1);
        let coinbase = source(QuoteSource::Coinbase, None, 1);

        let assembler =
            SnapshotAssembler::new(Box::new(primary), vec![Box::new(binance), Box::new(coinbase)]);

        assert!(assembler.assemble().await.is_empty());
    }
}
