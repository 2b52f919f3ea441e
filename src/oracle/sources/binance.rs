//! Binance REST ticker client
//!
//! PAXG tracks one troy ounce of gold, so the PAXG/USDT last price stands in
//! for the international spot when the primary feed has none.

use async_trait::async_trait;
use reqwest::Client;

use super::{get_text, json_price, FetchError, PriceSource};
use crate::types::{Quantity, QuoteSource, RawReading};

#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    url: String,
}

impl BinanceClient {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn source(&self) -> QuoteSource {
        QuoteSource::Binance
    }

    async fn fetch(&self) -> Result<RawReading, FetchError> {
        // {"symbol":"PAXGUSDT","price":"2001.50000000"}
        let body = get_text(self.client.get(&self.url)).await?;
        let price = json_price(&body, &["price"])?;
        Ok(RawReading::default().with(Quantity::International, price))
    }
}
