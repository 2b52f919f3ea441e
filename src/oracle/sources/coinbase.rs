//! Coinbase spot price client (PAXG-USD)

use async_trait::async_trait;
use reqwest::Client;

use super::{get_text, json_price, FetchError, PriceSource};
use crate::types::{Quantity, QuoteSource, RawReading};

#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    client: Client,
    url: String,
}

impl CoinbaseClient {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinbaseClient {
    fn source(&self) -> QuoteSource {
        QuoteSource::Coinbase
    }

    async fn fetch(&self) -> Result<RawReading, FetchError> {
        // {"data":{"base":"PAXG","currency":"USD","amount":"2001.5"}}
        let body = get_text(self.client.get(&self.url)).await?;
        let price = json_price(&body, &["data", "amount"])?;
        Ok(RawReading::default().with(Quantity::International, price))
    }
}
