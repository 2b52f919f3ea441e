//! Quote source implementations (Sina primary, Binance and Coinbase fallbacks)

mod binance;
mod coinbase;
mod sina;

pub use binance::BinanceClient;
pub use coinbase::CoinbaseClient;
pub use sina::{parse_payload, RateLayout, SinaClient};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::SourcesConfig;
use crate::types::{QuoteSource, RawReading};

/// Why a fetch produced nothing
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed body: {0}")]
    Body(String),
    #[error("field `{0}` missing or not a positive number")]
    Field(&'static str),
}

/// Trait for quote source clients
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Which upstream this client talks to
    fn source(&self) -> QuoteSource;

    /// One request against the upstream
    async fn fetch(&self) -> Result<RawReading, FetchError>;
}

/// Fetch from `source`, degrading any failure to an empty reading
pub async fn read(source: &dyn PriceSource) -> RawReading {
    match source.fetch().await {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!(source = %source.source(), error = %e, "Quote fetch failed");
            RawReading::default()
        }
    }
}

/// Shared HTTP client with the configured connect and request timeouts
pub fn build_http_client(cfg: &SourcesConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout())
        .build()
        .context("Failed to create HTTP client")
}

/// The three clients in priority order: primary, fallback A, fallback B
pub fn default_sources(
    cfg: &SourcesConfig,
) -> Result<(Box<dyn PriceSource>, Vec<Box<dyn PriceSource>>)> {
    let client = build_http_client(cfg)?;
    let primary: Box<dyn PriceSource> = Box::new(SinaClient::new(
        client.clone(),
        &cfg.primary_url,
        &cfg.referer,
        &cfg.user_agent,
    ));
    let fallbacks: Vec<Box<dyn PriceSource>> = vec![
        Box::new(BinanceClient::new(client.clone(), &cfg.fallback_a_url)),
        Box::new(CoinbaseClient::new(client, &cfg.fallback_b_url)),
    ];
    Ok((primary, fallbacks))
}

/// Send `request` and return the body of a 2xx response
async fn get_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// Numeric JSON value, accepting `"2001.5"` as well as `2001.5`
fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Follow `path` through nested objects and read a positive price
fn json_price(body: &str, path: &[&'static str]) -> Result<f64, FetchError> {
    let root: Value = serde_json::from_str(body).map_err(|e| FetchError::Body(e.to_string()))?;
    let field = path.last().copied().unwrap_or("price");
    let mut node = &root;
    for key in path {
        node = node.get(key).ok_or(FetchError::Field(field))?;
    }
    json_number(node)
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or(FetchError::Field(field))
}
