//! Sina finance quote client
//!
//! One request returns three series as JS variable literals:
//!
//! ```text
//! var hq_str_hf_XAU="2001.50,1998.20,...";
//! var hq_str_gds_AUTD="452.10,451.80,...";
//! var hq_str_USDCNY="15:58:31,7.2999,7.3004,7.3012,...";
//! ```
//!
//! Gold series carry the last price at index 0. The USDCNY line has shipped
//! in two layouts over time, see [`RateLayout`].

use async_trait::async_trait;
use reqwest::{
    header::{REFERER, USER_AGENT},
    Client,
};

use super::{get_text, FetchError, PriceSource};
use crate::types::{Quantity, QuoteSource, RawReading};

/// Symbol -> quantity carried by that series
const SERIES: [(&str, Quantity); 3] = [
    ("hf_XAU", Quantity::International),
    ("gds_AUTD", Quantity::Domestic),
    ("USDCNY", Quantity::Rate),
];

/// Layout of the USDCNY field list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLayout {
    /// `name,current,...`
    Legacy,
    /// `HH:MM:SS,open,preclose,current,...`
    Timestamped,
}

impl RateLayout {
    /// Inspect the first field: a clock time means the timestamped layout
    pub fn detect(fields: &[&str]) -> Self {
        match fields.first() {
            Some(first) if first.contains(':') => RateLayout::Timestamped,
            _ => RateLayout::Legacy,
        }
    }

    pub fn rate_index(&self) -> usize {
        match self {
            RateLayout::Legacy => 1,
            RateLayout::Timestamped => 3,
        }
    }

    pub fn rate_field<'a>(&self, fields: &[&'a str]) -> Option<&'a str> {
        fields.get(self.rate_index()).copied()
    }
}

/// Fields between the first and last double quote of a statement
fn quoted_fields(statement: &str) -> Option<Vec<&str>> {
    let start = statement.find('"')?;
    let end = statement.rfind('"')?;
    if end <= start + 1 {
        return None;
    }
    Some(statement[start + 1..end].split(',').collect())
}

fn parse_value(raw: Option<&str>, field: &'static str) -> Result<f64, FetchError> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or(FetchError::Field(field))
}

fn parse_series(quantity: Quantity, statement: &str) -> Result<f64, FetchError> {
    let field = match quantity {
        Quantity::International => "hf_XAU",
        Quantity::Domestic => "gds_AUTD",
        Quantity::Rate => "USDCNY",
    };
    let fields = quoted_fields(statement).ok_or(FetchError::Field(field))?;
    match quantity {
        Quantity::Rate => {
            let layout = RateLayout::detect(&fields);
            parse_value(layout.rate_field(&fields), field)
        }
        _ => parse_value(fields.first().copied(), field),
    }
}

/// Parse a full payload. A bad series only blanks its own field.
pub fn parse_payload(body: &str) -> RawReading {
    let mut reading = RawReading::default();

    for statement in body.split(|c| c == '\n' || c == ';') {
        let Some((symbol, quantity)) = SERIES
            .iter()
            .find(|(symbol, _)| statement.contains(symbol))
        else {
            continue;
        };

        match parse_series(*quantity, statement) {
            Ok(value) => reading.set(*quantity, value),
            Err(e) => {
                tracing::warn!(source = %QuoteSource::Sina, symbol = %symbol, error = %e, "Unusable series");
            }
        }
    }

    reading
}

#[derive(Debug, Clone)]
pub struct SinaClient {
    client: Client,
    url: String,
    referer: String,
    user_agent: String,
}

impl SinaClient {
    pub fn new(client: Client, url: &str, referer: &str, user_agent: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            referer: referer.to_string(),
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for SinaClient {
    fn source(&self) -> QuoteSource {
        QuoteSource::Sina
    }

    async fn fetch(&self) -> Result<RawReading, FetchError> {
        // Requests without a referer are rejected upstream
        let request = self
            .client
            .get(&self.url)
            .header(REFERER, &self.referer)
            .header(USER_AGENT, &self.user_agent);
        let body = get_text(request).await?;

        if !SERIES.iter().any(|(symbol, _)| body.contains(symbol)) {
            return Err(FetchError::Body("no known quote series".to_string()));
        }

        let reading = parse_payload(&body);
        tracing::debug!(
            source = %QuoteSource::Sina,
            international = ?reading.international(),
            domestic = ?reading.domestic(),
            rate = ?reading.rate(),
            "Primary quotes parsed"
        );
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "var hq_str_hf_XAU=\"2001.50,1998.20,2001.40,2001.90,2010.00,1990.10,15:58:30,1999.00,1998.90,0,0,0,2023-10-24,伦敦金\";\n\
var hq_str_gds_AUTD=\"452.10,0,452.00,452.30,455.00,450.00,15:29:59,451.50,451.00,1234\";\n\
var hq_str_USDCNY=\"15:58:31,7.2999,7.3004,7.3012,7.3050,7.2980,7.3010,7.3012,7.3014,美元人民币\";\n";

    #[test]
    fn test_parse_full_payload() {
        let reading = parse_payload(PAYLOAD);
        assert_eq!(reading.international(), Some(2001.50));
        assert_eq!(reading.domestic(), Some(452.10));
        assert_eq!(reading.rate(), Some(7.3012));
    }

    #[test]
    fn test_rate_layout_detection() {
        let legacy = vec!["美元人民币", "7.2465", "7.2400"];
        let stamped = vec!["15:58:31", "7.2999", "7.3004", "7.3012"];

        assert_eq!(RateLayout::detect(&legacy), RateLayout::Legacy);
        assert_eq!(RateLayout::detect(&stamped), RateLayout::Timestamped);
        assert_eq!(RateLayout::Legacy.rate_field(&legacy), Some("7.2465"));
        assert_eq!(RateLayout::Timestamped.rate_field(&stamped), Some("7.3012"));
        assert_eq!(RateLayout::Timestamped.rate_field(&["09:00:00", "7.1"]), None);
    }

    #[test]
    fn test_legacy_rate_line() {
        let reading = parse_payload("var hq_str_USDCNY=\"美元人民币,7.2465,7.2400\";");
        assert_eq!(reading.rate(), Some(7.2465));
    }

    #[test]
    fn test_bad_field_only_blanks_itself() {
        let body = "var hq_str_hf_XAU=\"abc,1998.20\";\n\
var hq_str_gds_AUTD=\"452.10,0\";\n\
var hq_str_USDCNY=\"\";\n";
        let reading = parse_payload(body);
        assert_eq!(reading.international(), None);
        assert_eq!(reading.domestic(), Some(452.10));
        assert_eq!(reading.rate(), None);
    }

    #[test]
    fn test_zero_price_is_absent() {
        let reading = parse_payload("var hq_str_gds_AUTD=\"0.00,0\";");
        assert_eq!(reading.domestic(), None);
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        assert!(parse_payload("var hq_str_sh600000=\"浦发银行,7.50\";\n\n").is_empty());
    }
}
