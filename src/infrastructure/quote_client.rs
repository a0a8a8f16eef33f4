//! HTTP Quote Client
//!
//! Fetches live quotes from an Alpha-Vantage-compatible GLOBAL_QUOTE
//! endpoint. Every failure mode (network, rate limiting, unknown symbol,
//! malformed payload) collapses to `OracleError::Unavailable` so callers
//! see one retryable condition.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::repositories::price_oracle::{OracleError, OracleResult, PriceOracle, Quote};
use crate::domain::value_objects::symbol::Symbol;

pub struct HttpQuoteClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpQuoteClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        HttpQuoteClient {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl PriceOracle for HttpQuoteClient {
    fn name(&self) -> &str {
        "alphavantage"
    }

    async fn quote(&self, symbol: &Symbol) -> OracleResult<Quote> {
        let url = format!(
            "{}/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url,
            symbol.as_str(),
            self.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Quote request for {} failed: {}", symbol, e);
            OracleError::Unavailable(format!("request failed: {}", e))
        })?;

        if !response.status().is_success() {
            warn!(
                "Quote endpoint returned {} for {}",
                response.status(),
                symbol
            );
            return Err(OracleError::Unavailable(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Unavailable(format!("malformed response body: {}", e)))?;

        let quote = parse_global_quote(&body)?;
        debug!("Quote for {}: {}", symbol, quote.price);
        Ok(quote)
    }
}

/// Extract a quote from a GLOBAL_QUOTE payload. Rate-limited responses come
/// back 200 with a "Note" body and no quote object, so absence of fields is
/// treated the same as transport failure.
pub fn parse_global_quote(body: &Value) -> OracleResult<Quote> {
    let global = body
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|fields| !fields.is_empty())
        .ok_or_else(|| OracleError::Unavailable("no quote in response".to_string()))?;

    let price = parse_field(global.get("05. price"), "price")?;
    let previous_close =
        parse_field(global.get("08. previous close"), "previous close").unwrap_or(Decimal::ZERO);

    Quote::new(price, previous_close, Utc::now())
}

fn parse_field(value: Option<&Value>, field: &str) -> OracleResult<Decimal> {
    let raw = value
        .and_then(Value::as_str)
        .ok_or_else(|| OracleError::Unavailable(format!("missing {} field", field)))?;
    Decimal::from_str(raw)
        .map_err(|e| OracleError::Unavailable(format!("bad {} field: {}", field, e)))
}
