//! Price Oracle Trait
//!
//! Common interface over the live market-data source. The oracle is treated
//! as unreliable and latency-bearing: failures are retryable, non-fatal
//! conditions, and callers must never fabricate a price in their place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::value_objects::symbol::Symbol;

pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The source could not produce a quote (network, rate limit, unknown
    /// symbol). Safe to retry later.
    #[error("quote unavailable: {0}")]
    Unavailable(String),

    /// The quote request did not complete within the configured timeout
    #[error("quote request timed out")]
    Timeout,
}

/// A live market quote
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: Decimal,
    pub previous_close: Decimal,
    pub as_of: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        price: Decimal,
        previous_close: Decimal,
        as_of: DateTime<Utc>,
    ) -> OracleResult<Self> {
        if price <= Decimal::ZERO {
            return Err(OracleError::Unavailable(format!(
                "non-positive price {} in quote",
                price
            )));
        }
        Ok(Quote {
            price,
            previous_close,
            as_of,
        })
    }

    /// Intraday change against the previous close, as a percentage; zero
    /// when there is no previous close to compare against
    pub fn change_percent(&self) -> Decimal {
        if self.previous_close.is_zero() {
            return Decimal::ZERO;
        }
        (self.price - self.previous_close) / self.previous_close * Decimal::from(100)
    }
}

/// Price oracle trait providing a common interface for quote sources
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Name of this quote source, for logging
    fn name(&self) -> &str;

    /// Fetch the current quote for a symbol
    async fn quote(&self, symbol: &Symbol) -> OracleResult<Quote>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_rejects_non_positive_price() {
        assert!(Quote::new(dec!(0), dec!(100), Utc::now()).is_err());
        assert!(Quote::new(dec!(-1), dec!(100), Utc::now()).is_err());
        assert!(Quote::new(dec!(150), dec!(148), Utc::now()).is_ok());
    }

    #[test]
    fn test_change_percent() {
        let quote = Quote::new(dec!(110), dec!(100), Utc::now()).unwrap();
        assert_eq!(quote.change_percent(), dec!(10));
    }

    #[test]
    fn test_change_percent_no_previous_close() {
        let quote = Quote::new(dec!(110), dec!(0), Utc::now()).unwrap();
        assert_eq!(quote.change_percent(), Decimal::ZERO);
    }
}
