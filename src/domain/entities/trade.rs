//! Trade ledger entry - immutable record of one executed order

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.to_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(format!("Unknown trade side: {}", other)),
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only ledger row. Account and position state are a projection of
/// these records and must stay reconcilable to their sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: i64,
    pub execution_price: Decimal,
    /// price x quantity, before fees
    pub gross_amount: Decimal,
    pub fee_amount: Decimal,
    /// Persisted at sell time from the position's average cost; None on buys
    pub realized_pnl: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_side_round_trip() {
        assert_eq!(TradeSide::parse("buy").unwrap(), TradeSide::Buy);
        assert_eq!(TradeSide::parse("SELL").unwrap(), TradeSide::Sell);
        assert_eq!(TradeSide::Buy.as_str(), "buy");
    }

    #[test]
    fn test_trade_side_unknown() {
        assert!(TradeSide::parse("short").is_err());
    }
}
