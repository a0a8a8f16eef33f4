//! Database Models
//!
//! Row structs as SQLite hands them back, plus conversions into domain
//! types. Money columns are TEXT; decoding them to `Decimal` is the one
//! place a stored value can fail, surfaced as `DecodeError` rather than a
//! silent zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;

use super::DatabaseError;
use crate::domain::entities::account::{Account, AccountKind};
use crate::domain::entities::competition::{Competition, CompetitionStatus};
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::{TradeRecord, TradeSide};

pub(crate) fn parse_money(column: &str, raw: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(raw)
        .map_err(|e| DatabaseError::DecodeError(format!("bad decimal in {}: {}", column, e)))
}

/// Account row in database
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub owner_id: String,
    pub kind: String,
    pub competition_id: Option<i64>,
    pub cash_balance: String,
    pub starting_balance: String,
    pub final_rank: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            owner_id: row.owner_id,
            kind: AccountKind::parse(&row.kind).map_err(DatabaseError::DecodeError)?,
            competition_id: row.competition_id,
            cash_balance: parse_money("accounts.cash_balance", &row.cash_balance)?,
            starting_balance: parse_money("accounts.starting_balance", &row.starting_balance)?,
            final_rank: row.final_rank,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Position row in database
#[derive(Debug, Clone, FromRow)]
pub struct PositionRow {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub quantity: i64,
    pub average_cost: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PositionRow> for Position {
    type Error = DatabaseError;

    fn try_from(row: PositionRow) -> Result<Self, Self::Error> {
        Ok(Position {
            id: row.id,
            account_id: row.account_id,
            symbol: row.symbol,
            quantity: row.quantity,
            average_cost: parse_money("positions.average_cost", &row.average_cost)?,
            updated_at: row.updated_at,
        })
    }
}

/// Trade row in database
#[derive(Debug, Clone, FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub side: String,
    pub quantity: i64,
    pub execution_price: String,
    pub gross_amount: String,
    pub fee_amount: String,
    pub realized_pnl: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TradeRow> for TradeRecord {
    type Error = DatabaseError;

    fn try_from(row: TradeRow) -> Result<Self, Self::Error> {
        let realized_pnl = row
            .realized_pnl
            .as_deref()
            .map(|raw| parse_money("trades.realized_pnl", raw))
            .transpose()?;
        Ok(TradeRecord {
            id: row.id,
            account_id: row.account_id,
            symbol: row.symbol,
            side: TradeSide::parse(&row.side).map_err(DatabaseError::DecodeError)?,
            quantity: row.quantity,
            execution_price: parse_money("trades.execution_price", &row.execution_price)?,
            gross_amount: parse_money("trades.gross_amount", &row.gross_amount)?,
            fee_amount: parse_money("trades.fee_amount", &row.fee_amount)?,
            realized_pnl,
            created_at: row.created_at,
        })
    }
}

/// Competition row in database
#[derive(Debug, Clone, FromRow)]
pub struct CompetitionRow {
    pub id: i64,
    pub name: String,
    pub starting_balance: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CompetitionRow> for Competition {
    type Error = DatabaseError;

    fn try_from(row: CompetitionRow) -> Result<Self, Self::Error> {
        Ok(Competition {
            id: row.id,
            name: row.name,
            starting_balance: parse_money("competitions.starting_balance", &row.starting_balance)?,
            status: CompetitionStatus::parse(&row.status).map_err(DatabaseError::DecodeError)?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }
}

/// Create account input
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub owner_id: String,
    pub kind: AccountKind,
    pub competition_id: Option<i64>,
    pub starting_balance: Decimal,
}

/// Create competition input
#[derive(Debug, Clone)]
pub struct CreateCompetition {
    pub name: String,
    pub starting_balance: Decimal,
    pub status: CompetitionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Create trade ledger entry input
#[derive(Debug, Clone)]
pub struct CreateTrade {
    pub account_id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: i64,
    pub execution_price: Decimal,
    pub gross_amount: Decimal,
    pub fee_amount: Decimal,
    pub realized_pnl: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_money_round_trip() {
        let value = dec!(98499.25);
        assert_eq!(parse_money("t", &value.to_string()).unwrap(), value);
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(parse_money("accounts.cash_balance", "not-a-number").is_err());
    }

    #[test]
    fn test_account_row_conversion() {
        let row = AccountRow {
            id: 1,
            owner_id: "user-1".to_string(),
            kind: "personal".to_string(),
            competition_id: None,
            cash_balance: "98499.25".to_string(),
            starting_balance: "100000".to_string(),
            final_rank: None,
            version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let account = Account::try_from(row).unwrap();
        assert_eq!(account.kind, AccountKind::Personal);
        assert_eq!(account.cash_balance, dec!(98499.25));
    }

    #[test]
    fn test_trade_row_without_realized_pnl() {
        let row = TradeRow {
            id: 1,
            account_id: 1,
            symbol: "AAPL".to_string(),
            side: "buy".to_string(),
            quantity: 10,
            execution_price: "150.00".to_string(),
            gross_amount: "1500.00".to_string(),
            fee_amount: "0.75".to_string(),
            realized_pnl: None,
            created_at: Utc::now(),
        };
        let trade = TradeRecord::try_from(row).unwrap();
        assert_eq!(trade.side, TradeSide::Buy);
        assert!(trade.realized_pnl.is_none());
    }
}
