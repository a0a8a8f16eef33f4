//! Trade execution errors with stable codes for API clients

use rust_decimal::Decimal;
use thiserror::Error;

use crate::persistence::DatabaseError;

/// Everything that can terminate an order or portfolio query
#[derive(Debug, Error)]
pub enum TradeError {
    /// Rejected before touching the oracle: bad quantity or symbol
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// No live price could be obtained; retryable by the caller, nothing
    /// was mutated
    #[error("No live price for {symbol}: {reason}")]
    OracleUnavailable { symbol: String, reason: String },

    /// Cash balance cannot cover the debit including fees
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Position missing or smaller than the requested sell quantity
    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: i64, held: i64 },

    /// No account for the identity presented; guard-rail, not expected for
    /// an authenticated user
    #[error("Account not found")]
    AccountNotFound,

    /// Caller has no participant account in this competition
    #[error("Not a participant in competition {competition_id}")]
    NotAParticipant { competition_id: i64 },

    /// Competition exists but is not accepting trades
    #[error("Competition {competition_id} is not active (status: {status})")]
    CompetitionNotActive { competition_id: i64, status: String },

    /// Concurrent write contention detected by the version guard; retried
    /// internally before surfacing
    #[error("Concurrent update conflict on account {account_id}")]
    PersistenceConflict { account_id: i64 },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl TradeError {
    /// Stable code clients can branch on
    pub fn code(&self) -> &'static str {
        match self {
            TradeError::InvalidOrder { .. } => "invalid_order",
            TradeError::OracleUnavailable { .. } => "oracle_unavailable",
            TradeError::InsufficientFunds { .. } => "insufficient_funds",
            TradeError::InsufficientShares { .. } => "insufficient_shares",
            TradeError::AccountNotFound => "account_not_found",
            TradeError::NotAParticipant { .. } => "not_a_participant",
            TradeError::CompetitionNotActive { .. } => "competition_not_active",
            TradeError::PersistenceConflict { .. } => "persistence_conflict",
            TradeError::Storage(_) => "storage",
        }
    }

    /// Whether resubmitting the same order later could succeed without any
    /// user correction
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TradeError::OracleUnavailable { .. } | TradeError::PersistenceConflict { .. }
        )
    }
}
