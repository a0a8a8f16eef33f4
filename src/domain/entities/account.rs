//! Account entity - the unit of trading isolation
//!
//! One account per user portfolio and one per competition participant. The
//! cash balance is mutated only by the trade executor; `version` backs the
//! optimistic write guard in the persistence layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What kind of ownership this account represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Personal,
    Competition,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Personal => "personal",
            AccountKind::Competition => "competition",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "personal" => Ok(AccountKind::Personal),
            "competition" => Ok(AccountKind::Competition),
            other => Err(format!("Unknown account kind: {}", other)),
        }
    }
}

/// Cash plus position ownership unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner_id: String,
    pub kind: AccountKind,
    /// Set for competition-participant accounts, None for personal ones
    pub competition_id: Option<i64>,
    pub cash_balance: Decimal,
    pub starting_balance: Decimal,
    /// Standing persisted when the account's competition is closed
    pub final_rank: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account can cover a debit of `amount`
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.cash_balance >= amount
    }

    /// Total return against the starting balance, given the current total value
    pub fn return_amount(&self, total_value: Decimal) -> Decimal {
        total_value - self.starting_balance
    }

    /// Return percentage against the starting balance; zero when the
    /// starting balance is zero rather than dividing by it
    pub fn return_percent(&self, total_value: Decimal) -> Decimal {
        if self.starting_balance.is_zero() {
            return Decimal::ZERO;
        }
        self.return_amount(total_value) / self.starting_balance * Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_account(cash: Decimal) -> Account {
        Account {
            id: 1,
            owner_id: "user-42".to_string(),
            kind: AccountKind::Personal,
            competition_id: None,
            cash_balance: cash,
            starting_balance: dec!(100000),
            final_rank: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_afford_exact_amount() {
        let account = test_account(dec!(1500.75));
        assert!(account.can_afford(dec!(1500.75)));
        assert!(!account.can_afford(dec!(1500.76)));
    }

    #[test]
    fn test_return_amount_and_percent() {
        let account = test_account(dec!(110000));
        assert_eq!(account.return_amount(dec!(110000)), dec!(10000));
        assert_eq!(account.return_percent(dec!(110000)), dec!(10));
    }

    #[test]
    fn test_return_percent_zero_starting_balance() {
        let mut account = test_account(dec!(0));
        account.starting_balance = Decimal::ZERO;
        assert_eq!(account.return_percent(dec!(500)), Decimal::ZERO);
    }

    #[test]
    fn test_account_kind_round_trip() {
        assert_eq!(
            AccountKind::parse(AccountKind::Personal.as_str()).unwrap(),
            AccountKind::Personal
        );
        assert_eq!(
            AccountKind::parse(AccountKind::Competition.as_str()).unwrap(),
            AccountKind::Competition
        );
        assert!(AccountKind::parse("margin").is_err());
    }
}
