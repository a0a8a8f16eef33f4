//! Competition entity - a time-boxed trading contest
//!
//! Lifecycle transitions (upcoming -> active -> completed) are driven by an
//! external scheduler; the executor only ever checks `is_active`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl CompetitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionStatus::Upcoming => "upcoming",
            CompetitionStatus::Active => "active",
            CompetitionStatus::Completed => "completed",
            CompetitionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "upcoming" => Ok(CompetitionStatus::Upcoming),
            "active" => Ok(CompetitionStatus::Active),
            "completed" => Ok(CompetitionStatus::Completed),
            "cancelled" => Ok(CompetitionStatus::Cancelled),
            other => Err(format!("Unknown competition status: {}", other)),
        }
    }
}

impl std::fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub id: i64,
    pub name: String,
    pub starting_balance: Decimal,
    pub status: CompetitionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    pub fn is_active(&self) -> bool {
        self.status == CompetitionStatus::Active
    }

    /// Joining is allowed before and during the contest, not after
    pub fn accepts_participants(&self) -> bool {
        matches!(
            self.status,
            CompetitionStatus::Upcoming | CompetitionStatus::Active
        )
    }
}
