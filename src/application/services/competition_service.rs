//! Competition Service
//!
//! Trading contests with isolated participant accounts. Joining mints a
//! fresh account funded at the competition's starting balance; orders only
//! flow while the competition is active; closing freezes it and persists
//! the final standings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::entities::account::{Account, AccountKind};
use crate::domain::entities::competition::{Competition, CompetitionStatus};
use crate::domain::entities::trade::TradeSide;
use crate::domain::errors::TradeError;
use crate::domain::repositories::price_oracle::PriceOracle;
use crate::domain::services::trade_executor::{ExecutionReceipt, OrderRequest, TradeExecutor};
use crate::domain::services::valuation::ValuationEngine;
use crate::persistence::models::{CreateAccount, CreateCompetition};
use crate::persistence::repository::{
    AccountRepository, CompetitionRepository, PositionRepository,
};
use crate::persistence::DbPool;

use super::portfolio_service::collect_quotes;

/// One row of a competition leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub owner_id: String,
    pub account_id: i64,
    pub cash_balance: Decimal,
    pub total_value: Decimal,
    pub return_percent: Decimal,
}

pub struct CompetitionService {
    pool: DbPool,
    executor: Arc<TradeExecutor>,
    oracle: Arc<dyn PriceOracle>,
    default_starting_balance: Decimal,
    rank_by_total_value: bool,
}

impl CompetitionService {
    pub fn new(
        pool: DbPool,
        executor: Arc<TradeExecutor>,
        oracle: Arc<dyn PriceOracle>,
        default_starting_balance: Decimal,
        rank_by_total_value: bool,
    ) -> Self {
        CompetitionService {
            pool,
            executor,
            oracle,
            default_starting_balance,
            rank_by_total_value,
        }
    }

    /// Create a competition. It opens immediately when its start date has
    /// already passed, otherwise it waits as upcoming.
    pub async fn create(
        &self,
        name: &str,
        starting_balance: Option<Decimal>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Competition, TradeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TradeError::InvalidOrder {
                reason: "competition name must not be empty".to_string(),
            });
        }
        if end_date <= start_date {
            return Err(TradeError::InvalidOrder {
                reason: "competition end date must be after its start date".to_string(),
            });
        }
        let starting_balance = starting_balance.unwrap_or(self.default_starting_balance);
        if starting_balance <= Decimal::ZERO {
            return Err(TradeError::InvalidOrder {
                reason: "competition starting balance must be positive".to_string(),
            });
        }

        let status = if start_date <= Utc::now() {
            CompetitionStatus::Active
        } else {
            CompetitionStatus::Upcoming
        };

        let competition = CompetitionRepository::new(self.pool.clone())
            .create(CreateCompetition {
                name: name.to_string(),
                starting_balance,
                status,
                start_date,
                end_date,
            })
            .await?;
        info!(
            "Created competition {} ({}) starting at {}",
            competition.id, competition.name, competition.starting_balance
        );
        Ok(competition)
    }

    pub async fn get(&self, competition_id: i64) -> Result<Option<Competition>, TradeError> {
        Ok(CompetitionRepository::new(self.pool.clone())
            .get(competition_id)
            .await?)
    }

    /// Join a competition, minting the participant's isolated account
    pub async fn join(&self, owner_id: &str, competition_id: i64) -> Result<Account, TradeError> {
        let competition = self
            .get(competition_id)
            .await?
            .ok_or_else(|| TradeError::InvalidOrder {
                reason: format!("competition {} does not exist", competition_id),
            })?;
        if !competition.accepts_participants() {
            return Err(TradeError::CompetitionNotActive {
                competition_id,
                status: competition.status.to_string(),
            });
        }

        let accounts = AccountRepository::new(self.pool.clone());
        if accounts
            .get_for_competition(owner_id, competition_id)
            .await?
            .is_some()
        {
            return Err(TradeError::InvalidOrder {
                reason: format!("already joined competition {}", competition_id),
            });
        }

        let account = accounts
            .create(CreateAccount {
                owner_id: owner_id.to_string(),
                kind: AccountKind::Competition,
                competition_id: Some(competition_id),
                starting_balance: competition.starting_balance,
            })
            .await?;
        info!(
            "{} joined competition {} with account {}",
            owner_id, competition_id, account.id
        );
        Ok(account)
    }

    /// Execute an order against the caller's participant account
    pub async fn execute(
        &self,
        owner_id: &str,
        competition_id: i64,
        symbol: &str,
        side: TradeSide,
        quantity: i64,
    ) -> Result<ExecutionReceipt, TradeError> {
        let competition = self
            .get(competition_id)
            .await?
            .ok_or(TradeError::NotAParticipant { competition_id })?;
        if !competition.is_active() {
            return Err(TradeError::CompetitionNotActive {
                competition_id,
                status: competition.status.to_string(),
            });
        }

        let account = AccountRepository::new(self.pool.clone())
            .get_for_competition(owner_id, competition_id)
            .await?
            .ok_or(TradeError::NotAParticipant { competition_id })?;

        self.executor
            .execute(OrderRequest {
                account_id: account.id,
                symbol: symbol.to_string(),
                side,
                quantity,
            })
            .await
    }

    /// Current standings. Participants are ranked by total portfolio value
    /// (or by cash when configured so), descending; ties keep join order.
    pub async fn leaderboard(
        &self,
        competition_id: i64,
    ) -> Result<Vec<LeaderboardEntry>, TradeError> {
        if self.get(competition_id).await?.is_none() {
            return Err(TradeError::InvalidOrder {
                reason: format!("competition {} does not exist", competition_id),
            });
        }

        let accounts = AccountRepository::new(self.pool.clone())
            .list_by_competition(competition_id)
            .await?;
        let positions_repo = PositionRepository::new(self.pool.clone());

        let mut entries = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let total_value = if self.rank_by_total_value {
                let positions = positions_repo.list_for_account(account.id).await?;
                let quotes = collect_quotes(&self.oracle, &positions).await;
                ValuationEngine::value_portfolio(account, &positions, &quotes).total_value
            } else {
                account.cash_balance
            };
            entries.push(LeaderboardEntry {
                rank: 0,
                owner_id: account.owner_id.clone(),
                account_id: account.id,
                cash_balance: account.cash_balance,
                total_value,
                return_percent: account.return_percent(total_value),
            });
        }

        // Stable sort: equal values keep account-id (join) order
        entries.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = index as i64 + 1;
        }
        Ok(entries)
    }

    /// Close a competition: freeze trading, compute the final standings,
    /// and persist each participant's rank
    pub async fn close(&self, competition_id: i64) -> Result<Vec<LeaderboardEntry>, TradeError> {
        let competition = self
            .get(competition_id)
            .await?
            .ok_or_else(|| TradeError::InvalidOrder {
                reason: format!("competition {} does not exist", competition_id),
            })?;
        // Only a running contest can be closed; completed and cancelled are
        // terminal, and an upcoming one has no standings to freeze
        if !competition.is_active() {
            return Err(TradeError::CompetitionNotActive {
                competition_id,
                status: competition.status.to_string(),
            });
        }

        let standings = self.leaderboard(competition_id).await?;

        let repo = CompetitionRepository::new(self.pool.clone());
        repo.set_status(competition_id, CompetitionStatus::Completed)
            .await?;

        let accounts = AccountRepository::new(self.pool.clone());
        for entry in &standings {
            accounts.set_final_rank(entry.account_id, entry.rank).await?;
        }

        info!(
            "Closed competition {} with {} participants",
            competition_id,
            standings.len()
        );
        Ok(standings)
    }

    /// Drive competition lifecycles against the clock: open upcoming
    /// contests whose start date has passed and close active ones past
    /// their end date. Called periodically by the background sweep.
    pub async fn advance_schedules(&self, now: DateTime<Utc>) -> Result<(), TradeError> {
        let repo = CompetitionRepository::new(self.pool.clone());

        for competition in repo.list_by_status(CompetitionStatus::Upcoming).await? {
            if competition.start_date <= now {
                repo.set_status(competition.id, CompetitionStatus::Active)
                    .await?;
                info!(
                    "Competition {} ({}) is now active",
                    competition.id, competition.name
                );
            }
        }

        for competition in repo.list_by_status(CompetitionStatus::Active).await? {
            if competition.end_date <= now {
                self.close(competition.id).await?;
            }
        }

        Ok(())
    }
}
