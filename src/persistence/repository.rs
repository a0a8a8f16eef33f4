//! Database Repository
//!
//! Data access layer for accounts, positions, trades, and competitions.
//! Pool-level repositories serve reads and standalone writes; the `tx`
//! module exposes the transaction-scoped operations the trade executor
//! composes into one atomic commit.

use super::models::*;
use super::{DatabaseError, DbPool};
use crate::domain::entities::account::Account;
use crate::domain::entities::competition::{Competition, CompetitionStatus};
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::TradeRecord;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// Account repository
pub struct AccountRepository {
    pool: DbPool,
}

impl AccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new account funded at its starting balance
    pub async fn create(&self, account: CreateAccount) -> Result<Account, DatabaseError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                owner_id, kind, competition_id, cash_balance, starting_balance,
                version, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?4, 1, ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(&account.owner_id)
        .bind(account.kind.as_str())
        .bind(account.competition_id)
        .bind(account.starting_balance.to_string())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create account: {}", e);
            DatabaseError::QueryError(format!("Failed to create account: {}", e))
        })?;

        debug!("Created account {} for {}", row.id, row.owner_id);
        Account::try_from(row)
    }

    /// Get account by ID
    pub async fn get(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get account {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to get account: {}", e))
            })?;

        row.map(Account::try_from).transpose()
    }

    /// Get a user's personal trading account
    pub async fn get_personal(&self, owner_id: &str) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE owner_id = ?1 AND competition_id IS NULL",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get personal account for {}: {}", owner_id, e);
            DatabaseError::QueryError(format!("Failed to get personal account: {}", e))
        })?;

        row.map(Account::try_from).transpose()
    }

    /// Get a user's participant account in a competition
    pub async fn get_for_competition(
        &self,
        owner_id: &str,
        competition_id: i64,
    ) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE owner_id = ?1 AND competition_id = ?2",
        )
        .bind(owner_id)
        .bind(competition_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to get competition account for {} in {}: {}",
                owner_id, competition_id, e
            );
            DatabaseError::QueryError(format!("Failed to get competition account: {}", e))
        })?;

        row.map(Account::try_from).transpose()
    }

    /// All participant accounts of a competition, in join order
    pub async fn list_by_competition(
        &self,
        competition_id: i64,
    ) -> Result<Vec<Account>, DatabaseError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE competition_id = ?1 ORDER BY id ASC",
        )
        .bind(competition_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to list accounts for competition {}: {}",
                competition_id, e
            );
            DatabaseError::QueryError(format!("Failed to list competition accounts: {}", e))
        })?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Restore the account to its starting balance and wipe its positions
    /// and ledger, atomically
    pub async fn reset(&self, account_id: i64) -> Result<Account, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        sqlx::query("DELETE FROM positions WHERE account_id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("Failed to clear positions: {}", e)))?;

        sqlx::query("DELETE FROM trades WHERE account_id = ?1")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("Failed to clear trades: {}", e)))?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET cash_balance = starting_balance, version = version + 1, updated_at = ?1
            WHERE id = ?2
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to reset account: {}", e)))?
        .ok_or_else(|| DatabaseError::QueryError(format!("Account not found: {}", account_id)))?;

        tx.commit().await?;

        debug!("Reset account {}", account_id);
        Account::try_from(row)
    }

    /// Persist a participant's final standing at competition close
    pub async fn set_final_rank(&self, account_id: i64, rank: i64) -> Result<(), DatabaseError> {
        let rows_affected =
            sqlx::query("UPDATE accounts SET final_rank = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(rank)
                .bind(Utc::now())
                .bind(account_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to set final rank for account {}: {}", account_id, e);
                    DatabaseError::QueryError(format!("Failed to set final rank: {}", e))
                })?
                .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Account not found: {}",
                account_id
            )));
        }
        Ok(())
    }
}

/// Position repository
pub struct PositionRepository {
    pool: DbPool,
}

impl PositionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All open positions of an account
    pub async fn list_for_account(&self, account_id: i64) -> Result<Vec<Position>, DatabaseError> {
        let rows = sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE account_id = ?1 ORDER BY symbol ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list positions for account {}: {}", account_id, e);
            DatabaseError::QueryError(format!("Failed to list positions: {}", e))
        })?;

        rows.into_iter().map(Position::try_from).collect()
    }

    /// Get one position by symbol
    pub async fn get(
        &self,
        account_id: i64,
        symbol: &str,
    ) -> Result<Option<Position>, DatabaseError> {
        let row = sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE account_id = ?1 AND symbol = ?2",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to get position {} for account {}: {}",
                symbol, account_id, e
            );
            DatabaseError::QueryError(format!("Failed to get position: {}", e))
        })?;

        row.map(Position::try_from).transpose()
    }

    /// Distinct symbols held across all accounts, for background revaluation
    pub async fn distinct_symbols(&self) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT symbol FROM positions ORDER BY symbol ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to list distinct symbols: {}", e);
                    DatabaseError::QueryError(format!("Failed to list symbols: {}", e))
                })?;

        Ok(rows.into_iter().map(|(symbol,)| symbol).collect())
    }
}

/// Trade repository
pub struct TradeRepository {
    pool: DbPool,
}

impl TradeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Full ledger of an account, oldest first (metrics walk it in order)
    pub async fn list_for_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<TradeRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE account_id = ?1 ORDER BY created_at ASC, id ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list trades for account {}: {}", account_id, e);
            DatabaseError::QueryError(format!("Failed to list trades: {}", e))
        })?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }

    /// Most recent trades of an account
    pub async fn list_recent(
        &self,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<TradeRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE account_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to list recent trades for account {}: {}",
                account_id, e
            );
            DatabaseError::QueryError(format!("Failed to list recent trades: {}", e))
        })?;

        rows.into_iter().map(TradeRecord::try_from).collect()
    }
}

/// Competition repository
pub struct CompetitionRepository {
    pool: DbPool,
}

impl CompetitionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new competition
    pub async fn create(
        &self,
        competition: CreateCompetition,
    ) -> Result<Competition, DatabaseError> {
        let row = sqlx::query_as::<_, CompetitionRow>(
            r#"
            INSERT INTO competitions (name, starting_balance, status, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(&competition.name)
        .bind(competition.starting_balance.to_string())
        .bind(competition.status.as_str())
        .bind(competition.start_date)
        .bind(competition.end_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create competition: {}", e);
            DatabaseError::QueryError(format!("Failed to create competition: {}", e))
        })?;

        debug!("Created competition {} ({})", row.id, row.name);
        Competition::try_from(row)
    }

    /// Get competition by ID
    pub async fn get(&self, id: i64) -> Result<Option<Competition>, DatabaseError> {
        let row = sqlx::query_as::<_, CompetitionRow>("SELECT * FROM competitions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get competition {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to get competition: {}", e))
            })?;

        row.map(Competition::try_from).transpose()
    }

    /// Move a competition through its lifecycle
    pub async fn set_status(
        &self,
        id: i64,
        status: CompetitionStatus,
    ) -> Result<(), DatabaseError> {
        let rows_affected = sqlx::query("UPDATE competitions SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update competition {} status: {}", id, e);
                DatabaseError::QueryError(format!("Failed to update competition status: {}", e))
            })?
            .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Competition not found: {}",
                id
            )));
        }

        debug!("Competition {} -> {}", id, status);
        Ok(())
    }

    /// Competitions in a given lifecycle state
    pub async fn list_by_status(
        &self,
        status: CompetitionStatus,
    ) -> Result<Vec<Competition>, DatabaseError> {
        let rows = sqlx::query_as::<_, CompetitionRow>(
            "SELECT * FROM competitions WHERE status = ?1 ORDER BY start_date ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list competitions by status: {}", e);
            DatabaseError::QueryError(format!("Failed to list competitions: {}", e))
        })?;

        rows.into_iter().map(Competition::try_from).collect()
    }
}

/// Transaction-scoped operations composed by the trade executor into one
/// atomic commit: cash mutation, position upsert, and ledger append either
/// all land or none do.
pub mod tx {
    use super::*;
    use sqlx::{Sqlite, Transaction};

    /// Read an account inside the transaction
    pub async fn get_account(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
    ) -> Result<Option<Account>, DatabaseError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?1")
            .bind(account_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("Failed to get account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    /// Read a position inside the transaction
    pub async fn get_position(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
        symbol: &str,
    ) -> Result<Option<Position>, DatabaseError> {
        let row = sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE account_id = ?1 AND symbol = ?2",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to get position: {}", e)))?;

        row.map(Position::try_from).transpose()
    }

    /// Write the new cash balance guarded by the version read earlier.
    /// Returns false when another writer got there first; the caller rolls
    /// back and retries.
    pub async fn update_cash_guarded(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
        new_balance: rust_decimal::Decimal,
        expected_version: i64,
    ) -> Result<bool, DatabaseError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET cash_balance = ?1, version = version + 1, updated_at = ?2
            WHERE id = ?3 AND version = ?4
            "#,
        )
        .bind(new_balance.to_string())
        .bind(Utc::now())
        .bind(account_id)
        .bind(expected_version)
        .execute(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to update balance: {}", e)))?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    /// Insert or replace the position at the new quantity and average cost
    pub async fn upsert_position(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
        symbol: &str,
        quantity: i64,
        average_cost: rust_decimal::Decimal,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO positions (account_id, symbol, quantity, average_cost, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(account_id, symbol)
            DO UPDATE SET quantity = ?3, average_cost = ?4, updated_at = ?5
            "#,
        )
        .bind(account_id)
        .bind(symbol)
        .bind(quantity)
        .bind(average_cost.to_string())
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to upsert position: {}", e)))?;

        Ok(())
    }

    /// Remove a position once its quantity reaches zero
    pub async fn delete_position(
        tx: &mut Transaction<'_, Sqlite>,
        account_id: i64,
        symbol: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM positions WHERE account_id = ?1 AND symbol = ?2")
            .bind(account_id)
            .bind(symbol)
            .execute(&mut **tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("Failed to delete position: {}", e)))?;

        Ok(())
    }

    /// Append the ledger row for an executed order
    pub async fn insert_trade(
        tx: &mut Transaction<'_, Sqlite>,
        trade: &CreateTrade,
        executed_at: DateTime<Utc>,
    ) -> Result<TradeRecord, DatabaseError> {
        let row = sqlx::query_as::<_, TradeRow>(
            r#"
            INSERT INTO trades (
                account_id, symbol, side, quantity, execution_price,
                gross_amount, fee_amount, realized_pnl, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *
            "#,
        )
        .bind(trade.account_id)
        .bind(&trade.symbol)
        .bind(trade.side.as_str())
        .bind(trade.quantity)
        .bind(trade.execution_price.to_string())
        .bind(trade.gross_amount.to_string())
        .bind(trade.fee_amount.to_string())
        .bind(trade.realized_pnl.map(|p| p.to_string()))
        .bind(executed_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to insert trade: {}", e)))?;

        TradeRecord::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::account::AccountKind;
    use crate::domain::entities::trade::TradeSide;
    use crate::persistence::init_database;
    use rust_decimal_macros::dec;

    async fn seed_account(pool: &DbPool) -> Account {
        AccountRepository::new(pool.clone())
            .create(CreateAccount {
                owner_id: "user-1".to_string(),
                kind: AccountKind::Personal,
                competition_id: None,
                starting_balance: dec!(100000),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_account_create_and_get() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = AccountRepository::new(pool.clone());

        let created = seed_account(&pool).await;
        assert_eq!(created.cash_balance, dec!(100000));
        assert_eq!(created.starting_balance, dec!(100000));
        assert_eq!(created.version, 1);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.owner_id, "user-1");

        let by_owner = repo.get_personal("user-1").await.unwrap().unwrap();
        assert_eq!(by_owner.id, created.id);
        assert!(repo.get_personal("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_version_guard_blocks_stale_writer() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let account = seed_account(&pool).await;

        let mut tx1 = pool.begin().await.unwrap();
        let updated = tx::update_cash_guarded(&mut tx1, account.id, dec!(99000), account.version)
            .await
            .unwrap();
        assert!(updated);
        tx1.commit().await.unwrap();

        // Second writer still holds the old version
        let mut tx2 = pool.begin().await.unwrap();
        let updated = tx::update_cash_guarded(&mut tx2, account.id, dec!(98000), account.version)
            .await
            .unwrap();
        assert!(!updated);
        tx2.rollback().await.unwrap();

        let current = AccountRepository::new(pool)
            .get(account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.cash_balance, dec!(99000));
        assert_eq!(current.version, account.version + 1);
    }

    #[tokio::test]
    async fn test_position_upsert_and_delete() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let account = seed_account(&pool).await;

        let mut tx1 = pool.begin().await.unwrap();
        tx::upsert_position(&mut tx1, account.id, "AAPL", 10, dec!(150))
            .await
            .unwrap();
        tx1.commit().await.unwrap();

        let mut tx2 = pool.begin().await.unwrap();
        tx::upsert_position(&mut tx2, account.id, "AAPL", 20, dec!(175))
            .await
            .unwrap();
        tx2.commit().await.unwrap();

        let repo = PositionRepository::new(pool.clone());
        let positions = repo.list_for_account(account.id).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity, 20);
        assert_eq!(positions[0].average_cost, dec!(175));

        let mut tx3 = pool.begin().await.unwrap();
        tx::delete_position(&mut tx3, account.id, "AAPL").await.unwrap();
        tx3.commit().await.unwrap();
        assert!(repo.get(account.id, "AAPL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trade_ledger_round_trip() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let account = seed_account(&pool).await;

        let mut tx1 = pool.begin().await.unwrap();
        let trade = tx::insert_trade(
            &mut tx1,
            &CreateTrade {
                account_id: account.id,
                symbol: "AAPL".to_string(),
                side: TradeSide::Sell,
                quantity: 10,
                execution_price: dec!(160.00),
                gross_amount: dec!(1600.00),
                fee_amount: dec!(0.80),
                realized_pnl: Some(dec!(99.20)),
            },
            Utc::now(),
        )
        .await
        .unwrap();
        tx1.commit().await.unwrap();

        assert_eq!(trade.realized_pnl, Some(dec!(99.20)));

        let trades = TradeRepository::new(pool)
            .list_for_account(account.id)
            .await
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].execution_price, dec!(160.00));
        assert_eq!(trades[0].side, TradeSide::Sell);
    }

    #[tokio::test]
    async fn test_account_reset_clears_state() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let account = seed_account(&pool).await;

        let mut tx1 = pool.begin().await.unwrap();
        tx::update_cash_guarded(&mut tx1, account.id, dec!(50000), account.version)
            .await
            .unwrap();
        tx::upsert_position(&mut tx1, account.id, "AAPL", 10, dec!(150))
            .await
            .unwrap();
        tx::insert_trade(
            &mut tx1,
            &CreateTrade {
                account_id: account.id,
                symbol: "AAPL".to_string(),
                side: TradeSide::Buy,
                quantity: 10,
                execution_price: dec!(150.00),
                gross_amount: dec!(1500.00),
                fee_amount: dec!(0.75),
                realized_pnl: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
        tx1.commit().await.unwrap();

        let repo = AccountRepository::new(pool.clone());
        let reset = repo.reset(account.id).await.unwrap();
        assert_eq!(reset.cash_balance, dec!(100000));

        let positions = PositionRepository::new(pool.clone())
            .list_for_account(account.id)
            .await
            .unwrap();
        assert!(positions.is_empty());
        let trades = TradeRepository::new(pool)
            .list_for_account(account.id)
            .await
            .unwrap();
        assert!(trades.is_empty());
    }

    #[tokio::test]
    async fn test_competition_lifecycle() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let repo = CompetitionRepository::new(pool.clone());

        let competition = repo
            .create(CreateCompetition {
                name: "Q3 Challenge".to_string(),
                starting_balance: dec!(10000),
                status: CompetitionStatus::Upcoming,
                start_date: Utc::now(),
                end_date: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(competition.status, CompetitionStatus::Upcoming);

        repo.set_status(competition.id, CompetitionStatus::Active)
            .await
            .unwrap();
        let active = repo.get(competition.id).await.unwrap().unwrap();
        assert!(active.is_active());

        let listed = repo.list_by_status(CompetitionStatus::Active).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_competition_entry_rejected() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let competitions = CompetitionRepository::new(pool.clone());
        let accounts = AccountRepository::new(pool);

        let competition = competitions
            .create(CreateCompetition {
                name: "Q3 Challenge".to_string(),
                starting_balance: dec!(10000),
                status: CompetitionStatus::Active,
                start_date: Utc::now(),
                end_date: Utc::now(),
            })
            .await
            .unwrap();

        let entry = CreateAccount {
            owner_id: "user-1".to_string(),
            kind: AccountKind::Competition,
            competition_id: Some(competition.id),
            starting_balance: dec!(10000),
        };
        accounts.create(entry.clone()).await.unwrap();
        assert!(accounts.create(entry).await.is_err());
    }
}
