//! Portfolio Service
//!
//! User-facing operations on personal trading accounts: order execution,
//! valuation, performance metrics, trade history, and reset. The personal
//! account is created lazily on first touch, funded at the configured
//! starting balance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::entities::account::{Account, AccountKind};
use crate::domain::entities::position::Position;
use crate::domain::entities::trade::{TradeRecord, TradeSide};
use crate::domain::errors::TradeError;
use crate::domain::repositories::price_oracle::{PriceOracle, Quote};
use crate::domain::services::performance::{
    portfolio_history, PerformanceCalculator, PerformanceMetrics, PortfolioHistory,
};
use crate::domain::services::trade_executor::{ExecutionReceipt, OrderRequest, TradeExecutor};
use crate::domain::services::valuation::{PortfolioValuation, ValuationEngine};
use crate::domain::value_objects::symbol::Symbol;
use crate::persistence::models::CreateAccount;
use crate::persistence::repository::{AccountRepository, PositionRepository, TradeRepository};
use crate::persistence::DbPool;

/// Fetch quotes for the positions' symbols, skipping the ones the oracle
/// cannot price right now. Valuation surfaces the gaps as `missing_quotes`.
pub(crate) async fn collect_quotes(
    oracle: &Arc<dyn PriceOracle>,
    positions: &[Position],
) -> HashMap<String, Quote> {
    let mut quotes = HashMap::new();
    for position in positions {
        let symbol = match Symbol::parse(&position.symbol) {
            Ok(symbol) => symbol,
            Err(reason) => {
                warn!("Stored symbol {} failed to parse: {}", position.symbol, reason);
                continue;
            }
        };
        match oracle.quote(&symbol).await {
            Ok(quote) => {
                quotes.insert(position.symbol.clone(), quote);
            }
            Err(e) => {
                warn!("No quote for held symbol {}: {}", position.symbol, e);
            }
        }
    }
    quotes
}

pub struct PortfolioService {
    pool: DbPool,
    executor: Arc<TradeExecutor>,
    oracle: Arc<dyn PriceOracle>,
    performance: PerformanceCalculator,
    starting_balance: Decimal,
}

impl PortfolioService {
    pub fn new(
        pool: DbPool,
        executor: Arc<TradeExecutor>,
        oracle: Arc<dyn PriceOracle>,
        starting_balance: Decimal,
    ) -> Self {
        PortfolioService {
            pool,
            executor,
            oracle,
            performance: PerformanceCalculator::default(),
            starting_balance,
        }
    }

    /// Get the user's personal account, creating it on first touch
    pub async fn ensure_account(&self, owner_id: &str) -> Result<Account, TradeError> {
        let repo = AccountRepository::new(self.pool.clone());
        if let Some(account) = repo.get_personal(owner_id).await? {
            return Ok(account);
        }
        info!("Creating personal account for {}", owner_id);
        let account = repo
            .create(CreateAccount {
                owner_id: owner_id.to_string(),
                kind: AccountKind::Personal,
                competition_id: None,
                starting_balance: self.starting_balance,
            })
            .await?;
        Ok(account)
    }

    /// Execute an order against the personal account
    pub async fn execute(
        &self,
        owner_id: &str,
        symbol: &str,
        side: TradeSide,
        quantity: i64,
    ) -> Result<ExecutionReceipt, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        self.executor
            .execute(OrderRequest {
                account_id: account.id,
                symbol: symbol.to_string(),
                side,
                quantity,
            })
            .await
    }

    /// Current mark-to-market snapshot of the personal account
    pub async fn value(&self, owner_id: &str) -> Result<PortfolioValuation, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        let positions = PositionRepository::new(self.pool.clone())
            .list_for_account(account.id)
            .await?;
        let quotes = collect_quotes(&self.oracle, &positions).await;
        let valuation = ValuationEngine::value_portfolio(&account, &positions, &quotes);
        if valuation.partial {
            debug!(
                "Partial valuation for account {}: no quotes for {:?}",
                account.id, valuation.missing_quotes
            );
        }
        Ok(valuation)
    }

    /// Performance statistics over the account's trade ledger
    pub async fn metrics(
        &self,
        owner_id: &str,
        period_days: i64,
    ) -> Result<PerformanceMetrics, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        let trades = TradeRepository::new(self.pool.clone())
            .list_for_account(account.id)
            .await?;
        Ok(self
            .performance
            .calculate(&trades, account.starting_balance, period_days, Utc::now()))
    }

    /// Daily portfolio value series for charting, rebuilt from the ledger
    pub async fn history(
        &self,
        owner_id: &str,
        period_days: i64,
    ) -> Result<PortfolioHistory, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        let trades = TradeRepository::new(self.pool.clone())
            .list_for_account(account.id)
            .await?;
        Ok(portfolio_history(
            account.id,
            &trades,
            account.starting_balance,
            period_days,
            Utc::now(),
        ))
    }

    /// Most recent trades, newest first
    pub async fn trade_history(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<TradeRecord>, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        Ok(TradeRepository::new(self.pool.clone())
            .list_recent(account.id, limit)
            .await?)
    }

    /// Wipe the account back to its starting balance
    pub async fn reset(&self, owner_id: &str) -> Result<Account, TradeError> {
        let account = self.ensure_account(owner_id).await?;
        info!("Resetting account {} for {}", account.id, owner_id);
        Ok(AccountRepository::new(self.pool.clone())
            .reset(account.id)
            .await?)
    }
}
