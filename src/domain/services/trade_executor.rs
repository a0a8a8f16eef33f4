//! Trade Executor
//!
//! Drives one order from request to committed ledger row:
//!
//! 1. Validate the input before touching the oracle.
//! 2. Fetch a live quote under a bounded timeout. No quote, no trade;
//!    prices are never fabricated.
//! 3. Under the account's lock, inside one transaction: re-read state,
//!    validate funds or shares, then commit the cash mutation, position
//!    upsert, and ledger append together.
//!
//! The in-process lock serializes orders per account; the version guard on
//! the cash write catches writers outside this process and triggers a
//! bounded retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::domain::entities::trade::TradeSide;
use crate::domain::errors::TradeError;
use crate::domain::repositories::price_oracle::PriceOracle;
use crate::domain::services::fees::FeeSchedule;
use crate::domain::value_objects::quantity::Quantity;
use crate::domain::value_objects::symbol::Symbol;
use crate::persistence::models::CreateTrade;
use crate::persistence::repository::tx;
use crate::persistence::DbPool;

/// An order as submitted, before any validation
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub account_id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: i64,
}

/// What the caller gets back for a committed order
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReceipt {
    pub trade_id: i64,
    pub account_id: i64,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: i64,
    pub executed_price: Decimal,
    pub gross_amount: Decimal,
    pub fee: Decimal,
    /// Cash actually moved: gross + fee on buys, gross - fee on sells
    pub net_amount: Decimal,
    pub cash_after: Decimal,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Budget for the oracle round-trip
    pub quote_timeout: Duration,
    /// Attempts against version-guard conflicts before giving up
    pub max_conflict_retries: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            quote_timeout: Duration::from_secs(15),
            max_conflict_retries: 3,
        }
    }
}

/// Per-account mutexes handed out on demand. Guards are owned so they can
/// live across the commit's await points.
#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub async fn acquire(&self, account_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(account_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

pub struct TradeExecutor {
    pool: DbPool,
    oracle: Arc<dyn PriceOracle>,
    fees: FeeSchedule,
    locks: AccountLocks,
    config: ExecutorConfig,
}

impl TradeExecutor {
    pub fn new(pool: DbPool, oracle: Arc<dyn PriceOracle>, config: ExecutorConfig) -> Self {
        TradeExecutor {
            pool,
            oracle,
            fees: FeeSchedule::default(),
            locks: AccountLocks::default(),
            config,
        }
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Execute one order end to end
    pub async fn execute(&self, request: OrderRequest) -> Result<ExecutionReceipt, TradeError> {
        let symbol =
            Symbol::parse(&request.symbol).map_err(|reason| TradeError::InvalidOrder { reason })?;
        let quantity = Quantity::new(request.quantity)
            .map_err(|reason| TradeError::InvalidOrder { reason })?;

        // Price first, outside the lock. A dead oracle must not block other
        // orders on the same account.
        let quote = tokio::time::timeout(self.config.quote_timeout, self.oracle.quote(&symbol))
            .await
            .map_err(|_| TradeError::OracleUnavailable {
                symbol: symbol.as_str().to_string(),
                reason: "quote request timed out".to_string(),
            })?
            .map_err(|e| TradeError::OracleUnavailable {
                symbol: symbol.as_str().to_string(),
                reason: e.to_string(),
            })?;

        let _guard = self.locks.acquire(request.account_id).await;

        let mut attempt = 0;
        loop {
            match self
                .commit(request.account_id, &symbol, request.side, quantity.value(), quote.price)
                .await
            {
                Err(TradeError::PersistenceConflict { account_id })
                    if attempt < self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(
                        account_id,
                        attempt, "Version conflict on trade commit, retrying"
                    );
                }
                Ok(receipt) => {
                    info!(
                        account_id = receipt.account_id,
                        trade_id = receipt.trade_id,
                        symbol = %receipt.symbol,
                        side = %receipt.side,
                        quantity = receipt.quantity,
                        price = %receipt.executed_price,
                        "Executed trade"
                    );
                    return Ok(receipt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One atomic attempt: read, validate, write, commit. Any error path
    /// drops the transaction unfinished, which rolls it back.
    async fn commit(
        &self,
        account_id: i64,
        symbol: &Symbol,
        side: TradeSide,
        quantity: i64,
        price: Decimal,
    ) -> Result<ExecutionReceipt, TradeError> {
        let economics = self.fees.economics(price, quantity);
        let mut transaction = self.pool.begin().await.map_err(|e| {
            TradeError::Storage(crate::persistence::DatabaseError::ConnectionError(e))
        })?;

        let account = tx::get_account(&mut transaction, account_id)
            .await?
            .ok_or(TradeError::AccountNotFound)?;
        let position = tx::get_position(&mut transaction, account_id, symbol.as_str()).await?;

        let (cash_after, realized_pnl) = match side {
            TradeSide::Buy => {
                if !account.can_afford(economics.net_debit) {
                    return Err(TradeError::InsufficientFunds {
                        required: economics.net_debit,
                        available: account.cash_balance,
                    });
                }
                let (new_quantity, new_average_cost) = match &position {
                    Some(position) => position.recost_for_buy(quantity, economics.gross),
                    None => (quantity, price),
                };
                tx::upsert_position(
                    &mut transaction,
                    account_id,
                    symbol.as_str(),
                    new_quantity,
                    new_average_cost,
                )
                .await?;
                (account.cash_balance - economics.net_debit, None)
            }
            TradeSide::Sell => {
                let held = position.as_ref().map(|p| p.quantity).unwrap_or(0);
                if held < quantity {
                    return Err(TradeError::InsufficientShares {
                        requested: quantity,
                        held,
                    });
                }
                let position = position.expect("held > 0 implies position exists");
                let realized =
                    economics.net_credit - position.average_cost * Decimal::from(quantity);
                let remaining = held - quantity;
                if remaining == 0 {
                    tx::delete_position(&mut transaction, account_id, symbol.as_str()).await?;
                } else {
                    tx::upsert_position(
                        &mut transaction,
                        account_id,
                        symbol.as_str(),
                        remaining,
                        position.average_cost,
                    )
                    .await?;
                }
                (account.cash_balance + economics.net_credit, Some(realized))
            }
        };

        let updated =
            tx::update_cash_guarded(&mut transaction, account_id, cash_after, account.version)
                .await?;
        if !updated {
            return Err(TradeError::PersistenceConflict { account_id });
        }

        let executed_at = Utc::now();
        let trade = tx::insert_trade(
            &mut transaction,
            &CreateTrade {
                account_id,
                symbol: symbol.as_str().to_string(),
                side,
                quantity,
                execution_price: price,
                gross_amount: economics.gross,
                fee_amount: economics.fee,
                realized_pnl,
            },
            executed_at,
        )
        .await?;

        transaction.commit().await.map_err(|e| {
            TradeError::Storage(crate::persistence::DatabaseError::ConnectionError(e))
        })?;

        let net_amount = match side {
            TradeSide::Buy => economics.net_debit,
            TradeSide::Sell => economics.net_credit,
        };
        Ok(ExecutionReceipt {
            trade_id: trade.id,
            account_id,
            symbol: symbol.as_str().to_string(),
            side,
            quantity,
            executed_price: price,
            gross_amount: economics.gross,
            fee: economics.fee,
            net_amount,
            cash_after,
            executed_at,
        })
    }
}
