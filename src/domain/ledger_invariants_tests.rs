//! Ledger reconciliation tests: account and position state must always be
//! re-derivable from the trade ledger alone.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::entities::account::AccountKind;
use crate::domain::entities::trade::TradeSide;
use crate::domain::errors::TradeError;
use crate::domain::repositories::price_oracle::{OracleError, OracleResult, PriceOracle, Quote};
use crate::domain::services::trade_executor::{
    ExecutorConfig, OrderRequest, TradeExecutor,
};
use crate::domain::value_objects::symbol::Symbol;
use crate::persistence::models::CreateAccount;
use crate::persistence::repository::{AccountRepository, PositionRepository, TradeRepository};
use crate::persistence::{init_database, DbPool};

struct TapeOracle {
    prices: HashMap<String, Decimal>,
}

impl TapeOracle {
    fn new(prices: &[(&str, Decimal)]) -> Self {
        TapeOracle {
            prices: prices
                .iter()
                .map(|(symbol, price)| (symbol.to_string(), *price))
                .collect(),
        }
    }
}

#[async_trait]
impl PriceOracle for TapeOracle {
    fn name(&self) -> &str {
        "tape"
    }

    async fn quote(&self, symbol: &Symbol) -> OracleResult<Quote> {
        match self.prices.get(symbol.as_str()) {
            Some(price) => Quote::new(*price, *price, Utc::now()),
            None => Err(OracleError::Unavailable("off tape".to_string())),
        }
    }
}

async fn funded_account(pool: &DbPool, starting_balance: Decimal) -> i64 {
    AccountRepository::new(pool.clone())
        .create(CreateAccount {
            owner_id: "trader".to_string(),
            kind: AccountKind::Personal,
            competition_id: None,
            starting_balance,
        })
        .await
        .unwrap()
        .id
}

fn executor(pool: &DbPool, prices: &[(&str, Decimal)]) -> TradeExecutor {
    TradeExecutor::new(
        pool.clone(),
        Arc::new(TapeOracle::new(prices)),
        ExecutorConfig::default(),
    )
}

fn order(account_id: i64, symbol: &str, side: TradeSide, quantity: i64) -> OrderRequest {
    OrderRequest {
        account_id,
        symbol: symbol.to_string(),
        side,
        quantity,
    }
}

/// Replay the ledger and check cash and holdings against stored state
async fn assert_reconciles(pool: &DbPool, account_id: i64) {
    let account = AccountRepository::new(pool.clone())
        .get(account_id)
        .await
        .unwrap()
        .unwrap();
    let trades = TradeRepository::new(pool.clone())
        .list_for_account(account_id)
        .await
        .unwrap();
    let positions = PositionRepository::new(pool.clone())
        .list_for_account(account_id)
        .await
        .unwrap();

    let mut cash = account.starting_balance;
    let mut holdings: HashMap<String, i64> = HashMap::new();
    for trade in &trades {
        match trade.side {
            TradeSide::Buy => {
                cash -= trade.gross_amount + trade.fee_amount;
                *holdings.entry(trade.symbol.clone()).or_default() += trade.quantity;
            }
            TradeSide::Sell => {
                cash += trade.gross_amount - trade.fee_amount;
                *holdings.entry(trade.symbol.clone()).or_default() -= trade.quantity;
            }
        }
    }
    holdings.retain(|_, quantity| *quantity != 0);

    assert_eq!(account.cash_balance, cash, "cash diverged from ledger");
    let stored: HashMap<String, i64> = positions
        .iter()
        .map(|p| (p.symbol.clone(), p.quantity))
        .collect();
    assert_eq!(stored, holdings, "positions diverged from ledger");
}

#[tokio::test]
async fn test_mixed_activity_reconciles() {
    let pool = init_database("sqlite::memory:").await.unwrap();
    let account_id = funded_account(&pool, dec!(100000)).await;
    let executor = executor(
        &pool,
        &[("AAPL", dec!(150.00)), ("MSFT", dec!(320.50)), ("BRK.B", dec!(412.37))],
    );

    for (symbol, side, quantity) in [
        ("AAPL", TradeSide::Buy, 10),
        ("MSFT", TradeSide::Buy, 7),
        ("AAPL", TradeSide::Sell, 4),
        ("BRK.B", TradeSide::Buy, 3),
        ("AAPL", TradeSide::Sell, 6),
        ("MSFT", TradeSide::Buy, 2),
    ] {
        executor
            .execute(order(account_id, symbol, side, quantity))
            .await
            .unwrap();
    }

    assert_reconciles(&pool, account_id).await;
}

#[tokio::test]
async fn test_rejected_orders_leave_no_ledger_trace() {
    let pool = init_database("sqlite::memory:").await.unwrap();
    let account_id = funded_account(&pool, dec!(2000)).await;
    let executor = executor(&pool, &[("AAPL", dec!(150.00))]);

    executor
        .execute(order(account_id, "AAPL", TradeSide::Buy, 10))
        .await
        .unwrap();

    // Unaffordable buy, oversell, and off-tape symbol all fail
    assert!(executor
        .execute(order(account_id, "AAPL", TradeSide::Buy, 10))
        .await
        .is_err());
    assert!(executor
        .execute(order(account_id, "AAPL", TradeSide::Sell, 11))
        .await
        .is_err());
    assert!(executor
        .execute(order(account_id, "GHOST", TradeSide::Buy, 1))
        .await
        .is_err());

    let trades = TradeRepository::new(pool.clone())
        .list_for_account(account_id)
        .await
        .unwrap();
    assert_eq!(trades.len(), 1);
    assert_reconciles(&pool, account_id).await;
}

#[tokio::test]
async fn test_concurrent_buys_cannot_overspend() {
    let pool = init_database("sqlite::memory:").await.unwrap();
    // Enough for one 10-share buy at 150 plus fee, nowhere near two
    let account_id = funded_account(&pool, dec!(1600)).await;
    let executor = Arc::new(executor(&pool, &[("AAPL", dec!(150.00))]));

    let a = tokio::spawn({
        let executor = Arc::clone(&executor);
        async move {
            executor
                .execute(order(account_id, "AAPL", TradeSide::Buy, 10))
                .await
        }
    });
    let b = tokio::spawn({
        let executor = Arc::clone(&executor);
        async move {
            executor
                .execute(order(account_id, "AAPL", TradeSide::Buy, 10))
                .await
        }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two competing buys may land");
    let rejection = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one order must have been rejected");
    assert!(matches!(rejection, TradeError::InsufficientFunds { .. }));

    assert_reconciles(&pool, account_id).await;
}

// Two executors with independent lock maps over one file-backed pool: the
// in-process mutex no longer serializes the account, so commits have to
// converge through the version guard and its bounded retry.
#[tokio::test]
async fn test_competing_executors_converge_on_one_account() {
    let db_path = std::env::temp_dir().join(format!(
        "paperdesk-executor-race-{}.db",
        std::process::id()
    ));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path.display(), suffix));
    }
    let pool = init_database(&format!("sqlite://{}", db_path.display()))
        .await
        .unwrap();
    let account_id = funded_account(&pool, dec!(100000)).await;

    let left = Arc::new(executor(&pool, &[("AAPL", dec!(150.00))]));
    let right = Arc::new(executor(&pool, &[("AAPL", dec!(150.00))]));

    let race = |exec: Arc<TradeExecutor>| {
        tokio::spawn(async move {
            let mut results = Vec::new();
            for _ in 0..5 {
                results.push(
                    exec.execute(order(account_id, "AAPL", TradeSide::Buy, 10))
                        .await,
                );
            }
            results
        })
    };
    let (a, b) = tokio::join!(race(left), race(right));
    let results: Vec<_> = a.unwrap().into_iter().chain(b.unwrap()).collect();

    // Every receipt handed out must be backed by a ledger row, and the
    // stored balance must equal the starting balance less the ledger's
    // debits, whatever the interleaving was
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert!(successes > 0);
    let trades = TradeRepository::new(pool.clone())
        .list_for_account(account_id)
        .await
        .unwrap();
    assert_eq!(trades.len(), successes, "receipts and ledger disagree");

    let spent: Decimal = trades
        .iter()
        .map(|t| t.gross_amount + t.fee_amount)
        .sum();
    let account = AccountRepository::new(pool.clone())
        .get(account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.cash_balance, dec!(100000) - spent);
    assert_reconciles(&pool, account_id).await;

    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path.display(), suffix));
    }
}

#[tokio::test]
async fn test_realized_pnl_matches_ledger() {
    let pool = init_database("sqlite::memory:").await.unwrap();
    let account_id = funded_account(&pool, dec!(100000)).await;

    executor(&pool, &[("AAPL", dec!(150.00))])
        .execute(order(account_id, "AAPL", TradeSide::Buy, 10))
        .await
        .unwrap();
    executor(&pool, &[("AAPL", dec!(160.00))])
        .execute(order(account_id, "AAPL", TradeSide::Sell, 10))
        .await
        .unwrap();

    let trades = TradeRepository::new(pool.clone())
        .list_for_account(account_id)
        .await
        .unwrap();
    let sell = trades.last().unwrap();
    // net credit 1599.20 minus cost basis 1500.00
    assert_eq!(sell.realized_pnl, Some(dec!(99.20)));

    let account = AccountRepository::new(pool)
        .get(account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.cash_balance, dec!(100098.45));
}
