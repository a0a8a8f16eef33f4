//! Performance Metrics
//!
//! Descriptive statistics over an account's trade ledger. All statistics
//! degrade to 0.0 defaults when there is not enough data (fewer than two
//! daily observations, no sells yet); they never hard-fail a request.
//!
//! Money stays in `Decimal` through the ledger walk; conversion to f64
//! happens only at the statistics boundary where stdev and sqrt live.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::trade::{TradeRecord, TradeSide};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub sharpe_ratio: f64,
    /// Peak-to-trough of the cumulative return series, positive percentage
    pub max_drawdown: f64,
    /// Percentage of sells executed above the running average buy price
    pub win_rate: f64,
    /// Annualized stdev of daily returns, as a percentage
    pub volatility: f64,
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub avg_holding_period_days: f64,
    pub total_fees_paid: Decimal,
    pub period_days: i64,
    pub calculated_at: DateTime<Utc>,
}

impl PerformanceMetrics {
    fn empty(period_days: i64, now: DateTime<Utc>) -> Self {
        PerformanceMetrics {
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            volatility: 0.0,
            total_trades: 0,
            profitable_trades: 0,
            avg_holding_period_days: 0.0,
            total_fees_paid: Decimal::ZERO,
            period_days,
            calculated_at: now,
        }
    }
}

/// One day of the portfolio value series
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub portfolio_value: Decimal,
    pub daily_pnl: Decimal,
    pub cumulative_pnl: Decimal,
}

/// Daily portfolio value series for charting
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioHistory {
    pub account_id: i64,
    pub period_days: i64,
    pub points: Vec<HistoryPoint>,
    pub total_return: Decimal,
    pub total_return_percent: Decimal,
    pub generated_at: DateTime<Utc>,
}

/// Rebuild the daily portfolio value series over the period from net
/// ledger flows against the starting balance. Days without trades carry
/// the previous value forward; trades before the window are ignored.
pub fn portfolio_history(
    account_id: i64,
    trades: &[TradeRecord],
    starting_balance: Decimal,
    period_days: i64,
    now: DateTime<Utc>,
) -> PortfolioHistory {
    let window_start = now - Duration::days(period_days);

    let mut flows: HashMap<NaiveDate, Decimal> = HashMap::new();
    for trade in trades {
        if trade.created_at < window_start {
            continue;
        }
        let flow = match trade.side {
            TradeSide::Buy => -(trade.gross_amount + trade.fee_amount),
            TradeSide::Sell => trade.gross_amount - trade.fee_amount,
        };
        *flows.entry(trade.created_at.date_naive()).or_default() += flow;
    }

    let mut value = starting_balance;
    let mut points = Vec::with_capacity(period_days.max(0) as usize + 1);
    for offset in (0..=period_days.max(0)).rev() {
        let date = (now - Duration::days(offset)).date_naive();
        let daily_pnl = flows.get(&date).copied().unwrap_or(Decimal::ZERO);
        value += daily_pnl;
        points.push(HistoryPoint {
            date,
            portfolio_value: value,
            daily_pnl,
            cumulative_pnl: value - starting_balance,
        });
    }

    let total_return = value - starting_balance;
    let total_return_percent = if starting_balance.is_zero() {
        Decimal::ZERO
    } else {
        total_return / starting_balance * Decimal::from(100)
    };

    PortfolioHistory {
        account_id,
        period_days,
        points,
        total_return,
        total_return_percent,
        generated_at: now,
    }
}

/// Running per-symbol book used to judge sells against the average buy
/// price in effect at that point in the ledger
struct SymbolBook {
    quantity: i64,
    average_cost: Decimal,
    last_buy_at: Option<DateTime<Utc>>,
}

pub struct PerformanceCalculator {
    risk_free_rate: f64,
}

impl Default for PerformanceCalculator {
    fn default() -> Self {
        PerformanceCalculator {
            risk_free_rate: 0.02,
        }
    }
}

impl PerformanceCalculator {
    pub fn new(risk_free_rate: f64) -> Self {
        PerformanceCalculator { risk_free_rate }
    }

    /// Compute metrics over a ledger ordered ascending by execution time
    pub fn calculate(
        &self,
        trades: &[TradeRecord],
        starting_balance: Decimal,
        period_days: i64,
        now: DateTime<Utc>,
    ) -> PerformanceMetrics {
        if trades.is_empty() {
            return PerformanceMetrics::empty(period_days, now);
        }

        let total_fees_paid: Decimal = trades.iter().map(|t| t.fee_amount).sum();

        let mut books: HashMap<String, SymbolBook> = HashMap::new();
        let mut total_sells = 0usize;
        let mut profitable_trades = 0usize;
        let mut holding_days: Vec<f64> = Vec::new();

        for trade in trades {
            let book = books.entry(trade.symbol.clone()).or_insert(SymbolBook {
                quantity: 0,
                average_cost: Decimal::ZERO,
                last_buy_at: None,
            });
            match trade.side {
                TradeSide::Buy => {
                    let new_quantity = book.quantity + trade.quantity;
                    book.average_cost = (book.average_cost * Decimal::from(book.quantity)
                        + trade.gross_amount)
                        / Decimal::from(new_quantity);
                    book.quantity = new_quantity;
                    book.last_buy_at = Some(trade.created_at);
                }
                TradeSide::Sell => {
                    total_sells += 1;
                    if book.quantity > 0 && trade.execution_price > book.average_cost {
                        profitable_trades += 1;
                    }
                    if let Some(buy_at) = book.last_buy_at {
                        let days = (trade.created_at - buy_at).num_seconds() as f64 / 86_400.0;
                        holding_days.push(days.max(0.0));
                    }
                    book.quantity = (book.quantity - trade.quantity).max(0);
                    if book.quantity == 0 {
                        book.average_cost = Decimal::ZERO;
                        book.last_buy_at = None;
                    }
                }
            }
        }

        let win_rate = if total_sells > 0 {
            profitable_trades as f64 / total_sells as f64 * 100.0
        } else {
            0.0
        };
        let avg_holding_period_days = if holding_days.is_empty() {
            0.0
        } else {
            holding_days.iter().sum::<f64>() / holding_days.len() as f64
        };

        let daily_returns = daily_returns(trades, starting_balance, period_days, now);
        let volatility = annualized_volatility(&daily_returns);
        let sharpe_ratio = self.sharpe_ratio(&daily_returns, volatility);
        let max_drawdown = max_drawdown(&daily_returns);

        PerformanceMetrics {
            sharpe_ratio,
            max_drawdown,
            win_rate,
            volatility,
            total_trades: trades.len(),
            profitable_trades,
            avg_holding_period_days,
            total_fees_paid,
            period_days,
            calculated_at: now,
        }
    }

    fn sharpe_ratio(&self, daily_returns: &[f64], volatility_percent: f64) -> f64 {
        if daily_returns.len() < 2 || volatility_percent == 0.0 {
            return 0.0;
        }
        let mean_daily = daily_returns.iter().sum::<f64>() / daily_returns.len() as f64;
        let annualized_mean = mean_daily * TRADING_DAYS_PER_YEAR;
        (annualized_mean - self.risk_free_rate) / (volatility_percent / 100.0)
    }
}

/// Net ledger flow per calendar day over the period, normalized by the
/// starting balance. Days without trades contribute a zero observation.
fn daily_returns(
    trades: &[TradeRecord],
    starting_balance: Decimal,
    period_days: i64,
    now: DateTime<Utc>,
) -> Vec<f64> {
    if starting_balance.is_zero() || period_days <= 0 {
        return Vec::new();
    }

    let mut flows: HashMap<NaiveDate, Decimal> = HashMap::new();
    for trade in trades {
        let flow = match trade.side {
            TradeSide::Buy => -(trade.gross_amount + trade.fee_amount),
            TradeSide::Sell => trade.gross_amount - trade.fee_amount,
        };
        *flows.entry(trade.created_at.date_naive()).or_default() += flow;
    }

    let mut returns = Vec::with_capacity(period_days as usize);
    for offset in (0..period_days).rev() {
        let day = (now - Duration::days(offset)).date_naive();
        let flow = flows.get(&day).copied().unwrap_or(Decimal::ZERO);
        returns.push((flow / starting_balance).to_f64().unwrap_or(0.0));
    }
    returns
}

/// Sample standard deviation of daily returns, annualized, as a percentage
fn annualized_volatility(daily_returns: &[f64]) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let n = daily_returns.len() as f64;
    let mean = daily_returns.iter().sum::<f64>() / n;
    let variance = daily_returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Largest peak-to-trough decline of the compounded return series, as a
/// positive percentage
fn max_drawdown(daily_returns: &[f64]) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }
    let mut value = 1.0f64;
    let mut peak = 1.0f64;
    let mut worst = 0.0f64;
    for r in daily_returns {
        value *= 1.0 + r;
        if value > peak {
            peak = value;
        }
        let drawdown = (peak - value) / peak;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst * 100.0
}
