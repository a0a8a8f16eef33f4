//! Portfolio Valuation
//!
//! Pure mark-to-market over a set of positions and whatever quotes could be
//! obtained. A position with no quote is reported by symbol and excluded
//! from the stock value; the valuation is flagged partial rather than
//! silently under-reporting, and no price is ever invented for it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::account::Account;
use crate::domain::entities::position::Position;
use crate::domain::repositories::price_oracle::Quote;

/// One position marked to market
#[derive(Debug, Clone, Serialize)]
pub struct PositionValuation {
    pub symbol: String,
    pub quantity: i64,
    pub average_cost: Decimal,
    pub cost_basis: Decimal,
    /// None when no live quote was available
    pub current_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
    pub unrealized_pnl_percent: Option<Decimal>,
}

/// Full snapshot of an account's worth
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioValuation {
    pub account_id: i64,
    pub cash_balance: Decimal,
    /// Sum of market values of the positions that could be priced
    pub stock_value: Decimal,
    pub total_value: Decimal,
    pub total_return: Decimal,
    pub total_return_percent: Decimal,
    /// True when at least one position could not be priced; total_value
    /// understates the portfolio in that case
    pub partial: bool,
    pub missing_quotes: Vec<String>,
    pub positions: Vec<PositionValuation>,
}

pub struct ValuationEngine;

impl ValuationEngine {
    /// Mark the account's positions to market with the quotes at hand
    pub fn value_portfolio(
        account: &Account,
        positions: &[Position],
        quotes: &HashMap<String, Quote>,
    ) -> PortfolioValuation {
        let mut stock_value = Decimal::ZERO;
        let mut missing_quotes = Vec::new();
        let mut valued = Vec::with_capacity(positions.len());

        for position in positions {
            let cost_basis = position.cost_basis();
            match quotes.get(&position.symbol) {
                Some(quote) => {
                    let market_value = quote.price * Decimal::from(position.quantity);
                    let unrealized = market_value - cost_basis;
                    let unrealized_percent = if cost_basis.is_zero() {
                        Decimal::ZERO
                    } else {
                        unrealized / cost_basis * Decimal::from(100)
                    };
                    stock_value += market_value;
                    valued.push(PositionValuation {
                        symbol: position.symbol.clone(),
                        quantity: position.quantity,
                        average_cost: position.average_cost,
                        cost_basis,
                        current_price: Some(quote.price),
                        market_value: Some(market_value),
                        unrealized_pnl: Some(unrealized),
                        unrealized_pnl_percent: Some(unrealized_percent),
                    });
                }
                None => {
                    missing_quotes.push(position.symbol.clone());
                    valued.push(PositionValuation {
                        symbol: position.symbol.clone(),
                        quantity: position.quantity,
                        average_cost: position.average_cost,
                        cost_basis,
                        current_price: None,
                        market_value: None,
                        unrealized_pnl: None,
                        unrealized_pnl_percent: None,
                    });
                }
            }
        }

        let total_value = account.cash_balance + stock_value;
        let total_return = total_value - account.starting_balance;
        let total_return_percent = if account.starting_balance.is_zero() {
            Decimal::ZERO
        } else {
            total_return / account.starting_balance * Decimal::from(100)
        };

        PortfolioValuation {
            account_id: account.id,
            cash_balance: account.cash_balance,
            stock_value,
            total_value,
            total_return,
            total_return_percent,
            partial: !missing_quotes.is_empty(),
            missing_quotes,
            positions: valued,
        }
    }
}
