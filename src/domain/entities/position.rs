//! Position entity - a current non-zero holding of one symbol
//!
//! The average cost is a quantity-weighted mean over all buys and is left
//! untouched by partial sells; realization uses the existing average cost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub account_id: i64,
    pub symbol: String,
    /// Strictly positive while the row exists; a position that reaches
    /// zero is deleted, never stored
    pub quantity: i64,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Weighted-average cost after buying `buy_quantity` more shares for
    /// `buy_gross` total (price x quantity, before fees)
    pub fn recost_for_buy(&self, buy_quantity: i64, buy_gross: Decimal) -> (i64, Decimal) {
        let new_quantity = self.quantity + buy_quantity;
        let total_cost = self.average_cost * Decimal::from(self.quantity) + buy_gross;
        let new_average = total_cost / Decimal::from(new_quantity);
        (new_quantity, new_average)
    }

    /// Cost basis of the currently held quantity
    pub fn cost_basis(&self) -> Decimal {
        self.average_cost * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(quantity: i64, average_cost: Decimal) -> Position {
        Position {
            id: 1,
            account_id: 1,
            symbol: "AAPL".to_string(),
            quantity,
            average_cost,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_recost_equal_lots() {
        // 10 @ $100 then 10 @ $200 averages out to $150
        let pos = position(10, dec!(100));
        let (quantity, average) = pos.recost_for_buy(10, dec!(2000));
        assert_eq!(quantity, 20);
        assert_eq!(average, dec!(150));
    }

    #[test]
    fn test_recost_unequal_lots() {
        let pos = position(30, dec!(10));
        let (quantity, average) = pos.recost_for_buy(10, dec!(200));
        assert_eq!(quantity, 40);
        // (30*10 + 200) / 40 = 12.5
        assert_eq!(average, dec!(12.5));
    }

    #[test]
    fn test_cost_basis() {
        let pos = position(10, dec!(150));
        assert_eq!(pos.cost_basis(), dec!(1500));
    }
}
