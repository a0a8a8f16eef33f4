//! Fee Schedule
//!
//! Single place where order economics are computed. Both sides of a trade
//! pay a flat commission on the gross amount; the fee is rounded to cents
//! half-away-from-zero before it touches any balance, so ledger rows and
//! cash movements always agree to the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Commission terms applied to every order
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    /// Commission as a fraction of gross (0.0005 = 5 basis points)
    rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule { rate: dec!(0.0005) }
    }
}

/// The money breakdown of one order at a given execution price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEconomics {
    /// price x quantity
    pub gross: Decimal,
    /// Commission, rounded to cents
    pub fee: Decimal,
    /// Cash movement: gross + fee for buys (debit), gross - fee for sells
    /// (credit)
    pub net_debit: Decimal,
    pub net_credit: Decimal,
}

impl FeeSchedule {
    pub fn new(rate: Decimal) -> Self {
        FeeSchedule { rate }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn economics(&self, price: Decimal, quantity: i64) -> OrderEconomics {
        let gross = price * Decimal::from(quantity);
        let fee =
            (gross * self.rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        OrderEconomics {
            gross,
            fee,
            net_debit: gross + fee,
            net_credit: gross - fee,
        }
    }
}
