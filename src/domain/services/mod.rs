pub mod fees;
pub mod performance;
pub mod trade_executor;
pub mod valuation;
