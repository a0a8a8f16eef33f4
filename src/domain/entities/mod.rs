pub mod account;
pub mod competition;
pub mod position;
pub mod trade;
