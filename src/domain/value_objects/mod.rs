pub mod quantity;
pub mod symbol;
