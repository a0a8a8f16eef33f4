use serde::{Deserialize, Serialize};

/// Whole-share order quantity, strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> Result<Self, String> {
        if value > 0 {
            Ok(Quantity(value))
        } else {
            Err(format!("Quantity must be positive, got {}", value))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
