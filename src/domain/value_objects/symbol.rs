use serde::{Deserialize, Serialize};

const MAX_SYMBOL_LEN: usize = 10;

/// Normalized equity ticker symbol
///
/// Symbols are uppercased on construction. Rejecting malformed input here
/// keeps the trade executor from touching the price oracle for garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim().to_uppercase();

        if normalized.is_empty() {
            return Err("Symbol must not be empty".to_string());
        }
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(format!(
                "Symbol '{}' exceeds maximum length of {} characters",
                normalized, MAX_SYMBOL_LEN
            ));
        }
        if !normalized.chars().next().unwrap_or(' ').is_ascii_alphabetic() {
            return Err(format!("Symbol '{}' must start with a letter", normalized));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(format!(
                "Symbol '{}' contains invalid characters",
                normalized
            ));
        }

        Ok(Symbol(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_parse_valid() {
        let symbol = Symbol::parse("AAPL");
        assert!(symbol.is_ok());
        assert_eq!(symbol.unwrap().as_str(), "AAPL");
    }

    #[test]
    fn test_symbol_parse_normalizes_case_and_whitespace() {
        let symbol = Symbol::parse("  aapl ").unwrap();
        assert_eq!(symbol.as_str(), "AAPL");
    }

    #[test]
    fn test_symbol_parse_allows_class_shares() {
        assert!(Symbol::parse("BRK.B").is_ok());
        assert!(Symbol::parse("BRK-B").is_ok());
    }

    #[test]
    fn test_symbol_parse_empty() {
        assert!(Symbol::parse("").is_err());
        assert!(Symbol::parse("   ").is_err());
    }

    #[test]
    fn test_symbol_parse_too_long() {
        assert!(Symbol::parse("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn test_symbol_parse_invalid_characters() {
        assert!(Symbol::parse("AA PL").is_err());
        assert!(Symbol::parse("AAPL$").is_err());
    }

    #[test]
    fn test_symbol_parse_must_start_with_letter() {
        assert!(Symbol::parse("1APL").is_err());
        assert!(Symbol::parse("-APL").is_err());
    }
}
