//! Runtime configuration, loaded from environment variables with sane
//! defaults. Invalid values fall back to the default with a warning rather
//! than aborting startup.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database URL
    pub database_url: String,
    /// HTTP listen port
    pub port: u16,

    /// Quote endpoint base URL (Alpha-Vantage-compatible)
    pub quote_api_base_url: String,
    pub quote_api_key: String,
    /// Budget for one oracle round-trip (seconds)
    pub quote_timeout_seconds: u64,
    /// How long a fetched quote stays fresh (seconds)
    pub quote_cache_ttl_seconds: u64,

    /// Interval of the background revaluation task (seconds)
    pub revaluation_interval_seconds: u64,
    /// Interval of the competition lifecycle sweep (seconds)
    pub competition_sweep_interval_seconds: u64,

    /// Cash a new personal account starts with
    pub personal_starting_balance: Decimal,
    /// Default starting balance for competitions that do not set their own
    pub competition_starting_balance: Decimal,
    /// Rank leaderboards by cash + stock value rather than cash alone
    pub rank_by_total_value: bool,

    /// Attempts against version-guard conflicts before an order gives up
    pub max_conflict_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite://data/paperdesk.db".to_string(),
            port: 3000,
            quote_api_base_url: "https://www.alphavantage.co".to_string(),
            quote_api_key: "demo".to_string(),
            quote_timeout_seconds: 15,
            quote_cache_ttl_seconds: 60,
            revaluation_interval_seconds: 15,
            competition_sweep_interval_seconds: 60,
            personal_starting_balance: dec!(100000),
            competition_starting_balance: dec!(10000),
            rank_by_total_value: true,
            max_conflict_retries: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppConfig {
        let mut config = AppConfig::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(value) => config.port = value,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse PORT '{}': {}, using default: {}",
                        port,
                        e,
                        config.port
                    );
                }
            }
        }

        if let Ok(base_url) = std::env::var("QUOTE_API_BASE_URL") {
            config.quote_api_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Ok(key) = std::env::var("QUOTE_API_KEY") {
            config.quote_api_key = key;
        }

        if let Ok(timeout) = std::env::var("QUOTE_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse::<u64>() {
                if (1..=120).contains(&value) {
                    config.quote_timeout_seconds = value;
                }
            }
        }

        if let Ok(ttl) = std::env::var("QUOTE_CACHE_TTL_SECONDS") {
            if let Ok(value) = ttl.parse::<u64>() {
                config.quote_cache_ttl_seconds = value;
            }
        }

        if let Ok(interval) = std::env::var("REVALUATION_INTERVAL_SECONDS") {
            if let Ok(value) = interval.parse::<u64>() {
                if value >= 5 {
                    config.revaluation_interval_seconds = value;
                }
            }
        }

        if let Ok(interval) = std::env::var("COMPETITION_SWEEP_INTERVAL_SECONDS") {
            if let Ok(value) = interval.parse::<u64>() {
                if value >= 5 {
                    config.competition_sweep_interval_seconds = value;
                }
            }
        }

        if let Ok(balance) = std::env::var("PERSONAL_STARTING_BALANCE") {
            match balance.parse::<Decimal>() {
                Ok(value) if value > Decimal::ZERO => config.personal_starting_balance = value,
                _ => {
                    tracing::warn!(
                        "Invalid PERSONAL_STARTING_BALANCE '{}', using default: {}",
                        balance,
                        config.personal_starting_balance
                    );
                }
            }
        }

        if let Ok(balance) = std::env::var("COMPETITION_STARTING_BALANCE") {
            match balance.parse::<Decimal>() {
                Ok(value) if value > Decimal::ZERO => config.competition_starting_balance = value,
                _ => {
                    tracing::warn!(
                        "Invalid COMPETITION_STARTING_BALANCE '{}', using default: {}",
                        balance,
                        config.competition_starting_balance
                    );
                }
            }
        }

        if let Ok(flag) = std::env::var("RANK_BY_TOTAL_VALUE") {
            config.rank_by_total_value = flag.to_lowercase() == "true" || flag == "1";
        }

        if let Ok(retries) = std::env::var("MAX_CONFLICT_RETRIES") {
            if let Ok(value) = retries.parse::<u32>() {
                if value <= 10 {
                    config.max_conflict_retries = value;
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.personal_starting_balance, dec!(100000));
        assert_eq!(config.competition_starting_balance, dec!(10000));
        assert_eq!(config.quote_timeout_seconds, 15);
        assert!(config.rank_by_total_value);
    }
}
