//! Caching Oracle
//!
//! TTL cache in front of any price oracle. A fresh cached quote is served
//! without touching the upstream; failures are never cached, so a symbol
//! that just errored is retried on the next request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::repositories::price_oracle::{OracleResult, PriceOracle, Quote};
use crate::domain::value_objects::symbol::Symbol;

struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
}

pub struct CachingOracle {
    inner: Arc<dyn PriceOracle>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl CachingOracle {
    pub fn new(inner: Arc<dyn PriceOracle>, ttl: Duration) -> Self {
        CachingOracle {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PriceOracle for CachingOracle {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn quote(&self, symbol: &Symbol) -> OracleResult<Quote> {
        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.get(symbol.as_str()) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!("Quote cache hit for {}", symbol);
                    return Ok(entry.quote.clone());
                }
            }
        }

        let quote = self.inner.quote(symbol).await?;

        let mut cache = self.cache.lock().await;
        cache.insert(
            symbol.as_str().to_string(),
            CacheEntry {
                quote: quote.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(quote)
    }
}
