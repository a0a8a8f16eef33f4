mod application;
mod config;
mod domain;
mod infrastructure;
mod persistence;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::handlers::{router, AppState};
use crate::application::services::competition_service::CompetitionService;
use crate::application::services::portfolio_service::PortfolioService;
use crate::config::AppConfig;
use crate::domain::repositories::price_oracle::PriceOracle;
use crate::domain::services::trade_executor::{ExecutorConfig, TradeExecutor};
use crate::domain::value_objects::symbol::Symbol;
use crate::infrastructure::cached_oracle::CachingOracle;
use crate::infrastructure::quote_client::HttpQuoteClient;
use crate::persistence::repository::PositionRepository;
use crate::persistence::{init_database, DbPool};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperdesk=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!("Starting paper trading server on port {}", config.port);

    let pool = init_database(&config.database_url).await?;

    let quote_client: Arc<dyn PriceOracle> = Arc::new(HttpQuoteClient::new(
        config.quote_api_base_url.clone(),
        config.quote_api_key.clone(),
        Duration::from_secs(config.quote_timeout_seconds),
    ));
    let oracle: Arc<dyn PriceOracle> = Arc::new(CachingOracle::new(
        quote_client,
        Duration::from_secs(config.quote_cache_ttl_seconds),
    ));
    info!("Quote source: {}", oracle.name());

    let executor = Arc::new(TradeExecutor::new(
        pool.clone(),
        oracle.clone(),
        ExecutorConfig {
            quote_timeout: Duration::from_secs(config.quote_timeout_seconds),
            max_conflict_retries: config.max_conflict_retries,
        },
    ));

    let portfolio = Arc::new(PortfolioService::new(
        pool.clone(),
        executor.clone(),
        oracle.clone(),
        config.personal_starting_balance,
    ));
    let competitions = Arc::new(CompetitionService::new(
        pool.clone(),
        executor,
        oracle.clone(),
        config.competition_starting_balance,
        config.rank_by_total_value,
    ));

    // Keep quotes warm for every held symbol so valuations and leaderboards
    // mostly hit the cache
    let revaluation_pool = pool.clone();
    let revaluation_oracle = oracle.clone();
    let revaluation_interval = config.revaluation_interval_seconds;
    tokio::spawn(async move {
        revaluation_task(revaluation_pool, revaluation_oracle, revaluation_interval).await;
    });

    // Open upcoming competitions and close expired ones on a timer
    let sweep_competitions = competitions.clone();
    let sweep_interval = config.competition_sweep_interval_seconds;
    tokio::spawn(async move {
        competition_sweep_task(sweep_competitions, sweep_interval).await;
    });

    let app = router(AppState {
        portfolio,
        competitions,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Periodically advance competition lifecycles against the clock
async fn competition_sweep_task(competitions: Arc<CompetitionService>, interval_seconds: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = competitions.advance_schedules(chrono::Utc::now()).await {
            error!("Competition lifecycle sweep failed: {}", e);
        }
    }
}

/// Periodically refresh quotes for every symbol anyone holds
async fn revaluation_task(pool: DbPool, oracle: Arc<dyn PriceOracle>, interval_seconds: u64) {
    let positions = PositionRepository::new(pool);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let symbols = match positions.distinct_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                error!("Revaluation pass could not list held symbols: {}", e);
                continue;
            }
        };
        if symbols.is_empty() {
            continue;
        }

        let mut refreshed = 0usize;
        for raw in &symbols {
            let symbol = match Symbol::parse(raw) {
                Ok(symbol) => symbol,
                Err(reason) => {
                    warn!("Skipping held symbol {}: {}", raw, reason);
                    continue;
                }
            };
            match oracle.quote(&symbol).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!("Revaluation could not refresh {}: {}", raw, e),
            }
        }
        debug!(
            "Revaluation pass refreshed {}/{} held symbols",
            refreshed,
            symbols.len()
        );
    }
}
