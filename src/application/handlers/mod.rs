//! HTTP Handlers
//!
//! Thin axum layer over the application services. Identity arrives as the
//! `x-user-id` header set by the gateway; handlers translate requests into
//! service calls and `TradeError` into stable error codes with the right
//! status.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::services::competition_service::CompetitionService;
use crate::application::services::portfolio_service::PortfolioService;
use crate::domain::entities::trade::TradeSide;
use crate::domain::errors::TradeError;

#[derive(Clone)]
pub struct AppState {
    pub portfolio: Arc<PortfolioService>,
    pub competitions: Arc<CompetitionService>,
}

/// Error body every failed request gets
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        ApiError {
            code: code.to_string(),
            message: message.into(),
            retryable: false,
            status,
        }
    }
}

impl From<TradeError> for ApiError {
    fn from(error: TradeError) -> Self {
        let status = match &error {
            TradeError::InvalidOrder { .. }
            | TradeError::InsufficientFunds { .. }
            | TradeError::InsufficientShares { .. }
            | TradeError::CompetitionNotActive { .. } => StatusCode::BAD_REQUEST,
            TradeError::AccountNotFound => StatusCode::NOT_FOUND,
            TradeError::NotAParticipant { .. } => StatusCode::FORBIDDEN,
            TradeError::OracleUnavailable { .. } | TradeError::PersistenceConflict { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TradeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Storage details stay in the logs, not in responses
        let message = match &error {
            TradeError::Storage(e) => {
                tracing::error!("Storage error serving request: {}", e);
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };
        ApiError {
            code: error.code().to_string(),
            message,
            retryable: error.is_retryable(),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                "missing_identity",
                "x-user-id header is required",
            )
        })
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: String,
    pub quantity: i64,
}

impl TradeRequest {
    fn side(&self) -> Result<TradeSide, ApiError> {
        TradeSide::parse(&self.side)
            .map_err(|reason| ApiError::new(StatusCode::BAD_REQUEST, "invalid_order", reason))
    }
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default = "default_period_days")]
    pub period_days: i64,
}

fn default_period_days() -> i64 {
    30
}

fn validate_period_days(period_days: i64) -> Result<(), ApiError> {
    if !(1..=365).contains(&period_days) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_order",
            "period_days must be between 1 and 365",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct CreateCompetitionRequest {
    pub name: String,
    pub starting_balance: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trade/execute", post(execute_trade))
        .route("/portfolio/value", get(portfolio_value))
        .route("/portfolio/metrics", get(portfolio_metrics))
        .route("/portfolio/history", get(portfolio_history))
        .route("/portfolio/trades", get(portfolio_trades))
        .route("/portfolio/reset", post(portfolio_reset))
        .route("/competitions", post(create_competition))
        .route("/competitions/:id", get(get_competition))
        .route("/competitions/:id/join", post(join_competition))
        .route("/competitions/:id/trade", post(competition_trade))
        .route("/competitions/:id/leaderboard", get(leaderboard))
        .route("/competitions/:id/close", post(close_competition))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn execute_trade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let side = request.side()?;
    let receipt = state
        .portfolio
        .execute(&owner, &request.symbol, side, request.quantity)
        .await?;
    Ok(Json(receipt))
}

async fn portfolio_value(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let valuation = state.portfolio.value(&owner).await?;
    Ok(Json(valuation))
}

async fn portfolio_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    validate_period_days(query.period_days)?;
    let metrics = state.portfolio.metrics(&owner, query.period_days).await?;
    Ok(Json(metrics))
}

async fn portfolio_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    validate_period_days(query.period_days)?;
    let history = state.portfolio.history(&owner, query.period_days).await?;
    Ok(Json(history))
}

async fn portfolio_trades(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let limit = query.limit.clamp(1, 500);
    let trades = state.portfolio.trade_history(&owner, limit).await?;
    Ok(Json(trades))
}

async fn portfolio_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let account = state.portfolio.reset(&owner).await?;
    Ok(Json(account))
}

async fn create_competition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCompetitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user_id(&headers)?;
    let start_date = request.start_date.unwrap_or_else(Utc::now);
    let competition = state
        .competitions
        .create(
            &request.name,
            request.starting_balance,
            start_date,
            request.end_date,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(competition)))
}

async fn get_competition(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let competition = state.competitions.get(id).await?.ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("competition {} does not exist", id),
        )
    })?;
    Ok(Json(competition))
}

async fn join_competition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let account = state.competitions.join(&owner, id).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn competition_trade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<TradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = user_id(&headers)?;
    let side = request.side()?;
    let receipt = state
        .competitions
        .execute(&owner, id, &request.symbol, side, request.quantity)
        .await?;
    Ok(Json(receipt))
}

async fn leaderboard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.competitions.leaderboard(id).await?;
    Ok(Json(entries))
}

async fn close_competition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    user_id(&headers)?;
    let standings = state.competitions.close(id).await?;
    Ok(Json(standings))
}
