//! Trades API
//!
//! - GET /api/trades?mobile=<id> - Ledger snapshot for a user
//! - POST /api/trades?mobile=<id> - Settle a buy or sell

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::services::LedgerError;
use crate::types::{LedgerSnapshot, TradeRequest};
use crate::AppState;

/// Create trades router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trades", get(get_trades).post(post_trade))
        .layer(CatchPanicLayer::custom(handle_panic))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Every ledger error is a client error.
impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Trade handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Failed to process trade")),
    )
        .into_response()
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TradeQuery {
    pub mobile: Option<String>,
}

impl TradeQuery {
    fn user_id(&self) -> Result<&str, LedgerError> {
        self.mobile
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(LedgerError::MissingUser)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/trades
///
/// Snapshot of the user's ledger. Unknown users are created on the spot.
async fn get_trades(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<LedgerSnapshot>, LedgerError> {
    let user_id = query.user_id()?;
    Ok(Json(state.ledger.snapshot(user_id)))
}

/// POST /api/trades
///
/// Settle a trade at the client-supplied price.
async fn post_trade(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> Result<Json<LedgerSnapshot>, LedgerError> {
    let user_id = query.user_id()?;
    let Json(request) = body.map_err(|e| LedgerError::InvalidRequest(e.body_text()))?;

    let outcome = state
        .ledger
        .settle_trade(user_id, request.side, request.quantity, request.price)?;

    Ok(Json(outcome.snapshot))
}
