use crate::types::MarketStats;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// GET /api/market
async fn get_market(State(state): State<AppState>) -> Json<ApiResponse<MarketStats>> {
    Json(ApiResponse {
        data: MarketStats {
            market: state.market.snapshot(),
            active_streams: state.price_feed.active_subscriptions(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/market", get(get_market))
}
