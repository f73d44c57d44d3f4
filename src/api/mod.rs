pub mod health;
pub mod market;
pub mod price;
pub mod trades;

use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(market::router())
        .merge(price::router())
        .merge(trades::router())
}
