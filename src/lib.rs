//! simtrade - Simulated stock-trading demo server
//!
//! Streams a synthetic price feed over server-sent events and keeps
//! per-user wallets, positions and trade history in memory.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use axum::Router;
use chrono::{DateTime, Utc};
use config::Config;
use services::{LedgerStore, MarketState, PriceFeed, PriceGenerator};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub market: Arc<MarketState>,
    pub ledger: Arc<LedgerStore>,
    pub price_feed: Arc<PriceFeed>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire up fresh in-memory state from configuration.
    pub fn new(config: Config) -> Self {
        let market = MarketState::new(config.price.base_price);
        let ledger = LedgerStore::new(config.ledger.clone(), market.clone());
        let generator = PriceGenerator::new(config.price.clone(), market.clone());
        let price_feed = PriceFeed::new(generator, config.price.tick_interval());

        Self {
            config: Arc::new(config),
            market,
            ledger,
            price_feed,
            started_at: Utc::now(),
        }
    }
}

/// Build the HTTP application.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Re-export commonly used types
pub use types::*;
