//! Price stream API
//!
//! - GET /api/price - Server-sent stream of `{"price": <number>}` events
//!
//! Besides data events the stream carries `: keep-alive` comment frames
//! whenever it has been idle for [`KEEP_ALIVE_INTERVAL`]. EventSource clients
//! ignore them. The connection itself is managed by the HTTP server.

use crate::error::Result;
use crate::types::PriceTick;
use crate::AppState;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Idle time before a comment frame is sent.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/price", get(price_stream))
}

fn price_event(tick: PriceTick, fallback_price: f64) -> Event {
    Event::default().json_data(tick).unwrap_or_else(|e| {
        warn!("Failed to encode price tick: {}", e);
        Event::default().data(format!("{{\"price\":{}}}", fallback_price))
    })
}

/// GET /api/price
async fn price_stream(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let subscription = state.price_feed.subscribe().map_err(|e| {
        error!("Failed to open price stream: {}", e);
        e
    })?;
    debug!("Streaming prices on {}", subscription.id());

    let fallback_price = state.config.price.base_price;
    let stream = futures_util::stream::unfold(subscription, move |mut sub| async move {
        let tick = sub.recv().await;
        tick.map(|tick| (Ok::<Event, Infallible>(price_event(tick, fallback_price)), sub))
    });

    let keep_alive = KeepAlive::new()
        .interval(KEEP_ALIVE_INTERVAL)
        .text("keep-alive");
    Ok(Sse::new(stream).keep_alive(keep_alive))
}
