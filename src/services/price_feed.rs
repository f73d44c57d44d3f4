//! Price Feed
//!
//! A single market ticker advances the price once per tick interval and
//! publishes it to every subscriber through a watch channel. The ticker is
//! started by the first subscription and runs until the feed is dropped.
//!
//! A subscription yields the current price as soon as it is opened and then
//! every published price. A slow subscriber skips to the latest price instead
//! of queueing. Dropping the [`PriceSubscription`] unregisters it.

use crate::services::PriceGenerator;
use crate::types::PriceTick;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

/// Price feed errors.
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("Tick interval must be greater than zero")]
    InvalidTickInterval,
}

/// Registry entry for an open stream.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub connected_at: DateTime<Utc>,
}

/// Manages the market ticker and price stream subscriptions.
pub struct PriceFeed {
    generator: Arc<PriceGenerator>,
    tick_interval: Duration,
    /// Latest published price.
    latest: Arc<watch::Sender<PriceTick>>,
    market_ticker: OnceLock<JoinHandle<()>>,
    /// Open streams keyed by subscription ID.
    streams: Arc<DashMap<Uuid, StreamInfo>>,
}

impl PriceFeed {
    pub fn new(generator: Arc<PriceGenerator>, tick_interval: Duration) -> Arc<Self> {
        let (latest, _) = watch::channel(PriceTick {
            price: generator.current_price(),
        });

        Arc::new(Self {
            generator,
            tick_interval,
            latest: Arc::new(latest),
            market_ticker: OnceLock::new(),
            streams: Arc::new(DashMap::new()),
        })
    }

    /// Number of open streams.
    pub fn active_subscriptions(&self) -> usize {
        self.streams.len()
    }

    /// Open a subscription, starting the market ticker if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Result<PriceSubscription, FeedError> {
        if self.tick_interval.is_zero() {
            return Err(FeedError::InvalidTickInterval);
        }

        self.market_ticker.get_or_init(|| {
            info!("Starting market ticker every {:?}", self.tick_interval);
            tokio::spawn(run_market_ticker(
                self.generator.clone(),
                self.tick_interval,
                self.latest.clone(),
            ))
        });

        let id = Uuid::new_v4();
        self.streams.insert(
            id,
            StreamInfo {
                connected_at: Utc::now(),
            },
        );

        info!("Price stream {} opened ({} active)", id, self.streams.len());

        Ok(PriceSubscription {
            id,
            rx: self.latest.subscribe(),
            started: false,
            streams: self.streams.clone(),
        })
    }
}

impl Drop for PriceFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.market_ticker.get() {
            handle.abort();
        }
    }
}

async fn run_market_ticker(
    generator: Arc<PriceGenerator>,
    period: Duration,
    latest: Arc<watch::Sender<PriceTick>>,
) {
    // Subscribers already hold the current price, so the first step is one
    // period out.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let tick = PriceTick {
            price: generator.next_price(),
        };
        latest.send_replace(tick);
    }
}

/// A live price stream.
pub struct PriceSubscription {
    id: Uuid,
    rx: watch::Receiver<PriceTick>,
    started: bool,
    streams: Arc<DashMap<Uuid, StreamInfo>>,
}

impl PriceSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The current price on the first call, then wait for the next published
    /// one. `None` once the feed has shut down.
    pub async fn recv(&mut self) -> Option<PriceTick> {
        if !self.started {
            self.started = true;
        } else {
            self.rx.changed().await.ok()?;
        }
        let tick = *self.rx.borrow_and_update();
        Some(tick)
    }
}

impl Drop for PriceSubscription {
    fn drop(&mut self) {
        let Some((_, info)) = self.streams.remove(&self.id) else {
            return;
        };
        let open_for = Utc::now() - info.connected_at;
        info!(
            "Price stream {} closed after {}s ({} active)",
            self.id,
            open_for.num_seconds(),
            self.streams.len()
        );
    }
}
