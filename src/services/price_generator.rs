//! Synthetic price generation.
//!
//! Each step blends four terms into the next price:
//! - noise: a uniform draw bounded by `volatility` times the current price
//! - trade pressure: net buy minus sell value over `pressure_scale`
//! - trend: a scalar that random-walks in [-1, 1] and drifts the price
//! - mean reversion: a pull back toward the base price
//!
//! The result is clamped to the configured floor. [`PriceModel`] is pure and
//! takes its random draws as inputs; [`PriceGenerator`] draws them from the
//! thread RNG and commits each step to the shared [`MarketState`].

use crate::config::PriceConfig;
use crate::services::MarketState;
use crate::types::MarketSnapshot;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Price computation errors.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("Price step produced a non-finite value from last price {last_price} and net trade value {net_trade_value}")]
    NonFinite {
        last_price: f64,
        net_trade_value: f64,
    },
}

/// Random inputs for one step, each in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDraws {
    pub noise: f64,
    pub trend: f64,
}

impl PriceDraws {
    /// Draw a fresh pair from the thread RNG.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            noise: rng.gen_range(-1.0..=1.0),
            trend: rng.gen_range(-1.0..=1.0),
        }
    }
}

/// Outcome of one price step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStep {
    pub price: f64,
    pub trend: f64,
}

/// Pure price model.
#[derive(Debug, Clone)]
pub struct PriceModel {
    config: PriceConfig,
}

impl PriceModel {
    pub fn new(config: PriceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PriceConfig {
        &self.config
    }

    /// Compute the next price and trend from a market snapshot.
    pub fn step(&self, market: &MarketSnapshot, draws: PriceDraws) -> Result<PriceStep, PriceError> {
        let cfg = &self.config;
        let last = market.last_price;

        let trend = (market.trend + draws.trend.clamp(-1.0, 1.0) * cfg.trend_step).clamp(-1.0, 1.0);

        let noise = draws.noise.clamp(-1.0, 1.0) * cfg.volatility * last;
        let pressure = if cfg.pressure_scale != 0.0 {
            market.net_trade_value() / cfg.pressure_scale * cfg.pressure_weight
        } else {
            0.0
        };
        let drift = trend * cfg.trend_strength * last;
        let reversion = (cfg.base_price - last) * cfg.mean_reversion;

        let next = last + noise + pressure + drift + reversion;
        if !next.is_finite() || !trend.is_finite() {
            return Err(PriceError::NonFinite {
                last_price: last,
                net_trade_value: market.net_trade_value(),
            });
        }

        Ok(PriceStep {
            price: next.max(cfg.floor()),
            trend,
        })
    }
}

/// Price generator bound to the shared market state.
pub struct PriceGenerator {
    model: PriceModel,
    market: Arc<MarketState>,
}

impl PriceGenerator {
    pub fn new(config: PriceConfig, market: Arc<MarketState>) -> Arc<Self> {
        Arc::new(Self {
            model: PriceModel::new(config),
            market,
        })
    }

    /// Last committed price, without advancing.
    pub fn current_price(&self) -> f64 {
        self.market.last_price()
    }

    /// Advance the market one step with the given draws.
    ///
    /// On error the market state is left untouched.
    pub fn advance(&self, draws: PriceDraws) -> Result<f64, PriceError> {
        self.market.update(|market| -> Result<f64, PriceError> {
            let step = self.model.step(market, draws)?;
            market.last_price = step.price;
            market.trend = step.trend;
            Ok(step.price)
        })
    }

    /// Advance the market with random draws, falling back to the base price
    /// if the step fails.
    pub fn next_price(&self) -> f64 {
        match self.advance(PriceDraws::random()) {
            Ok(price) => {
                debug!("Generated price {:.4}", price);
                price
            }
            Err(e) => {
                let fallback = self.model.config().base_price;
                warn!("Price computation failed, sending base price {}: {}", fallback, e);
                fallback
            }
        }
    }
}
