//! Process-wide market state shared by the price generator and the ledger.

use crate::types::MarketSnapshot;
use std::sync::{Arc, Mutex, MutexGuard};

/// Last price, trend and trade aggregates.
///
/// Aggregates only grow. The ledger writes them while settling trades and the
/// price generator reads them on every tick. Both go through `update`.
pub struct MarketState {
    inner: Mutex<MarketSnapshot>,
}

impl MarketState {
    /// Create a market starting at the base price.
    pub fn new(base_price: f64) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(MarketSnapshot::new(base_price)),
        })
    }

    // Plain floats: a poisoned guard still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, MarketSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MarketSnapshot {
        *self.lock()
    }

    pub fn last_price(&self) -> f64 {
        self.lock().last_price
    }

    pub fn global_house_profit(&self) -> f64 {
        self.lock().global_house_profit
    }

    /// Run `f` against the state under a single lock acquisition.
    pub fn update<R>(&self, f: impl FnOnce(&mut MarketSnapshot) -> R) -> R {
        f(&mut *self.lock())
    }
}
