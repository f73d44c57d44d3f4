use serde::{Deserialize, Serialize};

/// A single price event pushed over the price stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub price: f64,
}

/// Point-in-time view of the process-wide market state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Most recently generated price.
    pub last_price: f64,
    /// Trend scalar in [-1, 1].
    pub trend: f64,
    /// Total value of all buys ever settled.
    pub total_buy_value: f64,
    /// Total proceeds of all sells ever settled.
    pub total_sell_value: f64,
    /// House cut accumulated across all users.
    pub global_house_profit: f64,
}

impl MarketSnapshot {
    /// Fresh market at the given price with zeroed aggregates.
    pub fn new(base_price: f64) -> Self {
        Self {
            last_price: base_price,
            trend: 0.0,
            total_buy_value: 0.0,
            total_sell_value: 0.0,
            global_house_profit: 0.0,
        }
    }

    /// Net buy minus sell value.
    pub fn net_trade_value(&self) -> f64 {
        self.total_buy_value - self.total_sell_value
    }
}

/// Market statistics returned by `GET /api/market`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    #[serde(flatten)]
    pub market: MarketSnapshot,
    /// Number of price streams currently open.
    pub active_streams: usize,
}
