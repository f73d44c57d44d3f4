use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A settled trade. Never modified after it is appended to a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique trade ID
    pub id: String,
    /// Buy or sell
    #[serde(rename = "type")]
    pub side: TradeSide,
    /// Number of shares
    pub quantity: u64,
    /// Execution price per share
    pub price: f64,
    /// When the trade was settled
    pub timestamp: DateTime<Utc>,
    /// Realized profit (sells only, may be negative)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profit: Option<f64>,
}

impl TradeRecord {
    pub fn buy(quantity: u64, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            side: TradeSide::Buy,
            quantity,
            price,
            timestamp,
            profit: None,
        }
    }

    pub fn sell(quantity: u64, price: f64, profit: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            side: TradeSide::Sell,
            quantity,
            price,
            timestamp,
            profit: Some(profit),
        }
    }
}

/// Share position held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Shares held
    pub shares: u64,
    /// Weighted average cost per share (0 when flat)
    pub avg_price: f64,
}

impl Position {
    /// Cost basis of the whole position.
    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.avg_price
    }

    pub fn is_flat(&self) -> bool {
        self.shares == 0
    }
}

/// A user's wallet, position and trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub wallet_balance: f64,
    #[serde(rename = "portfolio")]
    pub position: Position,
    pub trade_history: Vec<TradeRecord>,
}

impl LedgerEntry {
    /// New entry with the given balance and no position.
    pub fn new(starting_balance: f64) -> Self {
        Self {
            wallet_balance: starting_balance,
            position: Position::default(),
            trade_history: Vec::new(),
        }
    }
}

/// Body of `POST /api/trades`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub quantity: u64,
    pub price: f64,
}

/// Success payload of the trade endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub success: bool,
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub global_house_profit: f64,
}

impl LedgerSnapshot {
    pub fn new(entry: LedgerEntry, global_house_profit: f64) -> Self {
        Self {
            success: true,
            entry,
            global_house_profit,
        }
    }
}
