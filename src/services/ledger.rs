//! Ledger Store
//!
//! In-memory user ledgers keyed by user identifier, plus trade settlement:
//! - Buys debit the wallet and blend the new lot into the average cost
//! - Sells credit proceeds minus the house cut on positive profit
//! - Every settled trade feeds the market buy/sell aggregates
//!
//! Settlement for one user runs while holding that user's map entry, so
//! concurrent requests for the same user are serialized. Lock order is
//! ledger entry first, then market. Both are updated under the two guards,
//! after every check has passed.

use crate::config::LedgerConfig;
use crate::services::MarketState;
use crate::types::{LedgerEntry, LedgerSnapshot, MarketSnapshot, TradeRecord, TradeSide};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Ledger errors. All of them are caller mistakes and leave state untouched.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Mobile number is required")]
    MissingUser,

    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u64, held: u64 },

    #[error("Position too large: holding {held}, buying {quantity}")]
    PositionOverflow { held: u64, quantity: u64 },

    #[error("Trade value out of range: {quantity} @ {price}")]
    ValueOutOfRange { quantity: u64, price: f64 },
}

/// Arithmetic of one settled trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// The record appended to the trade history.
    pub record: TradeRecord,
    /// Cost of a buy or proceeds of a sell.
    pub value: f64,
    /// Cost basis of the shares sold (0 for buys).
    pub cost_basis: f64,
    /// Realized profit (0 for buys).
    pub profit: f64,
    /// Share of profit kept by the house.
    pub house_cut: f64,
    /// Amount credited to the wallet (0 for buys).
    pub credited: f64,
}

/// Result of a successful trade request.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub settlement: Settlement,
    pub snapshot: LedgerSnapshot,
}

fn settle_buy(
    entry: &mut LedgerEntry,
    market: &mut MarketSnapshot,
    quantity: u64,
    price: f64,
    now: DateTime<Utc>,
) -> Result<Settlement, LedgerError> {
    let out_of_range = LedgerError::ValueOutOfRange { quantity, price };

    let cost = quantity as f64 * price;
    if !cost.is_finite() {
        return Err(out_of_range);
    }
    if cost > entry.wallet_balance {
        return Err(LedgerError::InsufficientFunds {
            needed: cost,
            available: entry.wallet_balance,
        });
    }

    let held = entry.position.shares;
    let shares = held
        .checked_add(quantity)
        .ok_or(LedgerError::PositionOverflow { held, quantity })?;
    let avg_price = (entry.position.cost_basis() + cost) / shares as f64;
    let total_buy_value = market.total_buy_value + cost;
    if !avg_price.is_finite() || !total_buy_value.is_finite() {
        return Err(out_of_range);
    }

    entry.position.shares = shares;
    entry.position.avg_price = avg_price;
    entry.wallet_balance -= cost;
    market.total_buy_value = total_buy_value;

    let record = TradeRecord::buy(quantity, price, now);
    entry.trade_history.push(record.clone());

    Ok(Settlement {
        record,
        value: cost,
        cost_basis: 0.0,
        profit: 0.0,
        house_cut: 0.0,
        credited: 0.0,
    })
}

fn settle_sell(
    entry: &mut LedgerEntry,
    market: &mut MarketSnapshot,
    quantity: u64,
    price: f64,
    house_cut_pct: f64,
    now: DateTime<Utc>,
) -> Result<Settlement, LedgerError> {
    let held = entry.position.shares;
    if quantity > held {
        return Err(LedgerError::InsufficientShares {
            requested: quantity,
            held,
        });
    }

    let proceeds = quantity as f64 * price;
    let cost_basis = quantity as f64 * entry.position.avg_price;
    let profit = proceeds - cost_basis;
    let house_cut = if profit > 0.0 { profit * house_cut_pct } else { 0.0 };
    let credited = proceeds - house_cut;

    let wallet_balance = entry.wallet_balance + credited;
    let total_sell_value = market.total_sell_value + proceeds;
    let global_house_profit = market.global_house_profit + house_cut;
    let values = [proceeds, cost_basis, credited, wallet_balance, total_sell_value, global_house_profit];
    if !values.iter().all(|v| v.is_finite()) {
        return Err(LedgerError::ValueOutOfRange { quantity, price });
    }

    let position = &mut entry.position;
    position.shares -= quantity;
    if position.is_flat() {
        position.avg_price = 0.0;
    }
    entry.wallet_balance = wallet_balance;
    market.total_sell_value = total_sell_value;
    market.global_house_profit = global_house_profit;

    let record = TradeRecord::sell(quantity, price, profit, now);
    entry.trade_history.push(record.clone());

    Ok(Settlement {
        record,
        value: proceeds,
        cost_basis,
        profit,
        house_cut,
        credited,
    })
}

/// In-memory ledger store.
pub struct LedgerStore {
    /// Ledger entries (user_id -> entry)
    entries: DashMap<String, LedgerEntry>,
    /// Shared market aggregates
    market: Arc<MarketState>,
    config: LedgerConfig,
}

impl LedgerStore {
    pub fn new(config: LedgerConfig, market: Arc<MarketState>) -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            market,
            config,
        })
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn new_entry(&self, user_id: &str) -> LedgerEntry {
        debug!("Creating ledger entry for {}", user_id);
        LedgerEntry::new(self.config.starting_balance)
    }

    /// Get a copy of the user's entry, creating it on first access.
    pub fn get_or_create(&self, user_id: &str) -> LedgerEntry {
        self.entries
            .entry(user_id.to_string())
            .or_insert_with(|| self.new_entry(user_id))
            .clone()
    }

    /// Entry plus the global house profit, creating the entry if needed.
    pub fn snapshot(&self, user_id: &str) -> LedgerSnapshot {
        let entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| self.new_entry(user_id));
        LedgerSnapshot::new(entry.clone(), self.market.global_house_profit())
    }

    /// Validate and apply a trade for a user.
    ///
    /// The trade price is taken as given. Trades whose values would leave
    /// the representable range are rejected like any other invalid trade.
    pub fn settle_trade(
        &self,
        user_id: &str,
        side: TradeSide,
        quantity: u64,
        price: f64,
    ) -> Result<TradeOutcome, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(LedgerError::InvalidPrice(price));
        }

        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| self.new_entry(user_id));

        let now = Utc::now();
        let house_cut_pct = self.config.house_cut_pct;
        let result = self.market.update(|market| -> Result<(Settlement, f64), LedgerError> {
            let settlement = match side {
                TradeSide::Buy => settle_buy(&mut entry, market, quantity, price, now),
                TradeSide::Sell => {
                    settle_sell(&mut entry, market, quantity, price, house_cut_pct, now)
                }
            }?;
            Ok((settlement, market.global_house_profit))
        });

        let (settlement, global_house_profit) = match result {
            Ok(settled) => settled,
            Err(e) => {
                warn!("Rejected {} of {} @ {} for {}: {}", side, quantity, price, user_id, e);
                return Err(e);
            }
        };

        info!(
            "Settled {} of {} @ {} for {} (profit {:.2}, house cut {:.2}, balance {:.2})",
            side, quantity, price, user_id, settlement.profit, settlement.house_cut, entry.wallet_balance
        );

        let snapshot = LedgerSnapshot::new(entry.clone(), global_house_profit);
        Ok(TradeOutcome { settlement, snapshot })
    }
}
