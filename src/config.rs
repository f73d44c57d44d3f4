use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Price simulation configuration.
#[derive(Debug, Clone)]
pub struct PriceConfig {
    /// Starting price and mean-reversion target.
    pub base_price: f64,
    /// Maximum random move per tick as a fraction of the current price.
    pub volatility: f64,
    /// Maximum change of the trend scalar per tick.
    pub trend_step: f64,
    /// Drift per tick at full trend, as a fraction of the current price.
    pub trend_strength: f64,
    /// Fraction of the gap to the base price closed each tick.
    pub mean_reversion: f64,
    /// Net trade value that corresponds to one unit of price.
    pub pressure_scale: f64,
    /// Weight of the trade-pressure term per tick.
    pub pressure_weight: f64,
    /// Absolute price floor.
    pub min_price: f64,
    /// Price floor as a fraction of the base price.
    pub floor_fraction: f64,
    /// Interval between price events (ms).
    pub tick_interval_ms: u64,
}

impl PriceConfig {
    /// Lowest price the generator will ever emit.
    pub fn floor(&self) -> f64 {
        self.min_price.max(self.base_price * self.floor_fraction)
    }

    /// Interval between price events.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            base_price: 100.0,
            volatility: 0.02,
            trend_step: 0.1,
            trend_strength: 0.005,
            mean_reversion: 0.05,
            pressure_scale: 10_000.0,
            // Equal to mean_reversion so the price settles around
            // base + net / pressure_scale.
            pressure_weight: 0.05,
            min_price: 0.01,
            floor_fraction: 0.1,
            tick_interval_ms: 5_000,
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Wallet balance of a freshly created ledger entry.
    pub starting_balance: f64,
    /// Share of positive sell profit kept by the house (0-1).
    pub house_cut_pct: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            house_cut_pct: 0.2,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Price simulation settings.
    pub price: PriceConfig,
    /// Ledger settings.
    pub ledger: LedgerConfig,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let price_defaults = PriceConfig::default();
        let ledger_defaults = LedgerConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            price: PriceConfig {
                base_price: env_or("PRICE_BASE", price_defaults.base_price),
                volatility: env_or("PRICE_VOLATILITY", price_defaults.volatility),
                trend_step: env_or("PRICE_TREND_STEP", price_defaults.trend_step),
                trend_strength: env_or("PRICE_TREND_STRENGTH", price_defaults.trend_strength),
                mean_reversion: env_or("PRICE_MEAN_REVERSION", price_defaults.mean_reversion),
                pressure_scale: env_or("PRICE_PRESSURE_SCALE", price_defaults.pressure_scale),
                pressure_weight: env_or("PRICE_PRESSURE_WEIGHT", price_defaults.pressure_weight),
                min_price: env_or("PRICE_MIN", price_defaults.min_price),
                floor_fraction: env_or("PRICE_FLOOR_FRACTION", price_defaults.floor_fraction),
                tick_interval_ms: env_or("PRICE_TICK_MS", price_defaults.tick_interval_ms),
            },
            ledger: LedgerConfig {
                starting_balance: env_or("STARTING_BALANCE", ledger_defaults.starting_balance),
                house_cut_pct: env_or("HOUSE_CUT_PCT", ledger_defaults.house_cut_pct),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            price: PriceConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}
