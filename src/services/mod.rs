pub mod ledger;
pub mod market;
pub mod price_feed;
pub mod price_generator;

pub use ledger::{LedgerError, LedgerStore, Settlement, TradeOutcome};
pub use market::MarketState;
pub use price_feed::{FeedError, PriceFeed, PriceSubscription};
pub use price_generator::{PriceDraws, PriceError, PriceGenerator, PriceModel, PriceStep};
