//! Market data types and the collaborator contract for fetching them.

pub mod loader;
pub mod provider;
pub mod types;

pub use loader::{load_price_csv, load_price_reader, LoaderError};
pub use provider::{DataError, InMemoryMarketData, MarketDataProvider};
pub use types::{Greeks, Limit, MarketSnapshot, OptionType, PriceBar};
