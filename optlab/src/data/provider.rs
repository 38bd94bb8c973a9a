//! Market data collaborator contract.
//!
//! Pricing and backtesting never fetch data themselves. They take either
//! explicit numbers or something implementing [`MarketDataProvider`]. The
//! in-memory implementation backs tests and the command-line binary.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use super::types::{MarketSnapshot, PriceBar};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("No data for {ticker} between {start} and {end}")]
    NoData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Source of spot, volatility, rate and historical closes.
pub trait MarketDataProvider {
    /// Current spot price, annualized volatility and risk-free rate.
    fn market_data(&self, ticker: &str) -> Result<MarketSnapshot, DataError>;

    /// Daily closes in `[start, end]`, ascending by date. Gaps (weekends,
    /// holidays) are expected.
    fn historical_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError>;
}

/// Provider backed by data already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    snapshots: HashMap<String, MarketSnapshot>,
    history: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the current market inputs for a ticker.
    pub fn with_snapshot(mut self, ticker: &str, snapshot: MarketSnapshot) -> Self {
        self.snapshots.insert(ticker.to_uppercase(), snapshot);
        self
    }

    /// Register a price history for a ticker. Bars are sorted by date.
    pub fn with_history(mut self, ticker: &str, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.history.insert(ticker.to_uppercase(), bars);
        self
    }
}

impl MarketDataProvider for InMemoryMarketData {
    fn market_data(&self, ticker: &str) -> Result<MarketSnapshot, DataError> {
        let snapshot = self
            .snapshots
            .get(&ticker.to_uppercase())
            .copied()
            .ok_or_else(|| DataError::UnknownTicker(ticker.to_string()))?;

        if !(snapshot.spot_price > 0.0) || !(snapshot.volatility > 0.0) {
            return Err(DataError::InvalidData(format!(
                "{}: spot {} and volatility {} must be positive",
                ticker, snapshot.spot_price, snapshot.volatility
            )));
        }

        Ok(snapshot)
    }

    fn historical_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let bars = self
            .history
            .get(&ticker.to_uppercase())
            .ok_or_else(|| DataError::UnknownTicker(ticker.to_string()))?;

        let selected: Vec<PriceBar> = bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .copied()
            .collect();

        if selected.is_empty() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
                start,
                end,
            });
        }

        Ok(selected)
    }
}
