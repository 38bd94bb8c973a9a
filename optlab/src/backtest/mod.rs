//! Backtesting engine for options strategies.
//!
//! Replays a strategy template over a historical close series at a fixed
//! cadence and aggregates the resulting trades.

pub mod engine;
pub mod trade;

pub use engine::{
    BacktestConfig, BacktestError, BacktestOutcome, BacktestReport, Backtester,
    HoldingPeriodResult, StrategyComparison,
};
pub use trade::Trade;
