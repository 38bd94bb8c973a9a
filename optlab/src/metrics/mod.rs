//! Performance metrics module.
//!
//! - Batch sample statistics (mean, std, linear-interpolated percentiles)
//! - Win rate, profit factor, Sharpe-like ratio
//! - Maximum drawdown of cumulative P&L

pub mod calculator;
pub mod stats;

pub use calculator::{MetricsCalculator, PerformanceMetrics, TRADING_DAYS_PER_YEAR};
