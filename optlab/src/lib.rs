pub mod analytics;
pub mod backtest;
pub mod config;
pub mod data;
pub mod metrics;
pub mod pricing;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use data::{Greeks, Limit, MarketDataProvider, MarketSnapshot, OptionType, PriceBar};
pub use pricing::{MarketParams, OptionContract, PricingError};
pub use strategy::{Leg, Side, Strategy, StrategyError, StrategyKind, StrategyTemplate};
pub use risk::{MonteCarloConfig, MonteCarloEngine, ProfitAnalysis, SimulationError};
pub use backtest::{BacktestConfig, BacktestError, BacktestOutcome, BacktestReport, Backtester, Trade};
pub use metrics::{MetricsCalculator, PerformanceMetrics};
pub use config::{ConfigError, RunConfig};
