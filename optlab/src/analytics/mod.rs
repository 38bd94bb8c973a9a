//! Options analytics module.
//!
//! Provides:
//! - Historical volatility (single window, rolling, multi-window table)
//! - Greeks sensitivity sweeps, expiry profit tables and heatmaps

pub mod sensitivity;
pub mod volatility;

pub use sensitivity::{
    default_profit_heatmap, greeks_sensitivity, profit_heatmap, profit_table, spot_sweep,
    time_sweep, volatility_sweep, GreeksSensitivity, ProfitHeatmap, ProfitRow, SensitivityPoint,
};
pub use volatility::{
    historical_volatility, log_returns, rolling_volatility, volatility_table, VolatilityError,
    WindowVolatility,
};
