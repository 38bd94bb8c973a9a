//! Risk analysis module.
//!
//! Monte Carlo simulation of terminal prices under GBM, with probability of
//! profit, VaR/CVaR and break-even probability reports.

pub mod monte_carlo;

pub use monte_carlo::{
    linspace, BreakevenAnalysis, MonteCarloConfig, MonteCarloEngine, Percentiles,
    ProfitAnalysis, SimulationError, StrategyRisk, StrikeAnalysis, VarAnalysis,
};
