//! Run configuration file.
//!
//! One TOML document can carry the backtest settings, the strike rule and the
//! Monte Carlo settings:
//!
//! ```toml
//! [backtest]
//! holding_period_days = 30
//! rebalance_frequency_days = 30
//!
//! [strategy]
//! kind = "iron_condor"
//! center_offset_pct = 0.10
//!
//! [monte_carlo]
//! num_simulations = 10000
//! seed = 42
//! ```
//!
//! Every table is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::backtest::{BacktestConfig, BacktestError};
use crate::risk::{MonteCarloConfig, SimulationError};
use crate::strategy::StrategyTemplate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Complete run configuration loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub strategy: StrategyTemplate,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Monte Carlo settings from the file with command-line overrides
    /// applied on top.
    pub fn monte_carlo_with(
        &self,
        num_simulations: Option<usize>,
        seed: Option<u64>,
    ) -> Result<MonteCarloConfig, ConfigError> {
        let mut config = self.monte_carlo.clone();
        if let Some(n) = num_simulations {
            config.num_simulations = n;
        }
        if seed.is_some() {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        self.monte_carlo.validate()?;
        Ok(())
    }
}
