//! Strategy templates.
//!
//! A template describes a strategy relative to the spot price, so the same
//! template can be re-instantiated at every backtest entry date or loaded from
//! a TOML config file.

use serde::{Deserialize, Serialize};

use crate::pricing::MarketParams;

use super::composite::{Strategy, StrategyError, StrategyKind};

fn default_otm_pct() -> f64 {
    0.05
}

fn default_center_offset_pct() -> f64 {
    0.10
}

fn default_wing_width_pct() -> f64 {
    0.05
}

/// Recipe for building a [`Strategy`] from market inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyTemplate {
    /// Long straddle. Strike defaults to spot.
    Straddle {
        #[serde(default)]
        strike: Option<f64>,
    },
    /// Long strangle with strikes `spot·(1 ± otm_pct)`.
    Strangle {
        #[serde(default = "default_otm_pct")]
        otm_pct: f64,
    },
    /// Short iron condor, short strikes `spot·(1 ± center_offset_pct)`.
    IronCondor {
        #[serde(default = "default_center_offset_pct")]
        center_offset_pct: f64,
        #[serde(default = "default_wing_width_pct")]
        put_spread_width_pct: f64,
        #[serde(default = "default_wing_width_pct")]
        call_spread_width_pct: f64,
    },
}

impl Default for StrategyTemplate {
    fn default() -> Self {
        Self::atm_straddle()
    }
}

impl StrategyTemplate {
    pub fn atm_straddle() -> Self {
        Self::Straddle { strike: None }
    }

    pub fn strangle(otm_pct: f64) -> Self {
        Self::Strangle { otm_pct }
    }

    pub fn iron_condor(
        center_offset_pct: f64,
        put_spread_width_pct: f64,
        call_spread_width_pct: f64,
    ) -> Self {
        Self::IronCondor {
            center_offset_pct,
            put_spread_width_pct,
            call_spread_width_pct,
        }
    }

    /// Iron condor with 10% short strikes and 5% wings.
    pub fn default_iron_condor() -> Self {
        Self::iron_condor(
            default_center_offset_pct(),
            default_wing_width_pct(),
            default_wing_width_pct(),
        )
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Straddle { .. } => StrategyKind::Straddle,
            Self::Strangle { .. } => StrategyKind::Strangle,
            Self::IronCondor { .. } => StrategyKind::IronCondor,
        }
    }

    /// Instantiate the template against concrete market inputs.
    pub fn build(&self, market: &MarketParams) -> Result<Strategy, StrategyError> {
        match *self {
            Self::Straddle { strike } => {
                Strategy::straddle_at(market, strike.unwrap_or(market.spot))
            }
            Self::Strangle { otm_pct } => Strategy::strangle_from_offset(market, otm_pct),
            Self::IronCondor {
                center_offset_pct,
                put_spread_width_pct,
                call_spread_width_pct,
            } => Strategy::iron_condor_from_offsets(
                market,
                center_offset_pct,
                put_spread_width_pct,
                call_spread_width_pct,
            ),
        }
    }
}
