//! Monte Carlo risk engine.
//!
//! Terminal prices follow geometric Brownian motion under the risk-neutral
//! drift:
//!
//! ```text
//! ln(S_T / S) = (r - σ²/2)·T + σ·√T·Z,   Z ~ N(0, 1)
//! ```
//!
//! The engine only needs a profit function `Fn(f64) -> f64`; strategies plug
//! in through [`Strategy::profit_at_expiry`]. Every call draws a fresh sample
//! from its own RNG, seeded when a seed is configured and from OS entropy
//! otherwise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::data::Limit;
use crate::metrics::stats;
use crate::strategy::{Strategy, StrategyError};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Confidence level must be in (0, 1), got {0}")]
    InvalidConfidence(f64),

    #[error("Number of simulations must be positive")]
    EmptySample,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

fn default_num_simulations() -> usize {
    10_000
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_num_steps() -> usize {
    252
}

/// Monte Carlo run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Fixed seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Steps per simulated path.
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_simulations: default_num_simulations(),
            confidence_level: default_confidence_level(),
            seed: None,
            num_steps: default_num_steps(),
        }
    }
}

impl MonteCarloConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, SimulationError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_simulations(mut self, num_simulations: usize) -> Self {
        self.num_simulations = num_simulations;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.num_simulations == 0 {
            return Err(SimulationError::EmptySample);
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(SimulationError::InvalidConfidence(self.confidence_level));
        }
        if self.num_steps == 0 {
            return Err(SimulationError::InvalidConfig(
                "num_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Profit distribution percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    #[serde(rename = "5th")]
    pub p5: f64,
    #[serde(rename = "25th")]
    pub p25: f64,
    #[serde(rename = "50th")]
    pub p50: f64,
    #[serde(rename = "75th")]
    pub p75: f64,
    #[serde(rename = "95th")]
    pub p95: f64,
}

impl Percentiles {
    fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p5: stats::percentile_sorted(sorted, 5.0),
            p25: stats::percentile_sorted(sorted, 25.0),
            p50: stats::percentile_sorted(sorted, 50.0),
            p75: stats::percentile_sorted(sorted, 75.0),
            p95: stats::percentile_sorted(sorted, 95.0),
        }
    }
}

/// Result of [`MonteCarloEngine::probability_of_profit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAnalysis {
    pub probability_of_profit: f64,
    pub probability_of_loss: f64,
    pub expected_profit: f64,
    pub median_profit: f64,
    /// Population standard deviation of simulated profit.
    pub std_profit: f64,
    pub percentiles: Percentiles,
    /// Mean of the positive outcomes (0 if none).
    pub expected_gain: f64,
    /// Mean of the negative outcomes (0 if none).
    pub expected_loss: f64,
    /// `|expected_gain / expected_loss|`, unbounded when nothing loses.
    pub risk_reward_ratio: Limit,
    pub max_simulated_profit: f64,
    pub max_simulated_loss: f64,
    pub num_simulations: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub simulated_prices: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub simulated_payoffs: Vec<f64>,
}

impl ProfitAnalysis {
    /// Drop the raw samples, keeping the statistics.
    pub fn without_samples(mut self) -> Self {
        self.simulated_prices = Vec::new();
        self.simulated_payoffs = Vec::new();
        self
    }
}

/// Value-at-Risk and Conditional VaR of the profit distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarAnalysis {
    pub confidence_level: f64,
    /// `(1 - confidence)` percentile of simulated profit. Negative for a loss.
    pub value_at_risk: f64,
    /// Mean profit of the outcomes at or below the VaR.
    pub conditional_var: f64,
    pub num_simulations: usize,
}

impl VarAnalysis {
    pub fn interpretation(&self) -> String {
        format!(
            "With {:.1}% confidence, the loss will not exceed ${:.2}",
            self.confidence_level * 100.0,
            self.value_at_risk.abs()
        )
    }
}

/// Probability mass of terminal prices relative to two break-even points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakevenAnalysis {
    pub prob_below_lower_be: f64,
    pub prob_above_upper_be: f64,
    pub prob_between_be: f64,
    /// Below lower plus above upper.
    pub prob_profitable: f64,
    pub lower_break_even: f64,
    pub upper_break_even: f64,
}

/// One row of [`MonteCarloEngine::optimal_strike_analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeAnalysis {
    pub strike: f64,
    pub probability_of_profit: f64,
    pub expected_profit: f64,
    pub risk_reward_ratio: Limit,
}

/// Full Monte Carlo risk picture of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRisk {
    pub profit: ProfitAnalysis,
    pub value_at_risk: VarAnalysis,
    pub breakeven: BreakevenAnalysis,
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// GBM simulator for one underlying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloEngine {
    spot: f64,
    volatility: f64,
    rate: f64,
    seed: Option<u64>,
}

impl MonteCarloEngine {
    /// Spot and volatility must be positive; the rate must be finite.
    pub fn new(spot: f64, volatility: f64, rate: f64) -> Result<Self, SimulationError> {
        if !(spot > 0.0) || !spot.is_finite() {
            return Err(SimulationError::InvalidParameter {
                name: "spot",
                value: spot,
            });
        }
        if !(volatility > 0.0) || !volatility.is_finite() {
            return Err(SimulationError::InvalidParameter {
                name: "volatility",
                value: volatility,
            });
        }
        if !rate.is_finite() {
            return Err(SimulationError::InvalidParameter {
                name: "rate",
                value: rate,
            });
        }
        Ok(Self {
            spot,
            volatility,
            rate,
            seed: None,
        })
    }

    /// Engine over a strategy's underlying, volatility and rate.
    pub fn for_strategy(strategy: &Strategy) -> Result<Self, SimulationError> {
        let market = strategy.market();
        Self::new(market.spot, market.volatility, market.rate)
    }

    /// Seed every subsequent call's RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn check_inputs(time_to_expiry: f64, num_simulations: usize) -> Result<(), SimulationError> {
        if !(time_to_expiry > 0.0) || !time_to_expiry.is_finite() {
            return Err(SimulationError::InvalidParameter {
                name: "time_to_expiry",
                value: time_to_expiry,
            });
        }
        if num_simulations == 0 {
            return Err(SimulationError::EmptySample);
        }
        Ok(())
    }

    /// `num_simulations` independent terminal prices at `time_to_expiry`.
    pub fn simulate_final_prices(
        &self,
        time_to_expiry: f64,
        num_simulations: usize,
    ) -> Result<Vec<f64>, SimulationError> {
        Self::check_inputs(time_to_expiry, num_simulations)?;

        let drift = (self.rate - 0.5 * self.volatility.powi(2)) * time_to_expiry;
        let diffusion = self.volatility * time_to_expiry.sqrt();
        let mut rng = self.rng();

        let prices = (0..num_simulations)
            .map(|_| {
                let z: f64 = rng.sample(StandardNormal);
                self.spot * (drift + diffusion * z).exp()
            })
            .collect();

        debug!(
            "Simulated {} terminal prices at T = {:.4}",
            num_simulations, time_to_expiry
        );
        Ok(prices)
    }

    /// Full price paths, one `Vec` of `num_steps` prices per simulation.
    /// The first element is the price after one step, not the spot.
    pub fn simulate_price_paths(
        &self,
        time_to_expiry: f64,
        num_simulations: usize,
        num_steps: usize,
    ) -> Result<Vec<Vec<f64>>, SimulationError> {
        Self::check_inputs(time_to_expiry, num_simulations)?;
        if num_steps == 0 {
            return Err(SimulationError::InvalidConfig(
                "num_steps must be positive".to_string(),
            ));
        }

        let dt = time_to_expiry / num_steps as f64;
        let drift = (self.rate - 0.5 * self.volatility.powi(2)) * dt;
        let diffusion = self.volatility * dt.sqrt();
        let mut rng = self.rng();

        let paths: Vec<Vec<f64>> = (0..num_simulations)
            .map(|_| {
                let mut log_price = 0.0;
                (0..num_steps)
                    .map(|_| {
                        let z: f64 = rng.sample(StandardNormal);
                        log_price += drift + diffusion * z;
                        self.spot * log_price.exp()
                    })
                    .collect()
            })
            .collect();

        Ok(paths)
    }

    /// Price paths sized by `config` (`num_simulations` × `num_steps`).
    pub fn simulate_config_paths(
        &self,
        time_to_expiry: f64,
        config: &MonteCarloConfig,
    ) -> Result<Vec<Vec<f64>>, SimulationError> {
        config.validate()?;
        self.with_seed_opt(config.seed.or(self.seed)).simulate_price_paths(
            time_to_expiry,
            config.num_simulations,
            config.num_steps,
        )
    }

    /// Probability of profit and distribution statistics of `profit_fn(S_T)`.
    pub fn probability_of_profit<F>(
        &self,
        profit_fn: F,
        time_to_expiry: f64,
        num_simulations: usize,
    ) -> Result<ProfitAnalysis, SimulationError>
    where
        F: Fn(f64) -> f64,
    {
        let prices = self.simulate_final_prices(time_to_expiry, num_simulations)?;
        let payoffs: Vec<f64> = prices.iter().map(|&p| profit_fn(p)).collect();
        let sorted = stats::sorted(&payoffs);

        let probability_of_profit = stats::fraction_where(&payoffs, |p| p > 0.0);
        let expected_gain = stats::mean_where(&payoffs, |p| p > 0.0);
        let expected_loss = stats::mean_where(&payoffs, |p| p < 0.0);
        let risk_reward_ratio = if expected_loss == 0.0 {
            Limit::Unbounded
        } else {
            Limit::Finite((expected_gain / expected_loss).abs())
        };

        let analysis = ProfitAnalysis {
            probability_of_profit,
            probability_of_loss: 1.0 - probability_of_profit,
            expected_profit: stats::mean(&payoffs),
            median_profit: stats::percentile_sorted(&sorted, 50.0),
            std_profit: stats::std_population(&payoffs),
            percentiles: Percentiles::from_sorted(&sorted),
            expected_gain,
            expected_loss,
            risk_reward_ratio,
            max_simulated_profit: sorted.last().copied().unwrap_or(0.0),
            max_simulated_loss: sorted.first().copied().unwrap_or(0.0),
            num_simulations,
            simulated_prices: prices,
            simulated_payoffs: payoffs,
        };

        debug!(
            "Probability of profit {:.4}, expected profit {:.4}",
            analysis.probability_of_profit, analysis.expected_profit
        );
        Ok(analysis)
    }

    /// VaR at `confidence_level` and the CVaR beyond it.
    pub fn value_at_risk<F>(
        &self,
        profit_fn: F,
        time_to_expiry: f64,
        confidence_level: f64,
        num_simulations: usize,
    ) -> Result<VarAnalysis, SimulationError>
    where
        F: Fn(f64) -> f64,
    {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(SimulationError::InvalidConfidence(confidence_level));
        }

        let prices = self.simulate_final_prices(time_to_expiry, num_simulations)?;
        let payoffs: Vec<f64> = prices.iter().map(|&p| profit_fn(p)).collect();

        let var = stats::percentile(&payoffs, (1.0 - confidence_level) * 100.0);
        let cvar = stats::mean_where(&payoffs, |p| p <= var);

        Ok(VarAnalysis {
            confidence_level,
            value_at_risk: var,
            conditional_var: cvar,
            num_simulations,
        })
    }

    /// Share of terminal prices below, above and between two break-evens.
    pub fn breakeven_probability_analysis(
        &self,
        break_even_points: (f64, f64),
        time_to_expiry: f64,
        num_simulations: usize,
    ) -> Result<BreakevenAnalysis, SimulationError> {
        let (lower, upper) = break_even_points;
        let prices = self.simulate_final_prices(time_to_expiry, num_simulations)?;

        let below = stats::fraction_where(&prices, |p| p < lower);
        let above = stats::fraction_where(&prices, |p| p > upper);

        Ok(BreakevenAnalysis {
            prob_below_lower_be: below,
            prob_above_upper_be: above,
            prob_between_be: 1.0 - below - above,
            prob_profitable: below + above,
            lower_break_even: lower,
            upper_break_even: upper,
        })
    }

    /// Evaluate a strategy built at each strike of a grid.
    ///
    /// `build` maps a strike to a strategy; any construction error aborts the
    /// sweep.
    pub fn optimal_strike_analysis<B>(
        &self,
        build: B,
        time_to_expiry: f64,
        strikes: &[f64],
        num_simulations: usize,
    ) -> Result<Vec<StrikeAnalysis>, SimulationError>
    where
        B: Fn(f64) -> Result<Strategy, StrategyError>,
    {
        strikes
            .iter()
            .map(|&strike| -> Result<StrikeAnalysis, SimulationError> {
                let strategy = build(strike)?;
                let analysis = self.probability_of_profit(
                    |s| strategy.profit_at_expiry(s),
                    time_to_expiry,
                    num_simulations,
                )?;
                Ok(StrikeAnalysis {
                    strike,
                    probability_of_profit: analysis.probability_of_profit,
                    expected_profit: analysis.expected_profit,
                    risk_reward_ratio: analysis.risk_reward_ratio,
                })
            })
            .collect()
    }

    /// Profit, VaR and break-even analyses of a strategy held to expiry.
    ///
    /// A seed in `config` takes precedence over the engine's own seed.
    pub fn analyze_strategy(
        &self,
        strategy: &Strategy,
        config: &MonteCarloConfig,
    ) -> Result<StrategyRisk, SimulationError> {
        config.validate()?;
        let engine = self.with_seed_opt(config.seed.or(self.seed));
        let t = strategy.time_to_expiry();
        let n = config.num_simulations;

        let profit = engine
            .probability_of_profit(|s| strategy.profit_at_expiry(s), t, n)?
            .without_samples();
        let value_at_risk = engine.value_at_risk(
            |s| strategy.profit_at_expiry(s),
            t,
            config.confidence_level,
            n,
        )?;
        let breakeven =
            engine.breakeven_probability_analysis(strategy.break_even_points(), t, n)?;

        Ok(StrategyRisk {
            profit,
            value_at_risk,
            breakeven,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::MarketParams;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const T30: f64 = 30.0 / 365.0;

    fn engine() -> MonteCarloEngine {
        MonteCarloEngine::new(100.0, 0.25, 0.05).unwrap().with_seed(42)
    }

    fn straddle() -> Strategy {
        Strategy::atm_straddle(&MarketParams::new(100.0, T30, 0.05, 0.25)).unwrap()
    }

    #[test]
    fn test_invalid_engine_inputs() {
        assert!(MonteCarloEngine::new(0.0, 0.2, 0.05).is_err());
        assert!(MonteCarloEngine::new(100.0, -0.2, 0.05).is_err());
        assert!(MonteCarloEngine::new(100.0, 0.2, f64::NAN).is_err());
        assert!(matches!(
            engine().simulate_final_prices(0.0, 10),
            Err(SimulationError::InvalidParameter { name: "time_to_expiry", .. })
        ));
        assert!(matches!(
            engine().simulate_final_prices(T30, 0),
            Err(SimulationError::EmptySample)
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = engine().simulate_final_prices(T30, 100).unwrap();
        let b = engine().simulate_final_prices(T30, 100).unwrap();
        assert_eq!(a, b);

        let c = engine().with_seed(7).simulate_final_prices(T30, 100).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_terminal_mean_matches_forward() {
        let prices = engine().simulate_final_prices(1.0, 50_000).unwrap();
        assert!(prices.iter().all(|p| *p > 0.0));
        let forward = 100.0 * 0.05_f64.exp();
        assert_relative_eq!(stats::mean(&prices), forward, max_relative = 0.01);
    }

    #[test]
    fn test_price_paths_shape() {
        let paths = engine().simulate_price_paths(0.5, 20, 126).unwrap();
        assert_eq!(paths.len(), 20);
        assert!(paths.iter().all(|p| p.len() == 126));
        assert!(paths.iter().flatten().all(|p| *p > 0.0));
        assert!(engine().simulate_price_paths(0.5, 20, 0).is_err());
    }

    #[test]
    fn test_config_paths_follow_config() {
        let config = MonteCarloConfig {
            num_simulations: 15,
            num_steps: 21,
            seed: Some(4),
            ..MonteCarloConfig::default()
        };
        let unseeded = MonteCarloEngine::new(100.0, 0.25, 0.05).unwrap();
        let paths = unseeded.simulate_config_paths(0.25, &config).unwrap();
        assert_eq!(paths.len(), 15);
        assert!(paths.iter().all(|p| p.len() == 21));
        assert_eq!(paths, unseeded.simulate_config_paths(0.25, &config).unwrap());

        let bad = MonteCarloConfig {
            num_steps: 0,
            ..config
        };
        assert!(matches!(
            unseeded.simulate_config_paths(0.25, &bad),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_straddle_probability_of_profit_below_half() {
        let strategy = straddle();
        let analysis = engine()
            .probability_of_profit(|s| strategy.profit_at_expiry(s), T30, 20_000)
            .unwrap();

        assert!(analysis.probability_of_profit < 0.47);
        assert_abs_diff_eq!(
            analysis.probability_of_profit + analysis.probability_of_loss,
            1.0,
            epsilon = 1e-12
        );
        assert!(analysis.percentiles.p5 <= analysis.percentiles.p25);
        assert!(analysis.percentiles.p25 <= analysis.percentiles.p50);
        assert!(analysis.percentiles.p50 <= analysis.percentiles.p75);
        assert!(analysis.percentiles.p75 <= analysis.percentiles.p95);
        assert_eq!(analysis.median_profit, analysis.percentiles.p50);
        assert!(analysis.max_simulated_loss >= -strategy.price() - 1e-9);
        assert!(analysis.expected_gain > 0.0);
        assert!(analysis.expected_loss < 0.0);
        assert!(!analysis.risk_reward_ratio.is_unbounded());
        assert_eq!(analysis.simulated_payoffs.len(), 20_000);
    }

    #[test]
    fn test_percentile_keys_are_fixed_strings() {
        let analysis = engine()
            .probability_of_profit(|s| s - 100.0, T30, 1_000)
            .unwrap()
            .without_samples();
        let json = serde_json::to_value(&analysis).unwrap();
        for key in ["5th", "25th", "50th", "75th", "95th"] {
            assert!(json["percentiles"][key].is_number(), "missing {key}");
        }
        assert!(json.get("simulated_prices").is_none());
    }

    #[test]
    fn test_risk_reward_unbounded_without_losses() {
        let analysis = engine().probability_of_profit(|_| 1.0, T30, 500).unwrap();
        assert_eq!(analysis.probability_of_profit, 1.0);
        assert_eq!(analysis.expected_loss, 0.0);
        assert!(analysis.risk_reward_ratio.is_unbounded());
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["risk_reward_ratio"], "Unlimited");
    }

    #[test]
    fn test_value_at_risk() {
        let strategy = straddle();
        let var = engine()
            .value_at_risk(|s| strategy.profit_at_expiry(s), T30, 0.95, 10_000)
            .unwrap();
        assert!(var.value_at_risk < 0.0);
        assert!(var.value_at_risk >= -strategy.price() - 1e-9);
        assert!(var.conditional_var <= var.value_at_risk);
        assert!(var.interpretation().contains("95.0%"));

        for bad in [0.0, 1.0, 1.5, f64::NAN] {
            assert!(matches!(
                engine().value_at_risk(|s| s, T30, bad, 10),
                Err(SimulationError::InvalidConfidence(_))
            ));
        }
    }

    #[test]
    fn test_breakeven_analysis_matches_probability_of_profit() {
        let strategy = straddle();
        let be = engine()
            .breakeven_probability_analysis(strategy.break_even_points(), T30, 20_000)
            .unwrap();
        assert_abs_diff_eq!(
            be.prob_below_lower_be + be.prob_above_upper_be + be.prob_between_be,
            1.0,
            epsilon = 1e-12
        );

        // Same seed, same sample: outside the break-evens is exactly a profit.
        let pop = engine()
            .probability_of_profit(|s| strategy.profit_at_expiry(s), T30, 20_000)
            .unwrap();
        assert_abs_diff_eq!(be.prob_profitable, pop.probability_of_profit, epsilon = 1e-3);
    }

    #[test]
    fn test_iron_condor_mostly_profitable() {
        let market = MarketParams::new(100.0, T30, 0.05, 0.25);
        let condor = Strategy::iron_condor_from_offsets(&market, 0.10, 0.05, 0.05).unwrap();
        let analysis = MonteCarloEngine::for_strategy(&condor)
            .unwrap()
            .with_seed(1)
            .probability_of_profit(|s| condor.profit_at_expiry(s), T30, 20_000)
            .unwrap();
        assert!(analysis.probability_of_profit > 0.6);
        assert!(analysis.max_simulated_profit <= condor.net_credit() + 1e-9);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(90.0, 110.0, 5), vec![90.0, 95.0, 100.0, 105.0, 110.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_optimal_strike_analysis() {
        let market = MarketParams::new(100.0, T30, 0.05, 0.25);
        let strikes = linspace(90.0, 110.0, 5);
        let rows = engine()
            .optimal_strike_analysis(|k| Strategy::straddle_at(&market, k), T30, &strikes, 2_000)
            .unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].strike, 100.0);
        assert!(rows.iter().all(|r| (0.0..=1.0).contains(&r.probability_of_profit)));

        let err = engine().optimal_strike_analysis(
            |k| Strategy::straddle_at(&market, k),
            T30,
            &[-1.0],
            10,
        );
        assert!(matches!(err, Err(SimulationError::Strategy(_))));
    }

    #[test]
    fn test_config_from_toml() {
        let config = MonteCarloConfig::from_toml_str("num_simulations = 500\nseed = 9").unwrap();
        assert_eq!(config.num_simulations, 500);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.num_steps, 252);

        assert!(matches!(
            MonteCarloConfig::from_toml_str("confidence_level = 1.2"),
            Err(SimulationError::InvalidConfidence(_))
        ));
        assert!(matches!(
            MonteCarloConfig::from_toml_str("num_simulations = \"many\""),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_analyze_strategy() {
        let strategy = straddle();
        let config = MonteCarloConfig::default().with_simulations(2_000).with_seed(3);
        let risk = MonteCarloEngine::for_strategy(&strategy)
            .unwrap()
            .with_seed_opt(config.seed)
            .analyze_strategy(&strategy, &config)
            .unwrap();
        assert_eq!(risk.profit.num_simulations, 2_000);
        assert!(risk.profit.simulated_prices.is_empty());
        assert_eq!(risk.breakeven.lower_break_even, strategy.break_even_points().0);
    }

    #[test]
    fn test_analyze_strategy_uses_config_seed() {
        let strategy = straddle();
        let unseeded = MonteCarloEngine::for_strategy(&strategy).unwrap();
        let config = MonteCarloConfig::default().with_simulations(2_000).with_seed(7);

        let first = unseeded.analyze_strategy(&strategy, &config).unwrap();
        let second = unseeded.analyze_strategy(&strategy, &config).unwrap();
        assert_eq!(first, second);

        // Config seed wins over the engine's seed.
        let reseeded = unseeded
            .with_seed(99)
            .analyze_strategy(&strategy, &config)
            .unwrap();
        assert_eq!(first, reseeded);
    }
}
