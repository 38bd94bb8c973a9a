//! Historical backtesting engine.
//!
//! Replays a strategy template over a daily close series:
//! 1. Compute rolling historical volatility
//! 2. Step through the series every `rebalance_frequency_days` observations
//! 3. Snap the exit to the first close on or after entry + holding period
//! 4. Price the strategy at entry with that day's volatility
//! 5. Record profit at expiry evaluated at the exit close
//! 6. Aggregate the trades into performance metrics
//!
//! Step 5 treats the exit close as the expiry price even when the holding
//! period is shorter than the option's life.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::rolling_volatility;
use crate::data::{DataError, MarketDataProvider, PriceBar};
use crate::metrics::{MetricsCalculator, PerformanceMetrics};
use crate::pricing::MarketParams;
use crate::strategy::{StrategyKind, StrategyTemplate};

use super::trade::Trade;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Insufficient historical data: need {required} observations, have {available}")]
    InsufficientHistoricalData { required: usize, available: usize },

    #[error("No valid trades found")]
    NoValidTrades,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    MarketData(#[from] DataError),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Configuration for backtest execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Calendar days between entry and exit. Also the option's time to expiry.
    pub holding_period_days: u32,

    /// Observations between successive entries.
    pub rebalance_frequency_days: u32,

    /// Returns per rolling volatility estimate.
    pub volatility_window: usize,

    /// Fewest closes accepted.
    pub min_history: usize,

    /// Used when the rolling estimate is missing or non-positive.
    pub default_volatility: f64,

    pub risk_free_rate: f64,

    pub dividend_yield: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            holding_period_days: 30,
            rebalance_frequency_days: 30,
            volatility_window: 30,
            min_history: 30,
            default_volatility: 0.30,
            risk_free_rate: 0.05,
            dividend_yield: 0.0,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, BacktestError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_holding_period(mut self, days: u32) -> Self {
        self.holding_period_days = days;
        self
    }

    pub fn with_rebalance_frequency(mut self, days: u32) -> Self {
        self.rebalance_frequency_days = days;
        self
    }

    /// Observations required before a backtest can run.
    pub fn required_history(&self) -> usize {
        self.min_history.max(self.volatility_window)
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.holding_period_days == 0 {
            return Err(BacktestError::InvalidConfig(
                "holding_period_days must be positive".to_string(),
            ));
        }
        if self.rebalance_frequency_days == 0 {
            return Err(BacktestError::InvalidConfig(
                "rebalance_frequency_days must be positive".to_string(),
            ));
        }
        if self.volatility_window < 2 {
            return Err(BacktestError::InvalidConfig(format!(
                "volatility_window must be at least 2, got {}",
                self.volatility_window
            )));
        }
        if !(self.default_volatility > 0.0) || !self.default_volatility.is_finite() {
            return Err(BacktestError::InvalidConfig(format!(
                "default_volatility must be positive, got {}",
                self.default_volatility
            )));
        }
        if !self.risk_free_rate.is_finite() || !self.dividend_yield.is_finite() {
            return Err(BacktestError::InvalidConfig(
                "risk_free_rate and dividend_yield must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a successful backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub ticker: String,
    pub strategy: String,
    pub kind: StrategyKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub holding_period_days: u32,
    pub rebalance_frequency_days: u32,
    /// Entries whose strategy could not be built.
    pub skipped_trades: usize,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
}

impl BacktestReport {
    pub fn summary(&self) -> String {
        format!(
            "Backtest Results: {} {} ({} to {})\n\
             ----------------------------------------\n\
             Holding: {} days, rebalance every {} days\n\
             \n\
             {}",
            self.ticker,
            self.strategy,
            self.start_date,
            self.end_date,
            self.holding_period_days,
            self.rebalance_frequency_days,
            self.metrics.summary(),
        )
    }
}

/// Success or failure of a backtest run.
///
/// A run with no trades is an expected outcome of the chosen parameters, so
/// it is reported here rather than as an `Err`.
#[derive(Debug)]
pub enum BacktestOutcome {
    Success(BacktestReport),
    Failure(BacktestError),
}

impl BacktestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn report(&self) -> Option<&BacktestReport> {
        match self {
            Self::Success(report) => Some(report),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BacktestError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<BacktestReport, BacktestError> {
        match self {
            Self::Success(report) => Ok(report),
            Self::Failure(err) => Err(err),
        }
    }
}

impl From<Result<BacktestReport, BacktestError>> for BacktestOutcome {
    fn from(result: Result<BacktestReport, BacktestError>) -> Self {
        match result {
            Ok(report) => Self::Success(report),
            Err(err) => Self::Failure(err),
        }
    }
}

impl Serialize for BacktestOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Succeeded<'a> {
            success: bool,
            #[serde(flatten)]
            report: &'a BacktestReport,
        }

        #[derive(Serialize)]
        struct Failed {
            success: bool,
            error: String,
        }

        match self {
            Self::Success(report) => Succeeded {
                success: true,
                report,
            }
            .serialize(serializer),
            Self::Failure(err) => Failed {
                success: false,
                error: err.to_string(),
            }
            .serialize(serializer),
        }
    }
}

/// One row of [`Backtester::compare_strategies`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategy: String,
    pub template: StrategyTemplate,
    pub win_rate: f64,
    pub total_profit: f64,
    pub avg_profit: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

/// One row of [`Backtester::optimal_holding_period`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingPeriodResult {
    pub holding_period: u32,
    pub total_trades: usize,
    pub total_profit: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
}

/// Backtester over one underlying's close series.
#[derive(Debug, Clone)]
pub struct Backtester {
    ticker: String,
    prices: Vec<PriceBar>,
    config: BacktestConfig,
    volatility: Vec<Option<f64>>,
}

impl Backtester {
    /// Create a backtester over a price series.
    ///
    /// Bars are sorted by date. Fails when the series is shorter than
    /// `max(min_history, volatility_window)`.
    pub fn new(
        ticker: impl Into<String>,
        mut prices: Vec<PriceBar>,
        config: BacktestConfig,
    ) -> Result<Self, BacktestError> {
        config.validate()?;

        prices.sort_by_key(|b| b.date);
        prices.dedup_by_key(|b| b.date);

        let required = config.required_history();
        if prices.len() < required {
            return Err(BacktestError::InsufficientHistoricalData {
                required,
                available: prices.len(),
            });
        }

        if let Some(bad) = prices.iter().find(|b| !(b.close > 0.0) || !b.close.is_finite()) {
            return Err(BacktestError::MarketData(DataError::InvalidData(format!(
                "close on {} must be positive, got {}",
                bad.date, bad.close
            ))));
        }

        let closes: Vec<f64> = prices.iter().map(|b| b.close).collect();
        let volatility = rolling_volatility(&closes, config.volatility_window);

        Ok(Self {
            ticker: ticker.into(),
            prices,
            config,
            volatility,
        })
    }

    /// Fetch `[start, end]` closes from the market-data collaborator.
    pub fn from_provider<P: MarketDataProvider + ?Sized>(
        provider: &P,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        config: BacktestConfig,
    ) -> Result<Self, BacktestError> {
        let prices = provider.historical_prices(ticker, start, end)?;
        Self::new(ticker, prices, config)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn prices(&self) -> &[PriceBar] {
        &self.prices
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Rolling annualized volatility aligned with [`Backtester::prices`].
    pub fn rolling_volatility(&self) -> &[Option<f64>] {
        &self.volatility
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.prices.first().map(|b| b.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.prices.last().map(|b| b.date)
    }

    /// Volatility used for an entry at `idx`.
    fn entry_volatility(&self, idx: usize) -> f64 {
        match self.volatility.get(idx).copied().flatten() {
            Some(vol) if vol > 0.0 => vol,
            _ => {
                warn!(
                    "No usable volatility on {}, using default {:.2}",
                    self.prices[idx].date, self.config.default_volatility
                );
                self.config.default_volatility
            }
        }
    }

    /// Index of the first bar on or after `target`.
    fn first_on_or_after(&self, target: NaiveDate) -> Option<usize> {
        let idx = self.prices.partition_point(|b| b.date < target);
        (idx < self.prices.len()).then_some(idx)
    }

    /// Run the configured holding period and rebalance frequency.
    pub fn run(&self, template: &StrategyTemplate) -> BacktestOutcome {
        self.run_with(
            template,
            self.config.holding_period_days,
            self.config.rebalance_frequency_days,
        )
    }

    /// Run with explicit holding period and rebalance frequency.
    pub fn run_with(
        &self,
        template: &StrategyTemplate,
        holding_period_days: u32,
        rebalance_frequency_days: u32,
    ) -> BacktestOutcome {
        self.simulate(template, holding_period_days, rebalance_frequency_days)
            .into()
    }

    fn simulate(
        &self,
        template: &StrategyTemplate,
        holding_period_days: u32,
        rebalance_frequency_days: u32,
    ) -> Result<BacktestReport, BacktestError> {
        if holding_period_days == 0 || rebalance_frequency_days == 0 {
            return Err(BacktestError::InvalidConfig(
                "holding period and rebalance frequency must be positive".to_string(),
            ));
        }

        let time_to_expiry = MarketParams::years_from_days(holding_period_days);
        let mut trades = Vec::new();
        let mut skipped = 0;

        for entry_idx in (0..self.prices.len()).step_by(rebalance_frequency_days as usize) {
            let entry = self.prices[entry_idx];

            let exit_idx = match entry
                .date
                .checked_add_days(Days::new(u64::from(holding_period_days)))
                .and_then(|target| self.first_on_or_after(target))
            {
                Some(idx) => idx,
                None => break,
            };
            let exit = self.prices[exit_idx];

            let volatility = self.entry_volatility(entry_idx);
            let market = MarketParams::new(
                entry.close,
                time_to_expiry,
                self.config.risk_free_rate,
                volatility,
            )
            .with_dividend_yield(self.config.dividend_yield);

            let strategy = match template.build(&market) {
                Ok(strategy) => strategy,
                Err(e) => {
                    warn!("Skipping trade on {}: {}", entry.date, e);
                    skipped += 1;
                    continue;
                }
            };

            let initial_cost = strategy.price();
            let profit = strategy.profit_at_expiry(exit.close);
            let trade = Trade::new(
                entry.date,
                exit.date,
                entry.close,
                exit.close,
                initial_cost,
                profit,
                volatility,
            );

            debug!(
                "Trade {} -> {}: {:.2} -> {:.2}, cost {:.4}, profit {:.4}",
                trade.entry_date,
                trade.exit_date,
                trade.entry_price,
                trade.exit_price,
                trade.initial_cost,
                trade.profit
            );
            trades.push(trade);
        }

        if trades.is_empty() {
            warn!(
                "Backtest {} {}: no valid trades ({} skipped)",
                self.ticker,
                template.kind(),
                skipped
            );
            return Err(BacktestError::NoValidTrades);
        }

        let metrics = MetricsCalculator::calculate(&trades, rebalance_frequency_days);
        info!(
            "Backtest {} {}: {} trades, total profit {:.2}, win rate {:.1}%",
            self.ticker,
            template.kind(),
            metrics.total_trades,
            metrics.total_profit,
            metrics.win_rate
        );

        Ok(BacktestReport {
            ticker: self.ticker.clone(),
            strategy: template.kind().name().to_string(),
            kind: template.kind(),
            start_date: self.prices[0].date,
            end_date: self.prices[self.prices.len() - 1].date,
            holding_period_days,
            rebalance_frequency_days,
            skipped_trades: skipped,
            metrics,
            trades,
        })
    }

    /// Run several templates over the same series. Failed runs are dropped.
    pub fn compare_strategies(&self, templates: &[StrategyTemplate]) -> Vec<StrategyComparison> {
        templates
            .iter()
            .filter_map(|template| {
                let report = self.run(template).into_result().ok()?;
                Some(StrategyComparison {
                    strategy: report.strategy,
                    template: template.clone(),
                    win_rate: report.metrics.win_rate,
                    total_profit: report.metrics.total_profit,
                    avg_profit: report.metrics.avg_profit_per_trade,
                    profit_factor: report.metrics.profit_factor,
                    sharpe_ratio: report.metrics.sharpe_ratio,
                    max_drawdown: report.metrics.max_drawdown,
                })
            })
            .collect()
    }

    /// Sweep holding periods `min_days..=max_days` by `step`, rebalancing at
    /// the same interval. Failed runs are dropped.
    pub fn optimal_holding_period(
        &self,
        template: &StrategyTemplate,
        min_days: u32,
        max_days: u32,
        step: u32,
    ) -> Result<Vec<HoldingPeriodResult>, BacktestError> {
        if step == 0 || min_days == 0 || min_days > max_days {
            return Err(BacktestError::InvalidConfig(format!(
                "invalid holding period range {}..={} step {}",
                min_days, max_days, step
            )));
        }

        let results = (min_days..=max_days)
            .step_by(step as usize)
            .filter_map(|days| {
                let report = self.run_with(template, days, days).into_result().ok()?;
                Some(HoldingPeriodResult {
                    holding_period: days,
                    total_trades: report.metrics.total_trades,
                    total_profit: report.metrics.total_profit,
                    win_rate: report.metrics.win_rate,
                    sharpe_ratio: report.metrics.sharpe_ratio,
                    profit_factor: report.metrics.profit_factor,
                })
            })
            .collect();

        Ok(results)
    }
}
