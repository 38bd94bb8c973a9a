//! optlab command-line interface.
//!
//! Every subcommand prints a JSON document on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Price one contract
//! optlab price --option-type call --spot 100 --strike 100 --days 30 --volatility 0.25
//!
//! # Analyze a strategy, with a Monte Carlo block
//! optlab strategy --kind iron-condor --spot 100 --volatility 0.25 --simulations 10000
//!
//! # Backtest a strategy over a close series
//! optlab backtest --prices data/spy.csv --config config/run.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use optlab::analytics::{self, GreeksSensitivity, ProfitHeatmap, ProfitRow};
use optlab::backtest::{Backtester, StrategyComparison};
use optlab::data::{load_price_csv, OptionType};
use optlab::pricing::{MarketParams, OptionContract};
use optlab::risk::{MonteCarloConfig, MonteCarloEngine, StrategyRisk};
use optlab::strategy::{StrategySummary, StrategyTemplate};
use optlab::RunConfig;

#[derive(Parser)]
#[command(name = "optlab")]
#[command(about = "Option pricing, strategy analysis, Monte Carlo risk and backtesting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OptionKind {
    Call,
    Put,
}

impl From<OptionKind> for OptionType {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Call => OptionType::Call,
            OptionKind::Put => OptionType::Put,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Straddle,
    Strangle,
    IronCondor,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a single European option
    Price {
        #[arg(long, value_enum, default_value = "call")]
        option_type: OptionKind,

        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Calendar days to expiry
        #[arg(long, default_value_t = 30)]
        days: u32,

        #[arg(long, default_value_t = 0.05)]
        rate: f64,

        /// Annualized volatility (0.25 = 25%)
        #[arg(long)]
        volatility: f64,

        #[arg(long, default_value_t = 0.0)]
        dividend_yield: f64,
    },

    /// Analyze a multi-leg strategy
    Strategy {
        #[arg(long, value_enum, default_value = "straddle")]
        kind: StrategyArg,

        #[arg(long)]
        spot: f64,

        #[arg(long, default_value_t = 30)]
        days: u32,

        #[arg(long, default_value_t = 0.05)]
        rate: f64,

        #[arg(long)]
        volatility: f64,

        #[arg(long, default_value_t = 0.0)]
        dividend_yield: f64,

        /// Straddle strike (defaults to spot)
        #[arg(long)]
        strike: Option<f64>,

        /// Strangle distance from spot (0.05 = 5%)
        #[arg(long, default_value_t = 0.05)]
        otm_pct: f64,

        /// Iron condor short strike distance from spot
        #[arg(long, default_value_t = 0.10)]
        center_offset_pct: f64,

        /// Iron condor wing widths as a fraction of spot
        #[arg(long, default_value_t = 0.05)]
        wing_width_pct: f64,

        /// Run a Monte Carlo analysis with this many simulations
        #[arg(long)]
        simulations: Option<usize>,

        /// Monte Carlo seed
        #[arg(long)]
        seed: Option<u64>,

        /// TOML run configuration; its [monte_carlo] table enables the
        /// Monte Carlo block, with --simulations and --seed overriding it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Include Greeks sensitivity sweeps and the profit heatmap
        #[arg(long)]
        sensitivity: bool,
    },

    /// Backtest a strategy over a CSV close series (date,close)
    Backtest {
        /// Path to the price CSV
        #[arg(short, long)]
        prices: PathBuf,

        /// Path to a TOML run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "UNDERLYING")]
        ticker: String,

        /// Also compare straddle, strangle and iron condor
        #[arg(long)]
        compare: bool,
    },

    /// Historical volatility table of a CSV close series
    Volatility {
        #[arg(short, long)]
        prices: PathBuf,
    },
}

#[derive(Serialize)]
struct PriceOutput {
    option_type: OptionType,
    contract: OptionContract,
    price: f64,
    d1: f64,
    d2: f64,
    greeks: optlab::Greeks,
}

#[derive(Serialize)]
struct StrategyOutput {
    summary: StrategySummary,
    profit_table: Vec<ProfitRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monte_carlo: Option<StrategyRisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<GreeksSensitivity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    heatmap: Option<ProfitHeatmap>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_price(option_type: OptionType, market: MarketParams, strike: f64) -> Result<()> {
    let contract = OptionContract::from_market(option_type, strike, &market)
        .context("Invalid option parameters")?;
    print_json(&PriceOutput {
        option_type,
        contract,
        price: contract.price(),
        d1: contract.d1(),
        d2: contract.d2(),
        greeks: contract.greeks(),
    })
}

fn load_run_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn cmd_strategy(
    template: StrategyTemplate,
    market: MarketParams,
    monte_carlo: Option<MonteCarloConfig>,
    sensitivity: bool,
) -> Result<()> {
    let strategy = template.build(&market).context("Invalid strategy parameters")?;
    let moves: Vec<f64> = analytics::sensitivity::heatmap_moves();

    let monte_carlo = match monte_carlo {
        Some(config) => {
            let engine = MonteCarloEngine::for_strategy(&strategy)?;
            Some(engine.analyze_strategy(&strategy, &config)?)
        }
        None => None,
    };

    let (sensitivity, heatmap) = if sensitivity {
        (
            Some(analytics::greeks_sensitivity(&strategy)?),
            Some(analytics::default_profit_heatmap(&strategy)?),
        )
    } else {
        (None, None)
    };

    print_json(&StrategyOutput {
        summary: strategy.summary(),
        profit_table: analytics::profit_table(&strategy, &moves),
        monte_carlo,
        sensitivity,
        heatmap,
    })
}

fn cmd_backtest(
    prices: PathBuf,
    config: Option<PathBuf>,
    ticker: String,
    compare: bool,
) -> Result<()> {
    let run_config = load_run_config(config.as_ref())?;

    let bars = load_price_csv(&prices)
        .with_context(|| format!("Failed to load prices from {}", prices.display()))?;
    let backtester = Backtester::new(ticker, bars, run_config.backtest.clone())?;

    let outcome = backtester.run(&run_config.strategy);

    if compare {
        let comparison: Vec<StrategyComparison> = backtester.compare_strategies(&[
            StrategyTemplate::atm_straddle(),
            StrategyTemplate::strangle(0.05),
            StrategyTemplate::default_iron_condor(),
        ]);
        print_json(&json!({
            "backtest": outcome,
            "comparison": comparison,
        }))
    } else {
        print_json(&outcome)
    }
}

fn cmd_volatility(prices: PathBuf) -> Result<()> {
    let bars = load_price_csv(&prices)
        .with_context(|| format!("Failed to load prices from {}", prices.display()))?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    print_json(&json!({
        "observations": closes.len(),
        "volatility": analytics::volatility_table(&closes),
    }))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("optlab=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Price {
            option_type,
            spot,
            strike,
            days,
            rate,
            volatility,
            dividend_yield,
        } => {
            let market =
                MarketParams::new(spot, MarketParams::years_from_days(days), rate, volatility)
                    .with_dividend_yield(dividend_yield);
            cmd_price(option_type.into(), market, strike)?;
        }
        Commands::Strategy {
            kind,
            spot,
            days,
            rate,
            volatility,
            dividend_yield,
            strike,
            otm_pct,
            center_offset_pct,
            wing_width_pct,
            simulations,
            seed,
            config,
            sensitivity,
        } => {
            let market =
                MarketParams::new(spot, MarketParams::years_from_days(days), rate, volatility)
                    .with_dividend_yield(dividend_yield);
            let monte_carlo = if config.is_some() || simulations.is_some() {
                let run_config = load_run_config(config.as_ref())?;
                Some(run_config.monte_carlo_with(simulations, seed)?)
            } else {
                None
            };
            let template = match kind {
                StrategyArg::Straddle => StrategyTemplate::Straddle { strike },
                StrategyArg::Strangle => StrategyTemplate::strangle(otm_pct),
                StrategyArg::IronCondor => {
                    StrategyTemplate::iron_condor(center_offset_pct, wing_width_pct, wing_width_pct)
                }
            };
            cmd_strategy(template, market, monte_carlo, sensitivity)?;
        }
        Commands::Backtest {
            prices,
            config,
            ticker,
            compare,
        } => {
            cmd_backtest(prices, config, ticker, compare)?;
        }
        Commands::Volatility { prices } => {
            cmd_volatility(prices)?;
        }
    }

    Ok(())
}
