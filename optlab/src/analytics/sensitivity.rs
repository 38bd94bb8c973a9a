//! Strategy sensitivity sweeps and profit grids.
//!
//! Each sweep reprices the strategy with one input moved and everything else
//! held fixed (strikes included).

use serde::{Deserialize, Serialize};

use crate::data::Greeks;
use crate::pricing::{MarketParams, DAYS_PER_YEAR};
use crate::risk::linspace;
use crate::strategy::{Strategy, StrategyError};

/// Holding horizons (calendar days) on the heatmap's rows.
pub const HEATMAP_DAYS: [u32; 7] = [7, 14, 21, 30, 45, 60, 90];

/// Underlying moves on the heatmap's columns, in percent.
pub fn heatmap_moves() -> Vec<f64> {
    (-30..=30).step_by(5).map(f64::from).collect()
}

/// Strategy price and Greeks at one value of the swept input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// Value of the swept input (volatility, days or spot).
    pub value: f64,
    pub price: f64,
    pub greeks: Greeks,
}

impl SensitivityPoint {
    fn of(value: f64, strategy: &Strategy) -> Self {
        Self {
            value,
            price: strategy.price(),
            greeks: strategy.greeks(),
        }
    }
}

/// Volatility from 50% to 150% of the current level.
pub fn volatility_sweep(
    strategy: &Strategy,
    num_points: usize,
) -> Result<Vec<SensitivityPoint>, StrategyError> {
    let sigma = strategy.market().volatility;
    linspace(sigma * 0.5, sigma * 1.5, num_points)
        .into_iter()
        .map(|vol| -> Result<SensitivityPoint, StrategyError> {
            Ok(SensitivityPoint::of(vol, &strategy.with_volatility(vol)?))
        })
        .collect()
}

/// Days to expiry from 1 to `max_days`, at most `num_points` samples.
pub fn time_sweep(
    strategy: &Strategy,
    max_days: u32,
    num_points: usize,
) -> Result<Vec<SensitivityPoint>, StrategyError> {
    let max_days = max_days.max(1);
    let n = num_points.min(max_days as usize);
    let mut days: Vec<u32> = linspace(1.0, f64::from(max_days), n)
        .into_iter()
        .map(|d| d.round() as u32)
        .collect();
    days.dedup();

    days.into_iter()
        .map(|d| -> Result<SensitivityPoint, StrategyError> {
            let repriced = strategy.with_time_to_expiry(f64::from(d) / DAYS_PER_YEAR)?;
            Ok(SensitivityPoint::of(f64::from(d), &repriced))
        })
        .collect()
}

/// Spot from 80% to 120% of the current level.
pub fn spot_sweep(
    strategy: &Strategy,
    num_points: usize,
) -> Result<Vec<SensitivityPoint>, StrategyError> {
    let spot = strategy.spot();
    linspace(spot * 0.8, spot * 1.2, num_points)
        .into_iter()
        .map(|s| -> Result<SensitivityPoint, StrategyError> {
            Ok(SensitivityPoint::of(s, &strategy.with_spot(s)?))
        })
        .collect()
}

/// All three sweeps together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksSensitivity {
    pub volatility: Vec<SensitivityPoint>,
    pub time: Vec<SensitivityPoint>,
    pub spot: Vec<SensitivityPoint>,
}

/// 20 volatility points, up to 20 time points, 30 spot points.
pub fn greeks_sensitivity(strategy: &Strategy) -> Result<GreeksSensitivity, StrategyError> {
    let days = (strategy.time_to_expiry() * DAYS_PER_YEAR).round().max(1.0) as u32;
    Ok(GreeksSensitivity {
        volatility: volatility_sweep(strategy, 20)?,
        time: time_sweep(strategy, days, 20)?,
        spot: spot_sweep(strategy, 30)?,
    })
}

/// Profit at expiry after a given move of the underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitRow {
    pub move_pct: f64,
    pub terminal_price: f64,
    pub payoff: f64,
    pub profit: f64,
    /// Profit relative to the absolute premium, in percent.
    pub roi: f64,
}

pub fn profit_table(strategy: &Strategy, moves_pct: &[f64]) -> Vec<ProfitRow> {
    let spot = strategy.spot();
    let premium = strategy.price().abs();

    moves_pct
        .iter()
        .map(|&pct| {
            let terminal_price = spot * (1.0 + pct / 100.0);
            let profit = strategy.profit_at_expiry(terminal_price);
            ProfitRow {
                move_pct: pct,
                terminal_price,
                payoff: strategy.payoff_at_expiry(terminal_price),
                profit,
                roi: if premium == 0.0 { 0.0 } else { profit / premium * 100.0 },
            }
        })
        .collect()
}

/// Profit at expiry over horizon × move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitHeatmap {
    pub days: Vec<u32>,
    pub moves_pct: Vec<f64>,
    /// `profit[row][col]` for `days[row]` and `moves_pct[col]`.
    pub profit: Vec<Vec<f64>>,
}

/// Each row prices the strategy with `days / 365` to expiry, then evaluates
/// profit at expiry across the moves.
pub fn profit_heatmap(
    strategy: &Strategy,
    days: &[u32],
    moves_pct: &[f64],
) -> Result<ProfitHeatmap, StrategyError> {
    let spot = strategy.spot();
    let profit = days
        .iter()
        .map(|&d| -> Result<Vec<f64>, StrategyError> {
            let repriced = strategy.with_time_to_expiry(MarketParams::years_from_days(d))?;
            Ok(moves_pct
                .iter()
                .map(|pct| repriced.profit_at_expiry(spot * (1.0 + pct / 100.0)))
                .collect())
        })
        .collect::<Result<Vec<Vec<f64>>, StrategyError>>()?;

    Ok(ProfitHeatmap {
        days: days.to_vec(),
        moves_pct: moves_pct.to_vec(),
        profit,
    })
}

/// Heatmap over [`HEATMAP_DAYS`] and -30%..=+30% in 5% steps.
pub fn default_profit_heatmap(strategy: &Strategy) -> Result<ProfitHeatmap, StrategyError> {
    profit_heatmap(strategy, &HEATMAP_DAYS, &heatmap_moves())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn straddle() -> Strategy {
        Strategy::atm_straddle(&MarketParams::new(100.0, 30.0 / 365.0, 0.05, 0.25)).unwrap()
    }

    #[test]
    fn test_volatility_sweep_is_increasing_for_long_straddle() {
        let points = volatility_sweep(&straddle(), 20).unwrap();
        assert_eq!(points.len(), 20);
        assert_abs_diff_eq!(points[0].value, 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(points[19].value, 0.375, epsilon = 1e-12);
        assert!(points.windows(2).all(|w| w[1].price > w[0].price));
        assert!(points.iter().all(|p| p.greeks.vega > 0.0));
    }

    #[test]
    fn test_time_sweep() {
        let points = time_sweep(&straddle(), 30, 20).unwrap();
        assert_eq!(points.first().unwrap().value, 1.0);
        assert_eq!(points.last().unwrap().value, 30.0);
        assert!(points.len() <= 20);
        assert!(points.windows(2).all(|w| w[1].price > w[0].price));

        // Fewer days than points: one point per day.
        assert_eq!(time_sweep(&straddle(), 5, 20).unwrap().len(), 5);
    }

    #[test]
    fn test_spot_sweep_keeps_strike() {
        let strategy = straddle();
        let points = spot_sweep(&strategy, 30).unwrap();
        assert_eq!(points.len(), 30);
        assert_abs_diff_eq!(points[0].value, 80.0, epsilon = 1e-12);
        assert_abs_diff_eq!(points[29].value, 120.0, epsilon = 1e-12);
        // Deep ITM on either side: delta tends to ∓1 / ±1.
        assert!(points[0].greeks.delta < -0.5);
        assert!(points[29].greeks.delta > 0.5);
        assert_eq!(strategy.with_spot(90.0).unwrap().legs()[0].strike(), 100.0);
    }

    #[test]
    fn test_greeks_sensitivity_bundle() {
        let bundle = greeks_sensitivity(&straddle()).unwrap();
        assert_eq!(bundle.volatility.len(), 20);
        assert_eq!(bundle.spot.len(), 30);
        assert!(!bundle.time.is_empty());
    }

    #[test]
    fn test_profit_table() {
        let strategy = straddle();
        let rows = profit_table(&strategy, &[-10.0, 0.0, 10.0]);
        assert_abs_diff_eq!(rows[1].profit, -strategy.price(), epsilon = 1e-12);
        assert_abs_diff_eq!(rows[1].roi, -100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rows[2].terminal_price, 110.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rows[2].payoff, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_default_heatmap_shape() {
        let heatmap = default_profit_heatmap(&straddle()).unwrap();
        assert_eq!(heatmap.days, HEATMAP_DAYS.to_vec());
        assert_eq!(heatmap.moves_pct.len(), 13);
        assert_eq!(heatmap.moves_pct[0], -30.0);
        assert_eq!(heatmap.moves_pct[12], 30.0);
        assert_eq!(heatmap.profit.len(), 7);
        assert!(heatmap.profit.iter().all(|row| row.len() == 13));

        // Longer horizons cost more, so an unchanged price loses more.
        let flat = 6;
        assert!(heatmap.profit[6][flat] < heatmap.profit[0][flat]);
    }
}
