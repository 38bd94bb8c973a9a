//! Historical volatility estimation.
//!
//! Annualized volatility is the sample standard deviation of daily log
//! returns times √252. The rolling series feeds the backtester; the
//! multi-window table is a reporting aid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{stats, TRADING_DAYS_PER_YEAR};

/// Fewest closes accepted for a single volatility estimate.
pub const MIN_OBSERVATIONS: usize = 30;

/// Windows (in trading days) reported by [`volatility_table`].
pub const TABLE_WINDOWS: [usize; 5] = [30, 60, 90, 180, 252];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolatilityError {
    #[error("Insufficient data: need {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Window must be at least 2, got {0}")]
    InvalidWindow(usize),
}

/// Daily log returns `ln(p_i / p_{i-1})`. One element shorter than `prices`.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Annualize a daily standard deviation.
pub fn annualize(daily_std: f64) -> f64 {
    daily_std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized volatility over the last `window` returns (or every return
/// when fewer are available). Needs at least [`MIN_OBSERVATIONS`] closes.
pub fn historical_volatility(prices: &[f64], window: usize) -> Result<f64, VolatilityError> {
    if window < 2 {
        return Err(VolatilityError::InvalidWindow(window));
    }
    if prices.len() < MIN_OBSERVATIONS {
        return Err(VolatilityError::InsufficientData {
            required: MIN_OBSERVATIONS,
            available: prices.len(),
        });
    }

    let returns = log_returns(prices);
    let start = returns.len().saturating_sub(window);
    Ok(annualize(stats::std_sample(&returns[start..])))
}

/// Rolling annualized volatility aligned with `prices`.
///
/// Entry `i` uses the `window` returns ending at close `i`, so the first
/// `window` entries are `None`.
pub fn rolling_volatility(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let returns = log_returns(prices);
    let mut out = vec![None; prices.len()];
    if window < 2 {
        return out;
    }

    for (i, slot) in out.iter_mut().enumerate().skip(window) {
        // returns[j] is the move into close j + 1
        let slice = &returns[i - window..i];
        let vol = annualize(stats::std_sample(slice));
        if vol.is_finite() {
            *slot = Some(vol);
        }
    }
    out
}

/// One row of the volatility table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowVolatility {
    pub window: usize,
    /// `None` when the series is shorter than the window.
    pub volatility: Option<f64>,
}

/// Volatility over each of [`TABLE_WINDOWS`].
pub fn volatility_table(prices: &[f64]) -> Vec<WindowVolatility> {
    TABLE_WINDOWS
        .iter()
        .map(|&window| WindowVolatility {
            window,
            volatility: if prices.len() > window {
                historical_volatility(prices, window).ok()
            } else {
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Alternating +1% / -1% moves.
    fn zigzag(n: usize) -> Vec<f64> {
        let mut prices = vec![100.0];
        for i in 1..n {
            let last = prices[i - 1];
            prices.push(if i % 2 == 1 { last * 1.01 } else { last / 1.01 });
        }
        prices
    }

    #[test]
    fn test_log_returns() {
        let r = log_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], (1.1_f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(r[1], (0.9_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 * 1.001_f64.powi(i)).collect();
        let vol = historical_volatility(&prices, 30).unwrap();
        assert!(vol.abs() < 1e-10);
    }

    #[test]
    fn test_historical_volatility_of_zigzag() {
        let prices = zigzag(61);
        let vol = historical_volatility(&prices, 60).unwrap();
        // Returns are ±ln(1.01), 30 of each: sample std = ln(1.01)·√(60/59)
        let expected = (1.01_f64).ln() * (60.0_f64 / 59.0).sqrt() * 252.0_f64.sqrt();
        assert_relative_eq!(vol, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_historical_volatility_needs_history() {
        let err = historical_volatility(&zigzag(10), 5).unwrap_err();
        assert_eq!(
            err,
            VolatilityError::InsufficientData {
                required: 30,
                available: 10
            }
        );
        assert!(matches!(
            historical_volatility(&zigzag(40), 1),
            Err(VolatilityError::InvalidWindow(1))
        ));
    }

    #[test]
    fn test_rolling_alignment() {
        let prices = zigzag(40);
        let rolling = rolling_volatility(&prices, 30);
        assert_eq!(rolling.len(), 40);
        assert!(rolling[..30].iter().all(Option::is_none));
        assert!(rolling[30..].iter().all(Option::is_some));

        // Last rolling value equals the trailing-window estimate.
        let last = rolling[39].unwrap();
        assert_relative_eq!(last, historical_volatility(&prices, 30).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_table_windows() {
        let table = volatility_table(&zigzag(100));
        let windows: Vec<usize> = table.iter().map(|w| w.window).collect();
        assert_eq!(windows, TABLE_WINDOWS.to_vec());
        assert!(table[0].volatility.is_some());
        assert!(table[2].volatility.is_some());
        assert!(table[3].volatility.is_none());
        assert!(table[4].volatility.is_none());
    }
}
