//! Batch statistics over f64 samples.
//!
//! Every function is a single reduction over the whole slice. Empty input
//! yields 0.0 rather than NaN so results stay serializable.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n).
pub fn std_population(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (divides by n - 1).
pub fn std_sample(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Copy of the sample sorted ascending. NaNs sort last.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Percentile of pre-sorted data, `pct` in `[0, 100]`, linearly interpolated
/// between order statistics.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (pct.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Percentile of unsorted data.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    percentile_sorted(&sorted(values), pct)
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Running sum.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Largest peak-to-trough decline of a cumulative P&L curve, as
/// `min(curve - running_max(curve))`. Zero or negative.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut running_max = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in curve {
        running_max = running_max.max(value);
        worst = worst.min(value - running_max);
    }
    worst
}

/// Mean of the values satisfying `pred`, 0.0 when none do.
pub fn mean_where(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| pred(**v))
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Fraction of values satisfying `pred`.
pub fn fraction_where(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| pred(**v)).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data), 5.0);
        assert_relative_eq!(std_population(&data), 2.0);
        assert_relative_eq!(std_sample(&data), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_population(&[]), 0.0);
        assert_eq!(std_sample(&[1.0]), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&data, 0.0), 1.0);
        assert_relative_eq!(percentile(&data, 100.0), 4.0);
        assert_relative_eq!(percentile(&data, 50.0), 2.5);
        assert_relative_eq!(percentile(&data, 25.0), 1.75);
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_drawdown_of_cumulative_pnl() {
        let curve = cumulative_sum(&[10.0, -5.0, -10.0, 20.0, -3.0]);
        assert_eq!(curve, vec![10.0, 5.0, -5.0, 15.0, 12.0]);
        assert_relative_eq!(max_drawdown(&curve), -15.0);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_conditional_means() {
        let data = [-2.0, -1.0, 0.0, 3.0];
        assert_relative_eq!(mean_where(&data, |v| v > 0.0), 3.0);
        assert_relative_eq!(mean_where(&data, |v| v < 0.0), -1.5);
        assert_eq!(mean_where(&data, |v| v > 10.0), 0.0);
        assert_relative_eq!(fraction_where(&data, |v| v > 0.0), 0.25);
    }
}
