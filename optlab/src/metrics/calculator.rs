//! Performance metrics calculator.
//!
//! Aggregates a sequence of closed trades into win/loss statistics, a
//! Sharpe-like ratio and the drawdown of the cumulative P&L curve.

use serde::{Deserialize, Serialize};

use crate::backtest::Trade;

use super::stats;

/// Trading periods per year used to annualize the Sharpe-like ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics of a backtest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Counts
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage of trades with positive profit (0-100).
    pub win_rate: f64,

    // P&L
    pub total_profit: f64,
    pub avg_profit_per_trade: f64,
    pub avg_winning_trade: f64,
    pub avg_losing_trade: f64,
    pub profit_factor: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_roi: f64,

    // Risk
    pub profit_std: f64,
    pub sharpe_ratio: f64,
    /// Most negative excursion of cumulative P&L below its running peak.
    pub max_drawdown: f64,

    pub avg_holding_days: f64,
    /// Cumulative profit after each trade.
    pub equity_curve: Vec<f64>,
}

impl PerformanceMetrics {
    /// Generate a summary report.
    pub fn summary(&self) -> String {
        format!(
            "Performance Summary\n\
             ====================\n\
             \n\
             Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Profit Factor: {:.2}\n\
             \n\
             Total Profit: ${:.2}\n\
             Avg Trade: ${:.2}\n\
             Avg Winner: ${:.2}\n\
             Avg Loser: ${:.2}\n\
             Best Trade: ${:.2}\n\
             Worst Trade: ${:.2}\n\
             \n\
             Max Drawdown: ${:.2}\n\
             Sharpe Ratio: {:.2}\n\
             Avg Days in Trade: {:.1}",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate,
            self.profit_factor,
            self.total_profit,
            self.avg_profit_per_trade,
            self.avg_winning_trade,
            self.avg_losing_trade,
            self.best_trade,
            self.worst_trade,
            self.max_drawdown,
            self.sharpe_ratio,
            self.avg_holding_days,
        )
    }
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate all metrics from a trade sequence.
    ///
    /// `rebalance_frequency_days` annualizes the Sharpe-like ratio: one trade
    /// is opened every that many trading days.
    pub fn calculate(trades: &[Trade], rebalance_frequency_days: u32) -> PerformanceMetrics {
        let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
        let mut metrics = Self::from_profits(&profits, rebalance_frequency_days);

        if !trades.is_empty() {
            let n = trades.len() as f64;
            metrics.avg_roi = trades.iter().map(|t| t.roi).sum::<f64>() / n;
            metrics.avg_holding_days = trades.iter().map(|t| t.holding_days as f64).sum::<f64>() / n;
        }

        metrics
    }

    /// Metrics that depend only on the profit sequence.
    pub fn from_profits(profits: &[f64], rebalance_frequency_days: u32) -> PerformanceMetrics {
        if profits.is_empty() {
            return PerformanceMetrics::default();
        }

        let total_trades = profits.len();
        let winners: Vec<f64> = profits.iter().copied().filter(|p| *p > 0.0).collect();
        let losers: Vec<f64> = profits.iter().copied().filter(|p| *p < 0.0).collect();

        let equity_curve = stats::cumulative_sum(profits);
        let profit_std = stats::std_population(profits);
        let avg_profit = stats::mean(profits);

        PerformanceMetrics {
            total_trades,
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: winners.len() as f64 / total_trades as f64 * 100.0,
            total_profit: profits.iter().sum(),
            avg_profit_per_trade: avg_profit,
            avg_winning_trade: stats::mean(&winners),
            avg_losing_trade: stats::mean(&losers),
            profit_factor: Self::calculate_profit_factor(&winners, &losers),
            best_trade: profits.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst_trade: profits.iter().copied().fold(f64::INFINITY, f64::min),
            avg_roi: 0.0,
            profit_std,
            sharpe_ratio: Self::calculate_sharpe(avg_profit, profit_std, rebalance_frequency_days),
            max_drawdown: stats::max_drawdown(&equity_curve),
            avg_holding_days: 0.0,
            equity_curve,
        }
    }

    /// Gross gains over gross losses. With no losing trades the denominator
    /// is 1, so the result stays finite.
    fn calculate_profit_factor(winners: &[f64], losers: &[f64]) -> f64 {
        let gains: f64 = winners.iter().sum();
        let losses = if losers.is_empty() {
            1.0
        } else {
            losers.iter().sum::<f64>().abs()
        };
        if losses == 0.0 {
            return 0.0;
        }
        gains / losses
    }

    /// Per-trade mean over std, annualized by `sqrt(252 / frequency)`.
    fn calculate_sharpe(mean: f64, std: f64, rebalance_frequency_days: u32) -> f64 {
        if std == 0.0 || rebalance_frequency_days == 0 {
            return 0.0;
        }
        mean / std * (TRADING_DAYS_PER_YEAR / rebalance_frequency_days as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_profit_factor() {
        let pf = MetricsCalculator::calculate_profit_factor(&[10000.0, 5000.0], &[-5000.0]);
        assert_eq!(pf, 3.0);

        // No losers: denominator floors at 1.
        let pf = MetricsCalculator::calculate_profit_factor(&[4.0, 3.0], &[]);
        assert_eq!(pf, 7.0);
    }

    #[test]
    fn test_metrics_from_profits() {
        let profits = [10.0, -5.0, -10.0, 20.0, 0.0];
        let m = MetricsCalculator::from_profits(&profits, 30);

        assert_eq!(m.total_trades, 5);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert_relative_eq!(m.win_rate, 40.0);
        assert_relative_eq!(m.total_profit, 15.0);
        assert_relative_eq!(m.avg_profit_per_trade, 3.0);
        assert_relative_eq!(m.avg_winning_trade, 15.0);
        assert_relative_eq!(m.avg_losing_trade, -7.5);
        assert_relative_eq!(m.profit_factor, 2.0);
        assert_eq!(m.best_trade, 20.0);
        assert_eq!(m.worst_trade, -10.0);
        assert_relative_eq!(m.max_drawdown, -15.0);
        assert_eq!(m.equity_curve, vec![10.0, 5.0, -5.0, 15.0, 15.0]);

        let expected_sharpe = 3.0 / stats::std_population(&profits) * (252.0_f64 / 30.0).sqrt();
        assert_relative_eq!(m.sharpe_ratio, expected_sharpe, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_zero_when_flat() {
        let m = MetricsCalculator::from_profits(&[2.0, 2.0, 2.0], 30);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.win_rate, 100.0);
    }

    #[test]
    fn test_performance_metrics_default() {
        let metrics = MetricsCalculator::from_profits(&[], 30);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert!(metrics.summary().contains("Trades: 0"));
    }
}
