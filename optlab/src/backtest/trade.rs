//! Closed trade record produced by the backtester.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One strategy opened at `entry_date` and evaluated at `exit_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Underlying close at entry.
    pub entry_price: f64,
    /// Underlying close at exit.
    pub exit_price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    /// Debit paid, or credit received for the iron condor.
    pub initial_cost: f64,
    pub profit: f64,
    /// Profit over initial cost, in percent. 0 when the cost is 0.
    pub roi: f64,
    /// Volatility used to price the strategy at entry.
    pub volatility: f64,
    /// Calendar days between entry and exit.
    pub holding_days: i64,
}

impl Trade {
    pub fn new(
        entry_date: NaiveDate,
        exit_date: NaiveDate,
        entry_price: f64,
        exit_price: f64,
        initial_cost: f64,
        profit: f64,
        volatility: f64,
    ) -> Self {
        let price_change = exit_price - entry_price;
        Self {
            entry_date,
            exit_date,
            entry_price,
            exit_price,
            price_change,
            price_change_pct: price_change / entry_price * 100.0,
            initial_cost,
            profit,
            roi: if initial_cost == 0.0 {
                0.0
            } else {
                profit / initial_cost * 100.0
            },
            volatility,
            holding_days: (exit_date - entry_date).num_days(),
        }
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}
