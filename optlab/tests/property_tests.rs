//! Property-based tests for pricing and strategy composition.

use proptest::prelude::*;

use optlab::data::Limit;
use optlab::pricing::{MarketParams, OptionContract};
use optlab::strategy::{Strategy, StrategyError};

fn market(spot: f64, days: u32, rate: f64, vol: f64, q: f64) -> MarketParams {
    MarketParams::new(spot, MarketParams::years_from_days(days), rate, vol).with_dividend_yield(q)
}

// --- Put-call parity ---

proptest! {
    /// C - P = S·e^(-qT) - K·e^(-rT) for every valid contract.
    #[test]
    fn put_call_parity_holds(
        spot in 10.0_f64..500.0,
        moneyness in 0.5_f64..1.5,
        days in 1u32..730,
        rate in -0.01_f64..0.10,
        vol in 0.05_f64..1.0,
        q in 0.0_f64..0.05,
    ) {
        let strike = spot * moneyness;
        let t = MarketParams::years_from_days(days);
        let call = OptionContract::call(spot, strike, t, rate, vol, q).unwrap();
        let put = OptionContract::put(spot, strike, t, rate, vol, q).unwrap();

        let lhs = call.price() - put.price();
        let rhs = spot * (-q * t).exp() - strike * (-rate * t).exp();
        prop_assert!((lhs - rhs).abs() < 1e-6, "parity gap {} at S={} K={}", lhs - rhs, spot, strike);
    }
}

// --- Prices and Greeks stay in their bounds ---

proptest! {
    #[test]
    fn prices_and_greeks_are_bounded(
        spot in 10.0_f64..500.0,
        moneyness in 0.5_f64..1.5,
        days in 1u32..730,
        vol in 0.05_f64..1.0,
    ) {
        let strike = spot * moneyness;
        let t = MarketParams::years_from_days(days);
        let call = OptionContract::call(spot, strike, t, 0.05, vol, 0.0).unwrap();
        let put = OptionContract::put(spot, strike, t, 0.05, vol, 0.0).unwrap();

        prop_assert!(call.price() >= -1e-9 && call.price() <= spot + 1e-9);
        prop_assert!(put.price() >= -1e-9 && put.price() <= strike + 1e-9);
        prop_assert!((0.0..=1.0).contains(&call.delta()));
        prop_assert!((-1.0..=0.0).contains(&put.delta()));
        prop_assert!(call.gamma() >= 0.0);
        prop_assert!((call.gamma() - put.gamma()).abs() < 1e-12);
        prop_assert!((call.vega() - put.vega()).abs() < 1e-12);
    }
}

// --- Strategy composition ---

proptest! {
    /// Straddle cost is the sum of its legs and break-evens sit one premium
    /// either side of the strike.
    #[test]
    fn straddle_cost_and_break_even_symmetry(
        spot in 20.0_f64..400.0,
        moneyness in 0.8_f64..1.2,
        days in 1u32..365,
        vol in 0.05_f64..0.9,
    ) {
        let strike = spot * moneyness;
        let m = market(spot, days, 0.05, vol, 0.0);
        let straddle = Strategy::straddle_at(&m, strike).unwrap();
        let call = OptionContract::from_market(optlab::OptionType::Call, strike, &m).unwrap();
        let put = OptionContract::from_market(optlab::OptionType::Put, strike, &m).unwrap();

        let premium = straddle.price();
        prop_assert!((premium - (call.price() + put.price())).abs() < 1e-12);

        let (lower, upper) = straddle.break_even_points();
        prop_assert!((upper - strike - premium).abs() < 1e-9);
        prop_assert!((strike - lower - premium).abs() < 1e-9);
        prop_assert!(straddle.max_profit().is_unbounded());
    }

    /// Strategy Greeks equal the signed sum of leg Greeks.
    #[test]
    fn strategy_greeks_are_signed_leg_sums(
        spot in 20.0_f64..400.0,
        days in 5u32..365,
        vol in 0.05_f64..0.9,
        offset in 0.02_f64..0.3,
        wing in 0.01_f64..0.2,
    ) {
        let m = market(spot, days, 0.03, vol, 0.01);
        for strategy in [
            Strategy::atm_straddle(&m).unwrap(),
            Strategy::strangle_from_offset(&m, offset).unwrap(),
            Strategy::iron_condor_from_offsets(&m, offset, wing, wing).unwrap(),
        ] {
            let total = strategy.greeks();
            let mut expected = optlab::Greeks::default();
            for leg in strategy.legs() {
                expected += leg.contract.greeks() * leg.side.sign();
            }
            prop_assert!((total.delta - expected.delta).abs() < 1e-10);
            prop_assert!((total.gamma - expected.gamma).abs() < 1e-10);
            prop_assert!((total.vega - expected.vega).abs() < 1e-10);
            prop_assert!((total.theta - expected.theta).abs() < 1e-10);
            prop_assert!((total.rho - expected.rho).abs() < 1e-10);
        }
    }

    /// Condor P&L is capped by its credit above and its max loss below.
    #[test]
    fn iron_condor_bounds(
        spot in 20.0_f64..400.0,
        days in 5u32..365,
        vol in 0.05_f64..0.9,
        offset in 0.02_f64..0.3,
        put_wing in 0.01_f64..0.2,
        call_wing in 0.01_f64..0.2,
        terminal_move in -0.9_f64..2.0,
    ) {
        let m = market(spot, days, 0.05, vol, 0.0);
        let condor = Strategy::iron_condor_from_offsets(&m, offset, put_wing, call_wing).unwrap();

        let credit = condor.net_credit();
        let width = spot * put_wing.max(call_wing);
        prop_assert_eq!(condor.max_profit(), Limit::Finite(credit));
        let max_loss = condor.max_loss().value().unwrap();
        prop_assert!((max_loss + (width - credit)).abs() < 1e-9);

        let pnl = condor.profit_at_expiry(spot * (1.0 + terminal_move));
        prop_assert!(pnl <= credit + 1e-9);
        prop_assert!(pnl >= max_loss - 1e-9);
    }

    /// Strangles accept only call strikes above put strikes.
    #[test]
    fn strangle_strike_ordering(
        spot in 20.0_f64..400.0,
        call_pct in 0.7_f64..1.3,
        put_pct in 0.7_f64..1.3,
    ) {
        let m = market(spot, 30, 0.05, 0.3, 0.0);
        let result = Strategy::strangle_from_strikes(&m, spot * call_pct, spot * put_pct);
        if spot * call_pct > spot * put_pct {
            prop_assert!(result.is_ok());
        } else {
            let is_ordering_error = matches!(result, Err(StrategyError::InvalidStrikeOrdering { .. }));
            prop_assert!(is_ordering_error);
        }
    }
}

// --- Invalid inputs ---

proptest! {
    #[test]
    fn non_positive_inputs_are_rejected(
        bad in -100.0_f64..=0.0,
    ) {
        prop_assert!(OptionContract::call(bad, 100.0, 0.5, 0.05, 0.2, 0.0).is_err());
        prop_assert!(OptionContract::call(100.0, bad, 0.5, 0.05, 0.2, 0.0).is_err());
        prop_assert!(OptionContract::call(100.0, 100.0, bad, 0.05, 0.2, 0.0).is_err());
        prop_assert!(OptionContract::call(100.0, 100.0, 0.5, 0.05, bad, 0.0).is_err());
    }
}
