//! Multi-leg strategies: long straddle, long strangle and short iron condor.
//!
//! A [`Strategy`] is a kind tag plus an ordered list of legs. Every variant
//! shares the same operations (price, payoff, profit, break-even, Greeks);
//! the formulas that differ per variant dispatch on the kind.
//!
//! Leg order is fixed by the kind:
//! - Straddle / Strangle: `[long call, long put]`
//! - Iron condor: `[long put, short put, short call, long call]`
//!
//! Sign convention: bought legs count +1, sold legs -1. `net_debit()` is the
//! signed premium (negative for a credit), and profit at expiry is always
//! `payoff - net_debit`, which covers debit and credit strategies alike.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{DataError, Greeks, Limit, MarketDataProvider, OptionType};
use crate::pricing::{MarketParams, OptionContract, PricingError, DAYS_PER_YEAR};

use super::leg::{Leg, Side};
use super::template::StrategyTemplate;

/// Relative tolerance when comparing contract inputs across legs.
const PARAM_TOLERANCE: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= PARAM_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Type of strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Long call + long put, same strike.
    Straddle,
    /// Long OTM call + long OTM put.
    Strangle,
    /// Bull put spread + bear call spread.
    IronCondor,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Straddle => "Long Straddle",
            Self::Strangle => "Long Strangle",
            Self::IronCondor => "Iron Condor",
        }
    }

    /// Whether the strategy is opened for a net credit.
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::IronCondor)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Invalid strike ordering for {kind}: {detail}")]
    InvalidStrikeOrdering { kind: StrategyKind, detail: String },

    #[error("{kind}: expected a {expected:?} for the {position} leg")]
    WrongOptionType {
        kind: StrategyKind,
        position: &'static str,
        expected: OptionType,
    },

    #[error("{kind}: legs must share {field} (got {left} and {right})")]
    MismatchedContracts {
        kind: StrategyKind,
        field: &'static str,
        left: f64,
        right: f64,
    },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    MarketData(#[from] DataError),
}

fn expect_type(
    kind: StrategyKind,
    contract: &OptionContract,
    position: &'static str,
    expected: OptionType,
) -> Result<(), StrategyError> {
    if contract.option_type() != expected {
        return Err(StrategyError::WrongOptionType {
            kind,
            position,
            expected,
        });
    }
    Ok(())
}

fn check_field(
    kind: StrategyKind,
    field: &'static str,
    left: f64,
    right: f64,
) -> Result<(), StrategyError> {
    if !approx_eq(left, right) {
        return Err(StrategyError::MismatchedContracts {
            kind,
            field,
            left,
            right,
        });
    }
    Ok(())
}

/// All legs of one strategy sit on the same underlying and expiry.
fn check_same_underlying(kind: StrategyKind, legs: &[Leg]) -> Result<(), StrategyError> {
    if let Some((first, rest)) = legs.split_first() {
        for leg in rest {
            check_field(kind, "spot", first.contract.spot(), leg.contract.spot())?;
            check_field(
                kind,
                "time_to_expiry",
                first.contract.time_to_expiry(),
                leg.contract.time_to_expiry(),
            )?;
        }
    }
    Ok(())
}

/// An immutable multi-leg option strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    kind: StrategyKind,
    legs: Vec<Leg>,
}

impl Strategy {
    /// Long straddle from pre-built contracts.
    ///
    /// Both contracts must share every input, strike included.
    pub fn straddle(call: OptionContract, put: OptionContract) -> Result<Self, StrategyError> {
        let kind = StrategyKind::Straddle;
        expect_type(kind, &call, "call", OptionType::Call)?;
        expect_type(kind, &put, "put", OptionType::Put)?;

        if !approx_eq(call.strike(), put.strike()) {
            return Err(StrategyError::InvalidStrikeOrdering {
                kind,
                detail: format!(
                    "call strike {} must equal put strike {}",
                    call.strike(),
                    put.strike()
                ),
            });
        }
        check_field(kind, "spot", call.spot(), put.spot())?;
        check_field(kind, "time_to_expiry", call.time_to_expiry(), put.time_to_expiry())?;
        check_field(kind, "rate", call.rate(), put.rate())?;
        check_field(kind, "volatility", call.volatility(), put.volatility())?;
        check_field(kind, "dividend_yield", call.dividend_yield(), put.dividend_yield())?;

        Ok(Self {
            kind,
            legs: vec![Leg::long(call), Leg::long(put)],
        })
    }

    /// Long straddle from raw inputs.
    pub fn straddle_from_parameters(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, StrategyError> {
        let market = MarketParams::new(spot, time_to_expiry, rate, volatility)
            .with_dividend_yield(dividend_yield);
        Self::straddle_at(&market, strike)
    }

    /// Long straddle at a given strike.
    pub fn straddle_at(market: &MarketParams, strike: f64) -> Result<Self, StrategyError> {
        let call = OptionContract::from_market(OptionType::Call, strike, market)?;
        let put = OptionContract::from_market(OptionType::Put, strike, market)?;
        Self::straddle(call, put)
    }

    /// At-the-money long straddle (strike = spot).
    pub fn atm_straddle(market: &MarketParams) -> Result<Self, StrategyError> {
        Self::straddle_at(market, market.spot)
    }

    /// Long strangle from pre-built contracts. The call strike must be above
    /// the put strike.
    pub fn strangle(call: OptionContract, put: OptionContract) -> Result<Self, StrategyError> {
        let kind = StrategyKind::Strangle;
        expect_type(kind, &call, "call", OptionType::Call)?;
        expect_type(kind, &put, "put", OptionType::Put)?;

        if call.strike() <= put.strike() {
            return Err(StrategyError::InvalidStrikeOrdering {
                kind,
                detail: format!(
                    "call strike {:.4} must be above put strike {:.4}",
                    call.strike(),
                    put.strike()
                ),
            });
        }

        let legs = vec![Leg::long(call), Leg::long(put)];
        check_same_underlying(kind, &legs)?;
        Ok(Self { kind, legs })
    }

    /// Long strangle at explicit strikes.
    pub fn strangle_from_strikes(
        market: &MarketParams,
        call_strike: f64,
        put_strike: f64,
    ) -> Result<Self, StrategyError> {
        let call = OptionContract::from_market(OptionType::Call, call_strike, market)?;
        let put = OptionContract::from_market(OptionType::Put, put_strike, market)?;
        Self::strangle(call, put)
    }

    /// Long strangle with strikes `spot·(1 ± otm_pct)`.
    pub fn strangle_from_offset(market: &MarketParams, otm_pct: f64) -> Result<Self, StrategyError> {
        Self::strangle_from_strikes(
            market,
            market.spot * (1.0 + otm_pct),
            market.spot * (1.0 - otm_pct),
        )
    }

    /// Short iron condor from pre-built contracts.
    ///
    /// Requires `long_put.K < short_put.K < short_call.K < long_call.K`.
    pub fn iron_condor(
        long_put: OptionContract,
        short_put: OptionContract,
        short_call: OptionContract,
        long_call: OptionContract,
    ) -> Result<Self, StrategyError> {
        let kind = StrategyKind::IronCondor;
        expect_type(kind, &long_put, "long put", OptionType::Put)?;
        expect_type(kind, &short_put, "short put", OptionType::Put)?;
        expect_type(kind, &short_call, "short call", OptionType::Call)?;
        expect_type(kind, &long_call, "long call", OptionType::Call)?;

        let ordered = long_put.strike() < short_put.strike()
            && short_put.strike() < short_call.strike()
            && short_call.strike() < long_call.strike();
        if !ordered {
            return Err(StrategyError::InvalidStrikeOrdering {
                kind,
                detail: format!(
                    "need long put < short put < short call < long call, got {:.4} / {:.4} / {:.4} / {:.4}",
                    long_put.strike(),
                    short_put.strike(),
                    short_call.strike(),
                    long_call.strike()
                ),
            });
        }

        let legs = vec![
            Leg::long(long_put),
            Leg::short(short_put),
            Leg::short(short_call),
            Leg::long(long_call),
        ];
        check_same_underlying(kind, &legs)?;
        Ok(Self { kind, legs })
    }

    /// Short iron condor at explicit strikes.
    pub fn iron_condor_from_strikes(
        market: &MarketParams,
        long_put_strike: f64,
        short_put_strike: f64,
        short_call_strike: f64,
        long_call_strike: f64,
    ) -> Result<Self, StrategyError> {
        Self::iron_condor(
            OptionContract::from_market(OptionType::Put, long_put_strike, market)?,
            OptionContract::from_market(OptionType::Put, short_put_strike, market)?,
            OptionContract::from_market(OptionType::Call, short_call_strike, market)?,
            OptionContract::from_market(OptionType::Call, long_call_strike, market)?,
        )
    }

    /// Short iron condor with short strikes at `spot·(1 ± center_offset_pct)`
    /// and wings `spot·width_pct` further out.
    pub fn iron_condor_from_offsets(
        market: &MarketParams,
        center_offset_pct: f64,
        put_spread_width_pct: f64,
        call_spread_width_pct: f64,
    ) -> Result<Self, StrategyError> {
        let spot = market.spot;
        let offset = spot * center_offset_pct;
        let short_put = spot - offset;
        let short_call = spot + offset;

        Self::iron_condor_from_strikes(
            market,
            short_put - spot * put_spread_width_pct,
            short_put,
            short_call,
            short_call + spot * call_spread_width_pct,
        )
    }

    /// Build a strategy from the market-data collaborator's current inputs.
    ///
    /// Time to expiry is `days_to_expiry / 365`; dividend yield is zero.
    pub fn from_market<P: MarketDataProvider + ?Sized>(
        provider: &P,
        ticker: &str,
        days_to_expiry: u32,
        template: &StrategyTemplate,
    ) -> Result<Self, StrategyError> {
        let snapshot = provider.market_data(ticker)?;
        let market = MarketParams::new(
            snapshot.spot_price,
            MarketParams::years_from_days(days_to_expiry),
            snapshot.risk_free_rate,
            snapshot.volatility,
        );
        template.build(&market)
    }

    /// Same legs and strikes, every contract rebuilt through `f`.
    fn remap<F>(&self, f: F) -> Result<Self, StrategyError>
    where
        F: Fn(&OptionContract) -> Result<OptionContract, PricingError>,
    {
        let legs = self
            .legs
            .iter()
            .map(|leg| -> Result<Leg, StrategyError> {
                Ok(Leg {
                    contract: f(&leg.contract)?,
                    side: leg.side,
                })
            })
            .collect::<Result<Vec<_>, StrategyError>>()?;
        check_same_underlying(self.kind, &legs)?;
        Ok(Self {
            kind: self.kind,
            legs,
        })
    }

    /// Copy repriced at a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Result<Self, StrategyError> {
        self.remap(|c| c.with_volatility(volatility))
    }

    /// Copy repriced at a different spot, strikes unchanged.
    pub fn with_spot(&self, spot: f64) -> Result<Self, StrategyError> {
        self.remap(|c| c.with_spot(spot))
    }

    /// Copy repriced at a different time to expiry.
    pub fn with_time_to_expiry(&self, time_to_expiry: f64) -> Result<Self, StrategyError> {
        self.remap(|c| c.with_time_to_expiry(time_to_expiry))
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Shared market inputs (taken from the first leg).
    pub fn market(&self) -> MarketParams {
        self.legs[0].contract.market()
    }

    pub fn spot(&self) -> f64 {
        self.legs[0].contract.spot()
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.legs[0].contract.time_to_expiry()
    }

    /// Signed premium: paid for bought legs, received for sold legs.
    /// Negative when the strategy opens for a credit.
    pub fn net_debit(&self) -> f64 {
        self.legs.iter().map(Leg::signed_price).sum()
    }

    /// Net credit received (negative when the strategy costs money).
    pub fn net_credit(&self) -> f64 {
        -self.net_debit()
    }

    /// Headline price: the debit paid for long-volatility strategies, the
    /// credit received for the iron condor.
    pub fn price(&self) -> f64 {
        if self.kind.is_credit() {
            self.net_credit()
        } else {
            self.net_debit()
        }
    }

    /// Alias for [`Strategy::price`].
    pub fn total_cost(&self) -> f64 {
        self.price()
    }

    /// Sum of every leg's intrinsic value at expiry, signed by side.
    pub fn payoff_at_expiry(&self, terminal_price: f64) -> f64 {
        self.legs
            .iter()
            .map(|leg| leg.signed_payoff(terminal_price))
            .sum()
    }

    /// Net P&L at expiry: payoff minus the signed premium.
    pub fn profit_at_expiry(&self, terminal_price: f64) -> f64 {
        self.payoff_at_expiry(terminal_price) - self.net_debit()
    }

    /// Lower and upper break-even prices at expiry.
    pub fn break_even_points(&self) -> (f64, f64) {
        let premium = self.price();
        match self.kind {
            StrategyKind::Straddle => {
                let strike = self.legs[0].strike();
                (strike - premium, strike + premium)
            }
            StrategyKind::Strangle => (
                self.legs[1].strike() - premium,
                self.legs[0].strike() + premium,
            ),
            StrategyKind::IronCondor => (
                self.legs[1].strike() - premium,
                self.legs[2].strike() + premium,
            ),
        }
    }

    /// Worst-case P&L at expiry (negative for a loss).
    pub fn max_loss(&self) -> Limit {
        match self.kind {
            StrategyKind::Straddle | StrategyKind::Strangle => Limit::Finite(-self.net_debit()),
            StrategyKind::IronCondor => {
                let width = self.max_spread_width().unwrap_or(0.0);
                Limit::Finite(-(width - self.net_credit()))
            }
        }
    }

    /// Best-case P&L at expiry.
    pub fn max_profit(&self) -> Limit {
        match self.kind {
            StrategyKind::Straddle | StrategyKind::Strangle => Limit::Unbounded,
            StrategyKind::IronCondor => Limit::Finite(self.net_credit()),
        }
    }

    /// Width of the put spread (iron condor only).
    pub fn put_spread_width(&self) -> Option<f64> {
        match self.kind {
            StrategyKind::IronCondor => Some(self.legs[1].strike() - self.legs[0].strike()),
            _ => None,
        }
    }

    /// Width of the call spread (iron condor only).
    pub fn call_spread_width(&self) -> Option<f64> {
        match self.kind {
            StrategyKind::IronCondor => Some(self.legs[3].strike() - self.legs[2].strike()),
            _ => None,
        }
    }

    fn max_spread_width(&self) -> Option<f64> {
        Some(self.put_spread_width()?.max(self.call_spread_width()?))
    }

    /// Position Greeks: signed sum of the legs' Greeks.
    pub fn greeks(&self) -> Greeks {
        self.legs.iter().map(Leg::signed_greeks).sum()
    }

    /// Everything a report needs in one serializable structure.
    pub fn summary(&self) -> StrategySummary {
        let market = self.market();
        let (lower_be, upper_be) = self.break_even_points();
        let spot = market.spot;

        let legs = self
            .legs
            .iter()
            .map(|leg| LegSummary {
                option_type: leg.option_type(),
                side: leg.side,
                strike: leg.strike(),
                price: leg.contract.price(),
            })
            .collect();

        let profit_range_width = match self.kind {
            StrategyKind::IronCondor => Some(upper_be - lower_be),
            _ => None,
        };

        StrategySummary {
            strategy: self.kind.name().to_string(),
            kind: self.kind,
            spot_price: spot,
            time_to_expiry_years: market.time_to_expiry,
            time_to_expiry_days: (market.time_to_expiry * DAYS_PER_YEAR).round() as u32,
            volatility: market.volatility,
            risk_free_rate: market.rate,
            dividend_yield: market.dividend_yield,
            legs,
            price: self.price(),
            net_debit: self.net_debit(),
            max_loss: self.max_loss(),
            max_profit: self.max_profit(),
            lower_break_even: lower_be,
            upper_break_even: upper_be,
            required_move_lower_pct: (spot - lower_be).abs() / spot * 100.0,
            required_move_upper_pct: (upper_be - spot).abs() / spot * 100.0,
            profit_range_width,
            put_spread_width: self.put_spread_width(),
            call_spread_width: self.call_spread_width(),
            greeks: self.greeks(),
        }
    }
}

/// Per-leg line of a [`StrategySummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSummary {
    pub option_type: OptionType,
    pub side: Side,
    pub strike: f64,
    pub price: f64,
}

/// Serializable snapshot of a strategy's inputs, prices and risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub kind: StrategyKind,
    pub spot_price: f64,
    pub time_to_expiry_years: f64,
    pub time_to_expiry_days: u32,
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub legs: Vec<LegSummary>,
    /// Debit paid (straddle, strangle) or credit received (iron condor).
    pub price: f64,
    pub net_debit: f64,
    pub max_loss: Limit,
    pub max_profit: Limit,
    pub lower_break_even: f64,
    pub upper_break_even: f64,
    pub required_move_lower_pct: f64,
    pub required_move_upper_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profit_range_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub put_spread_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub call_spread_width: Option<f64>,
    pub greeks: Greeks,
}
