//! Black-Scholes pricing and Greeks for European options.
//!
//! A contract is validated once, at construction. After that every method is
//! a pure function of the stored inputs:
//!
//! ```text
//! d1 = [ln(S/K) + (r - q + σ²/2)·T] / (σ·√T)
//! d2 = d1 - σ·√T
//! ```
//!
//! Scaling:
//! - Vega: per 1% change in volatility
//! - Theta: per calendar day
//! - Rho: per 1% change in the rate

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::data::{Greeks, OptionType};

/// Days per year used to express theta per calendar day.
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Invalid parameter: {name} must be positive, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid parameter: {name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

/// Standard normal CDF.
pub fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Standard normal PDF.
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

fn require_positive(name: &'static str, value: f64) -> Result<(), PricingError> {
    // `!(v > 0)` also rejects NaN.
    if !(value > 0.0) || value.is_infinite() {
        return Err(PricingError::InvalidParameter { name, value });
    }
    Ok(())
}

fn require_finite(name: &'static str, value: f64) -> Result<(), PricingError> {
    if !value.is_finite() {
        return Err(PricingError::NonFinite { name, value });
    }
    Ok(())
}

/// Market inputs shared by every leg of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Spot price of the underlying.
    pub spot: f64,
    /// Time to expiry in years.
    pub time_to_expiry: f64,
    /// Annualized risk-free rate.
    pub rate: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Continuous dividend yield.
    #[serde(default)]
    pub dividend_yield: f64,
}

impl MarketParams {
    pub fn new(spot: f64, time_to_expiry: f64, rate: f64, volatility: f64) -> Self {
        Self {
            spot,
            time_to_expiry,
            rate,
            volatility,
            dividend_yield: 0.0,
        }
    }

    pub fn with_dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = dividend_yield;
        self
    }

    /// Convert calendar days to a year fraction.
    pub fn years_from_days(days: u32) -> f64 {
        days as f64 / DAYS_PER_YEAR
    }
}

/// An immutable European option contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionContract {
    option_type: OptionType,
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    dividend_yield: f64,
}

impl OptionContract {
    /// Create a validated contract.
    ///
    /// Spot, strike, time to expiry and volatility must be strictly positive;
    /// rate and dividend yield must be finite.
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, PricingError> {
        require_positive("spot", spot)?;
        require_positive("strike", strike)?;
        require_positive("time_to_expiry", time_to_expiry)?;
        require_positive("volatility", volatility)?;
        require_finite("rate", rate)?;
        require_finite("dividend_yield", dividend_yield)?;

        Ok(Self {
            option_type,
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
            dividend_yield,
        })
    }

    pub fn call(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Call,
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
            dividend_yield,
        )
    }

    pub fn put(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        rate: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, PricingError> {
        Self::new(
            OptionType::Put,
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
            dividend_yield,
        )
    }

    /// Create a contract from shared market inputs and a strike.
    pub fn from_market(
        option_type: OptionType,
        strike: f64,
        market: &MarketParams,
    ) -> Result<Self, PricingError> {
        Self::new(
            option_type,
            market.spot,
            strike,
            market.time_to_expiry,
            market.rate,
            market.volatility,
            market.dividend_yield,
        )
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.time_to_expiry
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// The market inputs this contract was priced with.
    pub fn market(&self) -> MarketParams {
        MarketParams {
            spot: self.spot,
            time_to_expiry: self.time_to_expiry,
            rate: self.rate,
            volatility: self.volatility,
            dividend_yield: self.dividend_yield,
        }
    }

    /// Same contract with a different strike.
    pub fn with_strike(&self, strike: f64) -> Result<Self, PricingError> {
        Self::from_market(self.option_type, strike, &self.market())
    }

    /// Same contract with a different spot.
    pub fn with_spot(&self, spot: f64) -> Result<Self, PricingError> {
        Self::from_market(self.option_type, self.strike, &MarketParams { spot, ..self.market() })
    }

    /// Same contract with a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Result<Self, PricingError> {
        Self::from_market(
            self.option_type,
            self.strike,
            &MarketParams {
                volatility,
                ..self.market()
            },
        )
    }

    /// Same contract with a different time to expiry.
    pub fn with_time_to_expiry(&self, time_to_expiry: f64) -> Result<Self, PricingError> {
        Self::from_market(
            self.option_type,
            self.strike,
            &MarketParams {
                time_to_expiry,
                ..self.market()
            },
        )
    }

    /// Calculate d1 parameter.
    pub fn d1(&self) -> f64 {
        let numerator = (self.spot / self.strike).ln()
            + (self.rate - self.dividend_yield + 0.5 * self.volatility * self.volatility)
                * self.time_to_expiry;
        numerator / (self.volatility * self.time_to_expiry.sqrt())
    }

    /// Calculate d2 parameter.
    pub fn d2(&self) -> f64 {
        self.d1() - self.volatility * self.time_to_expiry.sqrt()
    }

    fn dividend_discount(&self) -> f64 {
        (-self.dividend_yield * self.time_to_expiry).exp()
    }

    fn rate_discount(&self) -> f64 {
        (-self.rate * self.time_to_expiry).exp()
    }

    /// Black-Scholes price.
    pub fn price(&self) -> f64 {
        let d1 = self.d1();
        let d2 = self.d2();
        let spot_leg = self.spot * self.dividend_discount();
        let strike_leg = self.strike * self.rate_discount();

        match self.option_type {
            OptionType::Call => spot_leg * norm_cdf(d1) - strike_leg * norm_cdf(d2),
            OptionType::Put => strike_leg * norm_cdf(-d2) - spot_leg * norm_cdf(-d1),
        }
    }

    /// Value if exercised with the underlying at `terminal_price`.
    pub fn intrinsic_value(&self, terminal_price: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (terminal_price - self.strike).max(0.0),
            OptionType::Put => (self.strike - terminal_price).max(0.0),
        }
    }

    /// Calculate delta.
    pub fn delta(&self) -> f64 {
        let d1 = self.d1();
        let discount = self.dividend_discount();

        match self.option_type {
            OptionType::Call => discount * norm_cdf(d1),
            OptionType::Put => -discount * norm_cdf(-d1),
        }
    }

    /// Calculate gamma (same for calls and puts).
    pub fn gamma(&self) -> f64 {
        self.dividend_discount() * norm_pdf(self.d1())
            / (self.spot * self.volatility * self.time_to_expiry.sqrt())
    }

    /// Vega per 1% change in volatility (same for calls and puts).
    pub fn vega(&self) -> f64 {
        self.spot * self.dividend_discount() * norm_pdf(self.d1()) * self.time_to_expiry.sqrt()
            / 100.0
    }

    /// Theta per calendar day.
    pub fn theta(&self) -> f64 {
        let d1 = self.d1();
        let d2 = self.d2();
        let discount_d = self.dividend_discount();
        let discount_r = self.rate_discount();

        let decay = -self.spot * discount_d * norm_pdf(d1) * self.volatility
            / (2.0 * self.time_to_expiry.sqrt());

        let annual = match self.option_type {
            OptionType::Call => {
                let dividend = self.dividend_yield * self.spot * discount_d * norm_cdf(d1);
                let carry = self.rate * self.strike * discount_r * norm_cdf(d2);
                decay + dividend - carry
            }
            OptionType::Put => {
                let dividend = self.dividend_yield * self.spot * discount_d * norm_cdf(-d1);
                let carry = self.rate * self.strike * discount_r * norm_cdf(-d2);
                decay - dividend + carry
            }
        };

        annual / DAYS_PER_YEAR
    }

    /// Rho per 1% change in the rate.
    pub fn rho(&self) -> f64 {
        let d2 = self.d2();
        let discounted = self.strike * self.time_to_expiry * self.rate_discount();

        match self.option_type {
            OptionType::Call => discounted * norm_cdf(d2) / 100.0,
            OptionType::Put => -discounted * norm_cdf(-d2) / 100.0,
        }
    }

    /// All five sensitivities.
    pub fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.delta(),
            gamma: self.gamma(),
            vega: self.vega(),
            theta: self.theta(),
            rho: self.rho(),
        }
    }
}

/// Price a call without keeping the contract around.
pub fn price_call(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    dividend_yield: f64,
) -> Result<f64, PricingError> {
    Ok(OptionContract::call(spot, strike, time_to_expiry, rate, volatility, dividend_yield)?.price())
}

/// Price a put without keeping the contract around.
pub fn price_put(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    rate: f64,
    volatility: f64,
    dividend_yield: f64,
) -> Result<f64, PricingError> {
    Ok(OptionContract::put(spot, strike, time_to_expiry, rate, volatility, dividend_yield)?.price())
}
