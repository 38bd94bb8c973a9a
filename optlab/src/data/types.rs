//! Core data types shared by the pricing, strategy, risk and backtest layers.
//!
//! These are plain value types: they carry no behaviour beyond small
//! conversions and arithmetic helpers, and they serialize to the mappings
//! consumed by presentation and export layers.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Sensitivities of an option (or a whole position) to its inputs.
///
/// Scaling follows trading-desk conventions: vega and rho per 1% move,
/// theta per calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

impl Greeks {
    /// Multiply every sensitivity by `factor` (position sign or size).
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            vega: self.vega * factor,
            theta: self.theta * factor,
            rho: self.rho * factor,
        }
    }
}

impl Add for Greeks {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            vega: self.vega + other.vega,
            theta: self.theta + other.theta,
            rho: self.rho + other.rho,
        }
    }
}

impl AddAssign for Greeks {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Greeks {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + other.scaled(-1.0)
    }
}

impl Neg for Greeks {
    type Output = Self;

    fn neg(self) -> Self {
        self.scaled(-1.0)
    }
}

impl Mul<f64> for Greeks {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scaled(factor)
    }
}

impl std::iter::Sum for Greeks {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, g| acc + g)
    }
}

/// A value that is either a finite number or explicitly unbounded.
///
/// Used for max profit of long-volatility strategies and for ratios whose
/// denominator is zero. Serializes the unbounded case as the string
/// `"Unlimited"` so that no payload ever carries an infinite float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    Finite(f64),
    Unbounded,
}

impl Limit {
    pub const UNBOUNDED_LABEL: &'static str = "Unlimited";

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// The finite value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(*v),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{:.2}", v),
            Self::Unbounded => f.write_str(Self::UNBOUNDED_LABEL),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(v) => serializer.serialize_f64(*v),
            Self::Unbounded => serializer.serialize_str(Self::UNBOUNDED_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Label(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self::Finite(v)),
            Raw::Label(s)
                if s.eq_ignore_ascii_case("unlimited") || s.eq_ignore_ascii_case("unbounded") =>
            {
                Ok(Self::Unbounded)
            }
            Raw::Label(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"Unlimited\", got {:?}",
                s
            ))),
        }
    }
}

/// Daily close for the underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Current market inputs for one underlying, as returned by a data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Spot price of the underlying.
    pub spot_price: f64,
    /// Annualized volatility (0.25 = 25%).
    pub volatility: f64,
    /// Annualized risk-free rate.
    pub risk_free_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_parsing() {
        assert_eq!(OptionType::from_str("C"), Some(OptionType::Call));
        assert_eq!(OptionType::from_str("P"), Some(OptionType::Put));
        assert_eq!(OptionType::from_str("call"), Some(OptionType::Call));
        assert_eq!(OptionType::from_str("PUT"), Some(OptionType::Put));
        assert_eq!(OptionType::from_str("X"), None);
    }

    #[test]
    fn test_greeks_arithmetic() {
        let a = Greeks {
            delta: 0.5,
            gamma: 0.02,
            vega: 0.1,
            theta: -0.03,
            rho: 0.04,
        };
        let b = a.scaled(-1.0);
        let sum = a + b;
        assert_eq!(sum, Greeks::default());

        let total: Greeks = vec![a, a, b].into_iter().sum();
        assert_eq!(total, a);
        assert_eq!(a - a, Greeks::default());
    }

    #[test]
    fn test_limit_serialization() {
        let finite = serde_json::to_string(&Limit::Finite(2.5)).unwrap();
        assert_eq!(finite, "2.5");

        let unbounded = serde_json::to_string(&Limit::Unbounded).unwrap();
        assert_eq!(unbounded, "\"Unlimited\"");

        let parsed: Limit = serde_json::from_str("\"Unlimited\"").unwrap();
        assert!(parsed.is_unbounded());
        let parsed: Limit = serde_json::from_str("1.25").unwrap();
        assert_eq!(parsed.value(), Some(1.25));
        assert!(serde_json::from_str::<Limit>("\"lots\"").is_err());
    }
}
