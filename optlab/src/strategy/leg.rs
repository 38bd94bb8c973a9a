//! A single leg of a multi-leg option strategy.

use serde::{Deserialize, Serialize};

use crate::data::{Greeks, OptionType};
use crate::pricing::OptionContract;

/// Whether the leg was bought or sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bought (pays premium).
    Long,
    /// Sold (receives premium).
    Short,
}

impl Side {
    /// +1 for bought legs, -1 for sold legs.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

/// An option contract held long or short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub contract: OptionContract,
    pub side: Side,
}

impl Leg {
    pub fn long(contract: OptionContract) -> Self {
        Self {
            contract,
            side: Side::Long,
        }
    }

    pub fn short(contract: OptionContract) -> Self {
        Self {
            contract,
            side: Side::Short,
        }
    }

    pub fn is_short(&self) -> bool {
        self.side == Side::Short
    }

    pub fn option_type(&self) -> OptionType {
        self.contract.option_type()
    }

    pub fn strike(&self) -> f64 {
        self.contract.strike()
    }

    /// Premium paid (positive) or received (negative).
    pub fn signed_price(&self) -> f64 {
        self.side.sign() * self.contract.price()
    }

    /// Value at expiry from the holder's side.
    pub fn signed_payoff(&self, terminal_price: f64) -> f64 {
        self.side.sign() * self.contract.intrinsic_value(terminal_price)
    }

    /// Greeks of the position (negated for sold legs).
    pub fn signed_greeks(&self) -> Greeks {
        self.contract.greeks().scaled(self.side.sign())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_leg_signs() {
        let call = OptionContract::call(100.0, 105.0, 0.25, 0.05, 0.2, 0.0).unwrap();
        let long = Leg::long(call);
        let short = Leg::short(call);

        assert!(short.is_short());
        assert_eq!(long.signed_price(), -short.signed_price());
        assert_eq!(long.signed_payoff(115.0), 10.0);
        assert_eq!(short.signed_payoff(115.0), -10.0);
        assert_eq!(long.signed_greeks(), -short.signed_greeks());
    }
}
