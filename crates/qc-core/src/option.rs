//! Vanilla option description.

use serde::Serialize;

use crate::{ensure, errors::Result, Real};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// `+1` for calls, `-1` for puts.
    pub fn sign(&self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Map the boolean `is_call` convention onto the enum.
    pub fn from_is_call(is_call: bool) -> Self {
        if is_call {
            OptionType::Call
        } else {
            OptionType::Put
        }
    }

    /// Payoff `max(φ(s − k), 0)`.
    #[inline]
    pub fn payoff(&self, underlying: Real, strike: Real) -> Real {
        (self.sign() * (underlying - strike)).max(0.0)
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// A plain-vanilla option: type and strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VanillaOption {
    option_type: OptionType,
    strike: Real,
}

impl VanillaOption {
    /// Build an option. The strike must be positive and finite.
    pub fn new(option_type: OptionType, strike: Real) -> Result<Self> {
        ensure!(strike.is_finite() && strike > 0.0, "k", strike, "strike must be positive and finite");
        Ok(Self {
            option_type,
            strike,
        })
    }

    /// Shorthand for a call.
    pub fn call(strike: Real) -> Result<Self> {
        Self::new(OptionType::Call, strike)
    }

    /// Shorthand for a put.
    pub fn put(strike: Real) -> Result<Self> {
        Self::new(OptionType::Put, strike)
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// `true` for calls.
    pub fn is_call(&self) -> bool {
        self.option_type == OptionType::Call
    }

    /// Strike `K`.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Exercise value at underlying level `s`.
    #[inline]
    pub fn payoff(&self, s: Real) -> Real {
        self.option_type.payoff(s, self.strike)
    }
}
