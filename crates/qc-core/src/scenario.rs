//! Validated market scenarios.
//!
//! [`MarketInputs`] carries everything except the volatility (the input of an
//! implied-volatility inversion); [`MarketScenario`] adds a volatility and is
//! the input of every pricer. Both are immutable and validated on
//! construction.

use serde::Serialize;

use crate::{ensure, errors::Result, DiscountFactor, Rate, Real, Time, Volatility};

/// Spot, rate, dividend yield, and maturity of a single underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketInputs {
    spot: Real,
    rate: Rate,
    dividend_yield: Rate,
    maturity: Time,
}

impl MarketInputs {
    /// Validate and build market inputs.
    ///
    /// # Errors
    /// `InvalidInput` unless `spot > 0`, `dividend_yield >= 0`, `maturity > 0`
    /// and every value is finite.
    pub fn new(spot: Real, rate: Rate, dividend_yield: Rate, maturity: Time) -> Result<Self> {
        ensure!(spot.is_finite() && spot > 0.0, "s0", spot, "spot must be positive and finite");
        ensure!(rate.is_finite(), "r", rate, "rate must be finite");
        ensure!(
            dividend_yield.is_finite() && dividend_yield >= 0.0,
            "q",
            dividend_yield,
            "dividend yield must be non-negative and finite"
        );
        ensure!(
            maturity.is_finite() && maturity > 0.0,
            "t",
            maturity,
            "maturity must be positive and finite"
        );
        Ok(Self {
            spot,
            rate,
            dividend_yield,
            maturity,
        })
    }

    /// Spot price `S0`.
    pub fn spot(&self) -> Real {
        self.spot
    }

    /// Continuously compounded risk-free rate `r`.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Continuous dividend yield `q`.
    pub fn dividend_yield(&self) -> Rate {
        self.dividend_yield
    }

    /// Maturity `T` in years.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Risk-free discount factor `e^{-rT}`.
    pub fn discount_factor(&self) -> DiscountFactor {
        (-self.rate * self.maturity).exp()
    }

    /// Dividend discount factor `e^{-qT}`.
    pub fn dividend_discount_factor(&self) -> DiscountFactor {
        (-self.dividend_yield * self.maturity).exp()
    }

    /// Forward price `S0 e^{(r-q)T}`.
    pub fn forward(&self) -> Real {
        self.spot * ((self.rate - self.dividend_yield) * self.maturity).exp()
    }

    /// Attach a volatility.
    pub fn with_volatility(self, volatility: Volatility) -> Result<MarketScenario> {
        MarketScenario::from_inputs(self, volatility)
    }
}

/// A complete single-asset Black–Scholes scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketScenario {
    #[serde(flatten)]
    market: MarketInputs,
    sigma: Volatility,
}

impl MarketScenario {
    /// Validate and build a scenario from raw values.
    pub fn new(
        spot: Real,
        rate: Rate,
        dividend_yield: Rate,
        maturity: Time,
        volatility: Volatility,
    ) -> Result<Self> {
        Self::from_inputs(
            MarketInputs::new(spot, rate, dividend_yield, maturity)?,
            volatility,
        )
    }

    /// Attach a volatility to validated market inputs.
    pub fn from_inputs(market: MarketInputs, volatility: Volatility) -> Result<Self> {
        ensure!(
            volatility.is_finite() && volatility > 0.0,
            "sigma",
            volatility,
            "volatility must be positive and finite"
        );
        Ok(Self {
            market,
            sigma: volatility,
        })
    }

    /// The volatility-free part of the scenario.
    pub fn market(&self) -> &MarketInputs {
        &self.market
    }

    /// Spot price `S0`.
    pub fn spot(&self) -> Real {
        self.market.spot
    }

    /// Risk-free rate `r`.
    pub fn rate(&self) -> Rate {
        self.market.rate
    }

    /// Dividend yield `q`.
    pub fn dividend_yield(&self) -> Rate {
        self.market.dividend_yield
    }

    /// Maturity `T`.
    pub fn maturity(&self) -> Time {
        self.market.maturity
    }

    /// Volatility `σ`.
    pub fn volatility(&self) -> Volatility {
        self.sigma
    }

    /// Total standard deviation `σ√T`.
    pub fn std_dev(&self) -> Real {
        self.sigma * self.market.maturity.sqrt()
    }

    /// `e^{-rT}`.
    pub fn discount_factor(&self) -> DiscountFactor {
        self.market.discount_factor()
    }

    /// `e^{-qT}`.
    pub fn dividend_discount_factor(&self) -> DiscountFactor {
        self.market.dividend_discount_factor()
    }

    /// Same market with a different volatility.
    pub fn with_volatility(&self, volatility: Volatility) -> Result<Self> {
        Self::from_inputs(self.market, volatility)
    }
}
