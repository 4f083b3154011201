//! European basket options on correlated lognormal assets.
//!
//! The arithmetic basket `wᵀS_T` has no closed form. The geometric basket
//! `Π S_i(T)^{w_i}` is lognormal with
//! `E[ln G] = Σ w_i (ln S_i + (r − q_i − σ_i²/2)·T)` and
//! `Var[ln G] = wᵀ Σ w · T`, `Σ_ij = σ_i ρ_ij σ_j`,
//! and serves as the control variate of the Monte Carlo engine.

use nalgebra::{DMatrix, DVector};
use qc_core::{ensure, errors::Result, OptionType, Rate, Real, Time, Volatility};
use qc_math::{lognormal_expectation, matrix_utilities};
use serde::Serialize;

/// Market data of a basket of correlated assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketMarket {
    spots: Vec<Real>,
    vols: Vec<Volatility>,
    dividend_yields: Vec<Rate>,
    rate: Rate,
    maturity: Time,
    correlation: Vec<Vec<Real>>,
    #[serde(skip)]
    correlation_matrix: DMatrix<Real>,
}

impl BasketMarket {
    /// Validate and build basket market data.
    ///
    /// # Errors
    /// `InvalidInput` on non-positive spots, vols or maturity, negative
    /// dividend yields, length mismatches, or a correlation matrix that is
    /// not symmetric, unit-diagonal, bounded by 1 and positive semi-definite.
    pub fn new(
        spots: Vec<Real>,
        vols: Vec<Volatility>,
        dividend_yields: Vec<Rate>,
        rate: Rate,
        maturity: Time,
        correlation: Vec<Vec<Real>>,
    ) -> Result<Self> {
        let n = spots.len();
        ensure!(n >= 1, "spots", n, "at least one asset is required");
        ensure!(
            spots.iter().all(|s| s.is_finite() && *s > 0.0),
            "spots",
            spots,
            "spots must be positive and finite"
        );
        ensure!(vols.len() == n, "vols", vols.len(), "expected {n} volatilities");
        ensure!(
            vols.iter().all(|v| v.is_finite() && *v > 0.0),
            "vols",
            vols,
            "volatilities must be positive and finite"
        );
        ensure!(
            dividend_yields.len() == n,
            "dividend_yields",
            dividend_yields.len(),
            "expected {n} dividend yields"
        );
        ensure!(
            dividend_yields.iter().all(|q| q.is_finite() && *q >= 0.0),
            "dividend_yields",
            dividend_yields,
            "dividend yields must be non-negative and finite"
        );
        ensure!(rate.is_finite(), "r", rate, "rate must be finite");
        ensure!(maturity.is_finite() && maturity > 0.0, "t", maturity, "maturity must be positive and finite");
        let correlation_matrix = matrix_utilities::matrix_from_rows("correlation", &correlation, n)?;
        matrix_utilities::validate_correlation(&correlation_matrix)?;
        Ok(Self {
            spots,
            vols,
            dividend_yields,
            rate,
            maturity,
            correlation,
            correlation_matrix,
        })
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.spots.len()
    }

    /// Spot prices.
    pub fn spots(&self) -> &[Real] {
        &self.spots
    }

    /// Volatilities.
    pub fn vols(&self) -> &[Volatility] {
        &self.vols
    }

    /// Continuous dividend yields.
    pub fn dividend_yields(&self) -> &[Rate] {
        &self.dividend_yields
    }

    /// Risk-free rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Maturity.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Validated correlation matrix.
    pub fn correlation(&self) -> &DMatrix<Real> {
        &self.correlation_matrix
    }

    /// `e^{-rT}`.
    pub fn discount_factor(&self) -> Real {
        (-self.rate * self.maturity).exp()
    }

    /// Forward of asset `i`: `S_i·e^{(r − q_i)T}`.
    pub fn forward(&self, i: usize) -> Real {
        self.spots[i] * ((self.rate - self.dividend_yields[i]) * self.maturity).exp()
    }
}

/// A European option on the weighted sum `wᵀS_T`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasketOption {
    option_type: OptionType,
    strike: Real,
    weights: Vec<Real>,
}

impl BasketOption {
    /// Validate and build a basket option.
    pub fn new(option_type: OptionType, strike: Real, weights: Vec<Real>) -> Result<Self> {
        ensure!(strike.is_finite() && strike > 0.0, "k", strike, "strike must be positive and finite");
        ensure!(!weights.is_empty(), "weights", weights, "at least one weight is required");
        ensure!(weights.iter().all(|w| w.is_finite()), "weights", weights, "weights must be finite");
        Ok(Self {
            option_type,
            strike,
            weights,
        })
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Strike.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Basket weights.
    pub fn weights(&self) -> &[Real] {
        &self.weights
    }

    /// `wᵀS`.
    pub fn arithmetic_basket(&self, terminals: &[Real]) -> Real {
        self.weights.iter().zip(terminals).map(|(w, s)| w * s).sum()
    }

    /// `Π S_i^{w_i}`.
    pub fn geometric_basket(&self, terminals: &[Real]) -> Real {
        self.weights
            .iter()
            .zip(terminals)
            .map(|(w, s)| w * s.ln())
            .sum::<Real>()
            .exp()
    }

    /// Undiscounted payoff on the arithmetic basket.
    pub fn arithmetic_payoff(&self, terminals: &[Real]) -> Real {
        self.option_type.payoff(self.arithmetic_basket(terminals), self.strike)
    }

    /// Undiscounted payoff on the geometric basket.
    pub fn geometric_payoff(&self, terminals: &[Real]) -> Real {
        self.option_type.payoff(self.geometric_basket(terminals), self.strike)
    }
}

pub(crate) fn check_dimensions(market: &BasketMarket, option: &BasketOption) -> Result<()> {
    ensure!(
        option.weights().len() == market.n_assets(),
        "weights",
        option.weights().len(),
        "expected one weight per asset ({})",
        market.n_assets()
    );
    Ok(())
}

/// Closed-form price of the geometric-basket option.
///
/// # Errors
/// `InvalidInput` if the weight count differs from the asset count.
pub fn geometric_basket_price(market: &BasketMarket, option: &BasketOption) -> Result<Real> {
    check_dimensions(market, option)?;
    let t = market.maturity();
    let w = DVector::from_column_slice(option.weights());
    let covariance = matrix_utilities::covariance_from_correlation(market.vols(), market.correlation())?;
    let var_log = w.dot(&(covariance * &w)) * t;
    let mean_log: Real = (0..market.n_assets())
        .map(|i| {
            let sigma = market.vols()[i];
            w[i] * (market.spots()[i].ln() + (market.rate() - market.dividend_yields()[i] - 0.5 * sigma * sigma) * t)
        })
        .sum();
    Ok(market.discount_factor() * lognormal_expectation(mean_log, var_log, option.strike(), option.option_type()))
}

/// `E[e^{-rT}·wᵀS_T] = e^{-rT} Σ w_i S_i e^{(r − q_i)T}`.
pub fn discounted_linear_basket_mean(market: &BasketMarket, option: &BasketOption) -> Real {
    market.discount_factor()
        * option
            .weights()
            .iter()
            .enumerate()
            .map(|(i, w)| w * market.forward(i))
            .sum::<Real>()
}
