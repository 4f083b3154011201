//! Analytic European option engine (Black–Scholes–Merton).
//!
//! Prices European vanilla options with the closed form
//!
//! $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
//! $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
//!
//! and computes the first and second order Greeks. When `σ√T` falls below
//! [`DEGENERATE_STD_DEV`] the lognormal collapses onto the forward and the
//! price and Greeks take their deterministic limits.
//!
//! Also hosts the no-arbitrage bounds, the put–call parity residual and the
//! implied-volatility inversion.

use qc_core::{
    config::{ImpliedVolConfig, RootSolver},
    ensure,
    errors::{Error, Result},
    MarketInputs, MarketScenario, OptionType, Real, VanillaOption,
};
use qc_math::{
    d1_d2, normal_cdf, normal_pdf,
    solvers1d::{bisection, brent, SolverSettings},
};
use serde::Serialize;
use tracing::{debug, trace};

/// Below this `σ√T` the deterministic-limit branch is taken.
pub const DEGENERATE_STD_DEV: Real = 1e-10;

/// Price and Greeks computed at one scenario.
///
/// Vega and rho are per unit (not per percentage point) change; theta is
/// the derivative with respect to calendar time, per year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreeksResult {
    /// Option value.
    pub price: Real,
    /// ∂V/∂S.
    pub delta: Real,
    /// ∂²V/∂S².
    pub gamma: Real,
    /// ∂V/∂σ.
    pub vega: Real,
    /// −∂V/∂T.
    pub theta: Real,
    /// ∂V/∂r.
    pub rho: Real,
}

/// Black–Scholes–Merton price and Greeks from raw inputs.
///
/// Inputs are not validated; use [`greeks`] with a [`MarketScenario`] for
/// checked entry.
pub fn black_scholes_merton(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    rate: Real,
    dividend_yield: Real,
    volatility: Real,
    maturity: Real,
) -> GreeksResult {
    let phi = option_type.sign();
    let t = maturity;
    let (r, q, sigma) = (rate, dividend_yield, volatility);
    let sqrt_t = t.sqrt();
    let std_dev = sigma * sqrt_t;
    let df_r = (-r * t).exp();
    let df_q = (-q * t).exp();

    if std_dev < DEGENERATE_STD_DEV {
        let forward_intrinsic = phi * (spot * df_q - strike * df_r);
        if forward_intrinsic <= 0.0 {
            return GreeksResult {
                price: 0.0,
                delta: 0.0,
                gamma: 0.0,
                vega: 0.0,
                theta: 0.0,
                rho: 0.0,
            };
        }
        return GreeksResult {
            price: forward_intrinsic,
            delta: phi * df_q,
            gamma: 0.0,
            vega: 0.0,
            theta: phi * (q * spot * df_q - r * strike * df_r),
            rho: phi * strike * t * df_r,
        };
    }

    let (d1, d2) = d1_d2(spot, strike, r, q, sigma, t);
    let nd1 = normal_cdf(phi * d1);
    let nd2 = normal_cdf(phi * d2);
    let npd1 = normal_pdf(d1);

    // rounding can leave a deep out-of-the-money value a hair below zero
    let price = (phi * (spot * df_q * nd1 - strike * df_r * nd2)).max(0.0);
    let theta = {
        let decay = -(spot * df_q * npd1 * sigma) / (2.0 * sqrt_t);
        let carry_r = -phi * r * strike * df_r * nd2;
        let carry_q = phi * q * spot * df_q * nd1;
        decay + carry_r + carry_q
    };

    GreeksResult {
        price,
        delta: phi * df_q * nd1,
        gamma: df_q * npd1 / (spot * std_dev),
        vega: spot * df_q * npd1 * sqrt_t,
        theta,
        rho: phi * strike * t * df_r * nd2,
    }
}

/// Black–Scholes price of a European option.
pub fn price(scenario: &MarketScenario, option: &VanillaOption) -> Real {
    greeks(scenario, option).price
}

/// Black–Scholes price and Greeks of a European option.
pub fn greeks(scenario: &MarketScenario, option: &VanillaOption) -> GreeksResult {
    black_scholes_merton(
        option.option_type(),
        scenario.spot(),
        option.strike(),
        scenario.rate(),
        scenario.dividend_yield(),
        scenario.volatility(),
        scenario.maturity(),
    )
}

/// Model-free bounds `(lower, upper)` on a European option price.
///
/// Call: `(max(S·e^{-qT} − K·e^{-rT}, 0), S·e^{-qT})`;
/// put: `(max(K·e^{-rT} − S·e^{-qT}, 0), K·e^{-rT})`.
pub fn price_bounds(market: &MarketInputs, option: &VanillaOption) -> (Real, Real) {
    let s = market.spot() * market.dividend_discount_factor();
    let k = option.strike() * market.discount_factor();
    match option.option_type() {
        OptionType::Call => ((s - k).max(0.0), s),
        OptionType::Put => ((k - s).max(0.0), k),
    }
}

/// `C − P − (S·e^{-qT} − K·e^{-rT})`; zero for arbitrage-free prices.
pub fn put_call_parity_residual(call: Real, put: Real, market: &MarketInputs, strike: Real) -> Real {
    call - put - (market.spot() * market.dividend_discount_factor() - strike * market.discount_factor())
}

/// Volatility that reproduces `target_price`.
///
/// The target is checked against [`price_bounds`] first; a target outside
/// `[lower, upper)` has no solution and fails before any solver iteration.
/// Otherwise `σ ↦ price(σ) − target` is solved on
/// `[config.vol_lower, config.vol_upper]` with the configured solver,
/// tolerance and iteration cap.
///
/// # Errors
/// * `InvalidInput` if `target_price` is not positive and finite.
/// * `Convergence` if the target is outside the bounds, not bracketed by
///   the volatility interval, or the solver runs out of iterations.
pub fn implied_volatility(
    market: &MarketInputs,
    option: &VanillaOption,
    target_price: Real,
    config: &ImpliedVolConfig,
) -> Result<Real> {
    ensure!(
        target_price.is_finite() && target_price > 0.0,
        "target_price",
        target_price,
        "target price must be positive and finite"
    );
    let (lower, upper) = price_bounds(market, option);
    if target_price < lower || target_price >= upper {
        return Err(Error::convergence(
            "implied_vol",
            0,
            format!(
                "target price {target_price} outside no-arbitrage bounds [{lower}, {upper}) for {} strike {}",
                option.option_type(),
                option.strike()
            ),
        ));
    }

    let objective = |sigma: Real| {
        black_scholes_merton(
            option.option_type(),
            market.spot(),
            option.strike(),
            market.rate(),
            market.dividend_yield(),
            sigma,
            market.maturity(),
        )
        .price
            - target_price
    };
    let settings = SolverSettings {
        accuracy: config.tolerance,
        max_iterations: config.max_iterations,
    };
    let vol = match config.solver {
        RootSolver::Brent => brent(objective, config.vol_lower, config.vol_upper, &settings),
        RootSolver::Bisection => bisection(objective, config.vol_lower, config.vol_upper, &settings),
    }?;
    trace!(strike = option.strike(), target_price, vol, "implied vol solved");
    Ok(vol)
}

/// Black–Scholes pricing bound to one scenario.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticEuropeanEngine {
    scenario: MarketScenario,
}

impl AnalyticEuropeanEngine {
    /// Engine for the given scenario.
    pub fn new(scenario: MarketScenario) -> Self {
        Self { scenario }
    }

    /// Price and Greeks of `option`.
    pub fn calculate(&self, option: &VanillaOption) -> GreeksResult {
        let result = greeks(&self.scenario, option);
        debug!(
            option_type = %option.option_type(),
            strike = option.strike(),
            price = result.price,
            "black-scholes priced"
        );
        result
    }
}
