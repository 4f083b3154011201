//! # qc-pricingengines
//!
//! Pricing engines for vanilla and path-dependent options.
//!
//! ## Engines
//!
//! - [`AnalyticEuropeanEngine`] — Black-Scholes-Merton price, Greeks and implied volatility
//! - [`binomial_price`] — Cox–Ross–Rubinstein lattice, European and American exercise
//! - [`geometric_asian_price`] — closed-form geometric-average Asian
//! - [`geometric_basket_price`] — closed-form geometric basket
//! - [`price_path_dependent`] — Monte Carlo for arithmetic Asians and baskets,
//!   with antithetic, quasi-random and control-variate variance reduction

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod asian_engine;
pub mod basket_engine;
pub mod binomial_engine;
pub mod monte_carlo_engine;

pub use analytic_european_engine::{
    black_scholes_merton, implied_volatility, price_bounds, put_call_parity_residual, AnalyticEuropeanEngine,
    GreeksResult,
};
pub use asian_engine::{geometric_asian_price, AsianOption};
pub use basket_engine::{discounted_linear_basket_mean, geometric_basket_price, BasketMarket, BasketOption};
pub use binomial_engine::{binomial_price, one_step_replication, Exercise, ReplicationResult};
pub use monte_carlo_engine::{
    price_asian, price_basket, price_path_dependent, ControlVariate, ControlVariateDiagnostics, McEstimate,
    McSettings, PathDependentRequest, VarianceReduction,
};
