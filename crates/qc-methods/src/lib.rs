//! # qc-methods
//!
//! Numerical methods: the Cox–Ross–Rubinstein lattice with backward
//! induction, and the Monte Carlo framework (sample generators, path
//! pricers, control-variate regression).
//!
//! # Modules
//!
//! * [`lattice`] — binomial tree, time grid, European/American roll-back
//! * [`monte_carlo`] — GBM paths, correlated terminal values, pricers,
//!   control variates

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Lattice methods: binomial tree, backward induction.
pub mod lattice;

/// Monte Carlo simulation: sample generation, pricing, control variates.
pub mod monte_carlo;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use lattice::{price_american, price_european, BinomialTree, TimeGrid};
pub use monte_carlo::{
    control_variate_adjust, pair_average, ControlVariateFit, CorrelatedTerminalGenerator,
    GbmPathGenerator, MonteCarloModel, Path, PathPricer, SampleGenerator,
};
