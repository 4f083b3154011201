//! # qc-math
//!
//! Mathematical utilities: normal and lognormal primitives (via statrs),
//! bracketing root solvers, shape-preserving interpolation, statistics and
//! confidence intervals, seeded pseudo-random and low-discrepancy sampling,
//! and matrix helpers (over nalgebra).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Probability distributions.
pub mod distributions;

/// 1D interpolation schemes.
pub mod interpolations;

/// Correlation validation, Cholesky factorisation, regularised solves.
pub mod matrix_utilities;

/// Random number generators and sampling methods.
pub mod random_numbers;

/// 1D root-finding solvers.
pub mod solvers1d;

/// Statistics accumulators and confidence intervals.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::{d1_d2, lognormal_expectation, normal_cdf, normal_cdf_inverse, normal_pdf};
pub use interpolations::{Interpolation1D, LinearInterpolation, PchipInterpolation};
pub use random_numbers::{draw, draw_normals, draw_uniforms, SampleDraw, SamplingMethod};
pub use solvers1d::{SolverSettings, DEFAULT_ACCURACY, MAX_ITERATIONS};
pub use statistics::{MeanEstimate, Statistics};
