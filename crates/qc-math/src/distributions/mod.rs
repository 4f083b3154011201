//! Probability distributions.
//!
//! Normal density, cumulative, and inverse cumulative functions, plus the
//! lognormal helpers shared by every closed-form pricer.

pub mod lognormal;
pub mod normal;

pub use lognormal::{d1_d2, lognormal_expectation};
pub use normal::{normal_cdf, normal_cdf_inverse, normal_pdf};
