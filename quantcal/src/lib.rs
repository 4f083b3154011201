//! # quantcal
//!
//! Deterministic option pricing and implied-volatility calibration.
//!
//! This crate is a **façade** over the `qc-*` workspace crates. It adds the
//! [`Engine`], whose entry points wrap every result in a provenance
//! envelope (package version, request id and hash, effective seed,
//! runtime), and a one-call tracing setup.
//!
//! ```rust
//! use quantcal::{core::{MarketScenario, VanillaOption}, Engine};
//!
//! let engine = Engine::default();
//! let scenario = MarketScenario::new(100.0, 0.05, 0.0, 1.0, 0.2).unwrap();
//! let call = VanillaOption::call(100.0).unwrap();
//! let out = engine.greeks(&scenario, &call).unwrap();
//! assert!((out.result.price - 10.450_583_572_185_565).abs() < 1e-10);
//! assert_eq!(out.provenance.request_hash.len(), 64);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, configuration, and errors.
pub use qc_core as core;

/// Distributions, solvers, interpolation, statistics, sampling.
pub use qc_math as math;

/// Lattice and Monte Carlo methods.
pub use qc_methods as methods;

/// Pricing engines.
pub use qc_pricingengines as pricingengines;

/// Implied vols, smiles, surfaces, sanity checks.
pub use qc_calibration as calibration;

/// Engine entry points.
pub mod engine;

/// Tracing subscriber setup.
pub mod logging;

/// Provenance envelope.
pub mod provenance;

pub use engine::Engine;
pub use logging::init_tracing;
pub use provenance::{Enveloped, Provenance, RuntimeInfo};
