//! # qc-core
//!
//! Core types, validated market inputs, engine configuration, and error
//! definitions for quantcal.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace – type aliases, the error taxonomy and its
//! `ensure!` macros, [`EngineConfig`], and the immutable request structs
//! ([`MarketInputs`], [`MarketScenario`], [`VanillaOption`]).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Engine configuration (defaults, TOML file, environment overrides).
pub mod config;

/// Error types and the `ensure!` / `ensure_model!` macros.
pub mod errors;

/// Vanilla option description (type and strike).
pub mod option;

/// Validated market scenarios.
pub mod scenario;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use config::{ConfigError, EngineConfig, Extrapolation, RootSolver};
pub use errors::{Error, ErrorKind, Result};
pub use option::{OptionType, VanillaOption};
pub use scenario::{MarketInputs, MarketScenario};
