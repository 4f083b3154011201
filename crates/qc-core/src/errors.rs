//! Error types for quantcal.
//!
//! Every fallible operation in the workspace returns [`Error`], a single
//! `thiserror`-derived enum with three kinds:
//!
//! * [`Error::InvalidInput`] – malformed or out-of-domain inputs,
//! * [`Error::ModelInvalid`] – consistent inputs producing a degenerate model,
//! * [`Error::Convergence`] – an iterative solver failed or its target lies
//!   outside the attainable range.
//!
//! The [`ensure!`](crate::ensure) and [`ensure_model!`](crate::ensure_model)
//! macros return early with a structured error carrying the offending field
//! and value.

use serde::Serialize;
use thiserror::Error;

/// The top-level error type used throughout quantcal.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Error {
    /// Out-of-domain or malformed input.
    #[error("invalid input `{field}` = {value}: {reason}")]
    InvalidInput {
        /// Name of the offending field.
        field: String,
        /// Debug rendering of the offending value.
        value: String,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// Inputs are individually valid but the resulting model is degenerate.
    #[error("{model} model is degenerate: {reason}")]
    ModelInvalid {
        /// Model that could not be built (e.g. `"crr"`, `"cholesky"`).
        model: String,
        /// Description including the triggering values.
        reason: String,
    },

    /// An iterative procedure did not reach its tolerance.
    #[error("{solver} failed after {iterations} iterations: {reason}")]
    Convergence {
        /// Name of the solver.
        solver: String,
        /// Iterations performed before giving up.
        iterations: u32,
        /// Description including the triggering values.
        reason: String,
    },
}

/// Fieldless tag of an [`Error`], used in per-item batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::InvalidInput`].
    InvalidInput,
    /// See [`Error::ModelInvalid`].
    ModelInvalid,
    /// See [`Error::Convergence`].
    Convergence,
}

impl Error {
    /// Build an [`Error::InvalidInput`].
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl std::fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidInput {
            field: field.into(),
            value: format!("{value:?}"),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::ModelInvalid`].
    pub fn model_invalid(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ModelInvalid {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::Convergence`].
    pub fn convergence(solver: impl Into<String>, iterations: u32, reason: impl Into<String>) -> Self {
        Error::Convergence {
            solver: solver.into(),
            iterations,
            reason: reason.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::ModelInvalid { .. } => ErrorKind::ModelInvalid,
            Error::Convergence { .. } => ErrorKind::Convergence,
        }
    }
}

/// Shorthand `Result` type used throughout quantcal.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return `Err(Error::InvalidInput { .. })` if `$cond` is false.
///
/// # Example
/// ```
/// use qc_core::{ensure, errors::{Error, ErrorKind}};
/// fn positive(x: f64) -> qc_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x", x, "must be positive");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert_eq!(positive(-1.0).unwrap_err().kind(), ErrorKind::InvalidInput);
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $field:expr, $value:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::invalid_input(
                $field,
                &$value,
                format!($($msg)*),
            ));
        }
    };
}

/// Return `Err(Error::ModelInvalid { .. })` if `$cond` is false.
///
/// # Example
/// ```
/// use qc_core::{ensure_model, errors::ErrorKind};
/// fn probability(p: f64) -> qc_core::errors::Result<f64> {
///     ensure_model!(p > 0.0 && p < 1.0, "crr", "p = {p} outside (0, 1)");
///     Ok(p)
/// }
/// assert!(probability(0.5).is_ok());
/// assert_eq!(probability(1.2).unwrap_err().kind(), ErrorKind::ModelInvalid);
/// ```
#[macro_export]
macro_rules! ensure_model {
    ($cond:expr, $model:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::model_invalid(
                $model,
                format!($($msg)*),
            ));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(x: f64) -> Result<f64> {
        ensure!(x.is_finite(), "spot", x, "must be finite");
        ensure_model!(x < 10.0, "toy", "x = {x} too large");
        Ok(x)
    }

    #[test]
    fn ensure_reports_field_and_value() {
        let err = check(f64::NAN).unwrap_err();
        match err {
            Error::InvalidInput { field, value, .. } => {
                assert_eq!(field, "spot");
                assert_eq!(value, "NaN");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ensure_model_kind() {
        assert_eq!(check(11.0).unwrap_err().kind(), ErrorKind::ModelInvalid);
        assert_eq!(check(1.0), Ok(1.0));
    }

    #[test]
    fn display_mentions_solver() {
        let e = Error::convergence("brent", 100, "maximum iterations reached");
        assert_eq!(
            e.to_string(),
            "brent failed after 100 iterations: maximum iterations reached"
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let e = Error::invalid_input("n", 3usize, "must be even");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "invalid_input");
        assert_eq!(json["field"], "n");
        assert_eq!(json["value"], "3");
    }
}
