//! Engine configuration.
//!
//! [`EngineConfig`] gathers every documented numerical default of the
//! engine: the fallback seed, the implied-volatility bracket and tolerance,
//! the Monte Carlo confidence level, and the smile extrapolation policy.
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`QUANTCAL_*`)
//! 2. TOML config file
//! 3. Default values
//!
//! The configuration is an immutable value handed to each call; there is no
//! process-wide settings singleton.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Real;

/// Seed substituted when a stochastic call omits one.
pub const DEFAULT_SEED: u64 = 123;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The config file could not be read or parsed.
    #[error("config file error: {0}")]
    FileError(String),

    /// A value is outside its admissible range.
    #[error("invalid config value for {key}: {reason}")]
    InvalidValue {
        /// Dotted key of the offending entry.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Behaviour of smile and surface queries outside the fitted strike range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Extend the boundary value flatly. Queries are flagged as extrapolated.
    #[default]
    Constant,
    /// Reject the query with an `InvalidInput` error.
    Forbid,
}

impl FromStr for Extrapolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "constant" => Ok(Extrapolation::Constant),
            "forbid" => Ok(Extrapolation::Forbid),
            other => Err(ConfigError::InvalidValue {
                key: "calibration.extrapolation".into(),
                reason: format!("unknown policy '{other}' (expected constant|forbid)"),
            }),
        }
    }
}

/// Bracketing root solver used by implied-volatility inversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSolver {
    /// Brent's method (inverse quadratic interpolation with bisection safeguard).
    #[default]
    Brent,
    /// Plain bisection.
    Bisection,
}

/// Random sampling defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seed used when a call does not supply one.
    pub default_seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_seed: DEFAULT_SEED,
        }
    }
}

/// Implied-volatility solver settings.
///
/// These are threaded explicitly into every inversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedVolConfig {
    /// Root solver.
    pub solver: RootSolver,
    /// Absolute tolerance on the volatility.
    pub tolerance: Real,
    /// Iteration cap.
    pub max_iterations: u32,
    /// Lower end of the volatility bracket.
    pub vol_lower: Real,
    /// Upper end of the volatility bracket.
    pub vol_upper: Real,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        Self {
            solver: RootSolver::Brent,
            tolerance: 1e-6,
            max_iterations: 100,
            vol_lower: 1e-6,
            vol_upper: 5.0,
        }
    }
}

/// Monte Carlo defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Two-sided confidence level of reported intervals.
    pub confidence_level: Real,
    /// Diagonal regularisation of the control-variate regression.
    pub ridge: Real,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            ridge: 1e-12,
        }
    }
}

/// Calibration defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Smile / surface extrapolation policy.
    pub extrapolation: Extrapolation,
    /// Absolute tolerance of the static-arbitrage sanity checks.
    pub sanity_atol: Real,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            extrapolation: Extrapolation::Constant,
            sanity_atol: 1e-10,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sampling defaults.
    pub sampling: SamplingConfig,
    /// Implied-volatility solver settings.
    pub implied_vol: ImpliedVolConfig,
    /// Monte Carlo defaults.
    pub monte_carlo: MonteCarloConfig,
    /// Calibration defaults.
    pub calibration: CalibrationConfig,
}

impl EngineConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `QUANTCAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Build configuration from all sources.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (environment variables in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QUANTCAL_DEFAULT_SEED") {
            self.sampling.default_seed = parse_value("sampling.default_seed", &v)?;
        }
        if let Some(v) = lookup("QUANTCAL_IV_TOLERANCE") {
            self.implied_vol.tolerance = parse_value("implied_vol.tolerance", &v)?;
        }
        if let Some(v) = lookup("QUANTCAL_IV_MAX_ITERATIONS") {
            self.implied_vol.max_iterations = parse_value("implied_vol.max_iterations", &v)?;
        }
        if let Some(v) = lookup("QUANTCAL_CONFIDENCE_LEVEL") {
            self.monte_carlo.confidence_level = parse_value("monte_carlo.confidence_level", &v)?;
        }
        if let Some(v) = lookup("QUANTCAL_EXTRAPOLATION") {
            self.calibration.extrapolation = v.parse()?;
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let iv = &self.implied_vol;
        if !(iv.tolerance > 0.0 && iv.tolerance.is_finite()) {
            return Err(invalid("implied_vol.tolerance", "must be positive and finite"));
        }
        if iv.max_iterations == 0 {
            return Err(invalid("implied_vol.max_iterations", "must be at least 1"));
        }
        if !(iv.vol_lower > 0.0 && iv.vol_upper > iv.vol_lower && iv.vol_upper.is_finite()) {
            return Err(invalid(
                "implied_vol.vol_lower",
                "bracket must satisfy 0 < vol_lower < vol_upper < inf",
            ));
        }
        let cl = self.monte_carlo.confidence_level;
        if !(cl > 0.0 && cl < 1.0) {
            return Err(invalid("monte_carlo.confidence_level", "must lie in (0, 1)"));
        }
        if !(self.monte_carlo.ridge >= 0.0 && self.monte_carlo.ridge.is_finite()) {
            return Err(invalid("monte_carlo.ridge", "must be non-negative and finite"));
        }
        if !(self.calibration.sanity_atol >= 0.0 && self.calibration.sanity_atol.is_finite()) {
            return Err(invalid("calibration.sanity_atol", "must be non-negative and finite"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        reason: reason.into(),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("cannot parse '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_constants() {
        let c = EngineConfig::default();
        assert_eq!(c.sampling.default_seed, 123);
        assert_eq!(c.implied_vol.tolerance, 1e-6);
        assert_eq!(c.implied_vol.max_iterations, 100);
        assert_eq!(c.implied_vol.vol_lower, 1e-6);
        assert_eq!(c.implied_vol.vol_upper, 5.0);
        assert_eq!(c.monte_carlo.confidence_level, 0.95);
        assert_eq!(c.calibration.extrapolation, Extrapolation::Constant);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = EngineConfig::from_toml_str(
            r#"
            [implied_vol]
            tolerance = 1e-8
            solver = "bisection"

            [calibration]
            extrapolation = "forbid"
            "#,
        )
        .unwrap();
        assert_eq!(c.implied_vol.tolerance, 1e-8);
        assert_eq!(c.implied_vol.solver, RootSolver::Bisection);
        assert_eq!(c.implied_vol.max_iterations, 100);
        assert_eq!(c.calibration.extrapolation, Extrapolation::Forbid);
        assert_eq!(c.sampling.default_seed, 123);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[monte_carlo]\nconfidence_level = 1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("not toml ="),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("QUANTCAL_DEFAULT_SEED", "7"),
            ("QUANTCAL_CONFIDENCE_LEVEL", "0.99"),
            ("QUANTCAL_EXTRAPOLATION", "Forbid"),
        ]
        .into_iter()
        .collect();
        let mut c = EngineConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.sampling.default_seed, 7);
        assert_eq!(c.monte_carlo.confidence_level, 0.99);
        assert_eq!(c.calibration.extrapolation, Extrapolation::Forbid);
    }

    #[test]
    fn unparsable_override_is_an_error() {
        let mut c = EngineConfig::default();
        let err = c
            .apply_overrides(|k| (k == "QUANTCAL_IV_MAX_ITERATIONS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "implied_vol.max_iterations"));
    }
}
