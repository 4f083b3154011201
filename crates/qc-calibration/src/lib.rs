//! # qc-calibration
//!
//! Implied-volatility calibration built on the Black–Scholes inversion of
//! `qc-pricingengines`:
//!
//! * [`implied_vols_from_prices`] — strike-by-strike inversion with per-point failures
//! * [`fit_iv_smile_pchip`] / [`fit_iv_smile`] — shape-preserving or linear smiles
//! * [`iv_surface_total_variance`] — surface interpolated in total variance
//! * [`sanity_check_call_prices_convex_in_strike`] — advisory static-arbitrage checks

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod implied_vols;
pub mod sanity;
pub mod smile;
pub mod surface;

pub use implied_vols::{implied_vols_from_prices, ImpliedVolBatch};
pub use sanity::{sanity_check_call_prices_convex_in_strike, SanityReport, SanityViolation, ViolationKind};
pub use smile::{fit_iv_smile, fit_iv_smile_pchip, FittedSmile, SmileInterpolation, SmileQuery, SmileSlice};
pub use surface::{iv_surface_total_variance, CalendarViolation, ForwardCurve, IvSurface, SurfaceQuery};
