//! Static-arbitrage sanity checks on call prices of one maturity.
//!
//! Without static arbitrage, call prices are non-increasing and convex in
//! strike. The check reports flags and offending points; it never fails on
//! a violation.

use qc_core::{ensure, errors::Result, Real};
use serde::Serialize;
use tracing::warn;

/// The no-arbitrage property a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// `C(K_{i+1}) > C(K_i)`.
    Monotonicity,
    /// The slope decreases across `K_i`.
    Convexity,
}

/// One offending point, indexed into the strike-sorted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SanityViolation {
    /// Property broken.
    pub kind: ViolationKind,
    /// Sorted index: the left point of a monotonicity pair, the middle
    /// point of a convexity triple.
    pub index: usize,
    /// Strike at `index`.
    pub strike: Real,
    /// Price increase, or slope decrease.
    pub amount: Real,
}

/// Outcome of [`sanity_check_call_prices_convex_in_strike`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanityReport {
    /// Prices are non-increasing in strike (within tolerance).
    pub monotonic: bool,
    /// Prices are convex in strike (within tolerance).
    pub convex: bool,
    /// Largest `C(K_{i+1}) − C(K_i)`; positive values are violations.
    pub worst_monotone_step: Real,
    /// Smallest change of slope; negative values are violations.
    pub worst_convexity: Real,
    /// Every offending point.
    pub violations: Vec<SanityViolation>,
}

/// Check that call prices are non-increasing and convex in strike.
///
/// Points are sorted by strike first. Convexity compares consecutive
/// slopes, so unevenly spaced strikes are handled. Violations are logged
/// and reported, never raised.
///
/// # Errors
/// `InvalidInput` only for malformed input: different lengths, non-finite
/// values, or repeated strikes.
pub fn sanity_check_call_prices_convex_in_strike(
    strikes: &[Real],
    call_prices: &[Real],
    atol: Real,
) -> Result<SanityReport> {
    ensure!(
        call_prices.len() == strikes.len(),
        "call_prices",
        call_prices.len(),
        "expected {} prices, one per strike",
        strikes.len()
    );
    ensure!(
        strikes.iter().chain(call_prices).all(|x| x.is_finite()),
        "strikes",
        strikes,
        "strikes and prices must be finite"
    );
    ensure!(atol.is_finite() && atol >= 0.0, "atol", atol, "tolerance must be non-negative");

    let mut points: Vec<(Real, Real)> = strikes.iter().copied().zip(call_prices.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    ensure!(
        points.windows(2).all(|w| w[1].0 > w[0].0),
        "strikes",
        strikes,
        "strikes must be distinct"
    );

    let mut violations = Vec::new();
    let mut worst_monotone_step = Real::NEG_INFINITY;
    for (i, w) in points.windows(2).enumerate() {
        let step = w[1].1 - w[0].1;
        worst_monotone_step = worst_monotone_step.max(step);
        if step > atol {
            violations.push(SanityViolation {
                kind: ViolationKind::Monotonicity,
                index: i,
                strike: w[0].0,
                amount: step,
            });
        }
    }

    let slopes: Vec<Real> = points.windows(2).map(|w| (w[1].1 - w[0].1) / (w[1].0 - w[0].0)).collect();
    let mut worst_convexity = Real::INFINITY;
    for (i, s) in slopes.windows(2).enumerate() {
        let change = s[1] - s[0];
        worst_convexity = worst_convexity.min(change);
        if change < -atol {
            violations.push(SanityViolation {
                kind: ViolationKind::Convexity,
                index: i + 1,
                strike: points[i + 1].0,
                amount: change,
            });
        }
    }

    let report = SanityReport {
        monotonic: violations.iter().all(|v| v.kind != ViolationKind::Monotonicity),
        convex: violations.iter().all(|v| v.kind != ViolationKind::Convexity),
        worst_monotone_step: if worst_monotone_step.is_finite() { worst_monotone_step } else { 0.0 },
        worst_convexity: if worst_convexity.is_finite() { worst_convexity } else { 0.0 },
        violations,
    };
    if !report.violations.is_empty() {
        warn!(
            monotonic = report.monotonic,
            convex = report.convex,
            count = report.violations.len(),
            "call prices violate static no-arbitrage"
        );
    }
    Ok(report)
}
