//! Regression control variates.
//!
//! Given target samples `x` and control samples `Y` (one column per control,
//! each with a known expectation `μ`), the coefficients solve
//! `β = (Cov(Y) + λI)⁻¹ Cov(Y, x)` and the adjusted samples are
//! `x + (μ − Y)·β`. The adjusted mean is unbiased for `E[x]` whatever `β`,
//! and the regression `β` minimises its variance.

use nalgebra::{DMatrix, DVector};
use qc_core::{ensure, errors::Result, Real};
use qc_math::{matrix_utilities::solve_regularized, Statistics};
use tracing::debug;

/// Outcome of a control-variate regression.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlVariateFit {
    /// Variance-reduced samples.
    pub adjusted: Vec<Real>,
    /// Regression coefficients, one per control.
    pub beta: Vec<Real>,
    /// Sample standard deviation of the raw target.
    pub sd_baseline: Real,
    /// Sample standard deviation of the adjusted samples.
    pub sd_adjusted: Real,
    /// `sd_baseline / sd_adjusted`, infinite when the adjusted samples are constant.
    pub variance_reduction_ratio: Real,
}

/// Fit `β` by ridge-regularised least squares and adjust `target`.
///
/// # Errors
/// * `InvalidInput` when there are no controls, fewer than two samples, or
///   the column lengths disagree.
/// * `ModelInvalid` when the control covariance cannot be inverted.
pub fn control_variate_adjust(
    target: &[Real],
    controls: &[Vec<Real>],
    control_means: &[Real],
    ridge: Real,
) -> Result<ControlVariateFit> {
    let n = target.len();
    let k = controls.len();
    ensure!(k >= 1, "controls", k, "at least one control is required");
    ensure!(
        control_means.len() == k,
        "control_means",
        control_means.len(),
        "expected one mean per control ({k})"
    );
    ensure!(n >= 2, "n_paths", n, "need at least 2 samples to estimate beta");
    ensure!(
        controls.iter().all(|c| c.len() == n),
        "controls",
        controls.iter().map(Vec::len).collect::<Vec<_>>(),
        "every control needs {n} samples"
    );

    // n >= 2, so every mean and deviation below is defined
    let denom = n as Real - 1.0;
    let target_stats: Statistics = target.iter().copied().collect();
    let mean_x = target_stats.mean().unwrap_or(Real::NAN);
    let mean_y: Vec<Real> = controls
        .iter()
        .map(|c| c.iter().copied().collect::<Statistics>().mean().unwrap_or(Real::NAN))
        .collect();

    let cov_yy = DMatrix::from_fn(k, k, |a, b| {
        controls[a]
            .iter()
            .zip(&controls[b])
            .map(|(ya, yb)| (ya - mean_y[a]) * (yb - mean_y[b]))
            .sum::<Real>()
            / denom
    });
    let cov_yx = DVector::from_fn(k, |a, _| {
        controls[a]
            .iter()
            .zip(target)
            .map(|(y, x)| (y - mean_y[a]) * (x - mean_x))
            .sum::<Real>()
            / denom
    });
    let beta = solve_regularized(&cov_yy, &cov_yx, ridge)?;

    let adjusted: Vec<Real> = (0..n)
        .map(|i| {
            target[i]
                + (0..k)
                    .map(|a| (control_means[a] - controls[a][i]) * beta[a])
                    .sum::<Real>()
        })
        .collect();

    let sd_baseline = target_stats.std_dev().unwrap_or(Real::NAN);
    let sd_adjusted = adjusted.iter().copied().collect::<Statistics>().std_dev().unwrap_or(Real::NAN);
    let variance_reduction_ratio = if sd_adjusted > 0.0 {
        sd_baseline / sd_adjusted
    } else {
        Real::INFINITY
    };
    debug!(controls = k, ?beta, variance_reduction_ratio, "control variates fitted");

    Ok(ControlVariateFit {
        adjusted,
        beta: beta.iter().copied().collect(),
        sd_baseline,
        sd_adjusted,
        variance_reduction_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qc_core::ErrorKind;

    #[test]
    fn perfect_control_removes_all_variance() {
        let y: Vec<Real> = (0..10).map(|i| i as Real).collect();
        let x: Vec<Real> = y.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = control_variate_adjust(&x, &[y], &[4.5], 0.0).unwrap();
        assert_abs_diff_eq!(fit.beta[0], 2.0, epsilon = 1e-12);
        assert!(fit.adjusted.iter().all(|v| (v - 12.0).abs() < 1e-10));
        assert!(fit.sd_adjusted < 1e-10);
        assert!(fit.variance_reduction_ratio > 1e6);
    }

    #[test]
    fn adjustment_shifts_mean_toward_known_expectation() {
        // x = y + noise; sample mean of y is 1 but E[y] = 0
        let y = vec![0.0, 1.0, 2.0, 1.0];
        let x = vec![0.1, 0.9, 2.1, 0.9];
        let fit = control_variate_adjust(&x, &[y], &[0.0], 1e-12).unwrap();
        let stats: Statistics = fit.adjusted.iter().copied().collect();
        let m = stats.mean().unwrap();
        assert!(m.abs() < 0.05, "adjusted mean {m}");
        let raw: Statistics = x.iter().copied().collect();
        assert_abs_diff_eq!(fit.sd_baseline, raw.std_dev().unwrap(), epsilon = 1e-15);
    }

    #[test]
    fn two_controls() {
        let y1: Vec<Real> = (0..20).map(|i| (i as Real).sin()).collect();
        let y2: Vec<Real> = (0..20).map(|i| (i as Real * 0.7).cos()).collect();
        let x: Vec<Real> = (0..20).map(|i| 1.0 + 0.5 * y1[i] - 1.5 * y2[i]).collect();
        let fit = control_variate_adjust(&x, &[y1, y2], &[0.0, 0.0], 1e-12).unwrap();
        assert_abs_diff_eq!(fit.beta[0], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.beta[1], -1.5, epsilon = 1e-8);
    }

    #[test]
    fn constant_control_without_ridge_is_model_invalid() {
        let err = control_variate_adjust(&[1.0, 2.0, 3.0], &[vec![1.0; 3]], &[1.0], 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelInvalid);
    }

    #[test]
    fn shape_errors() {
        assert!(control_variate_adjust(&[1.0, 2.0], &[], &[], 0.0).is_err());
        assert!(control_variate_adjust(&[1.0], &[vec![1.0]], &[0.0], 0.0).is_err());
        assert!(control_variate_adjust(&[1.0, 2.0], &[vec![1.0]], &[0.0], 0.0).is_err());
    }
}
