//! Statistics accumulator and Monte Carlo confidence intervals.

use qc_core::{ensure, errors::Result, Real};
use serde::Serialize;

use crate::distributions::normal_cdf_inverse;

/// Incremental statistics accumulator.
///
/// Welford updates: mean and unbiased variance stay accurate when the
/// samples have a large mean relative to their spread.
#[derive(Debug, Clone)]
pub struct Statistics {
    count: usize,
    mean: Real,
    m2: Real,
    min: Real,
    max: Real,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a single sample.
    pub fn add(&mut self, x: Real) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as Real;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Number of samples.
    pub fn samples(&self) -> usize {
        self.count
    }

    /// Mean.  Returns `None` if no samples have been added.
    pub fn mean(&self) -> Option<Real> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased (Bessel-corrected) variance.  Returns `None` for fewer than
    /// 2 samples.
    pub fn variance(&self) -> Option<Real> {
        (self.count >= 2).then(|| self.m2 / (self.count as Real - 1.0))
    }

    /// Standard deviation.  Returns `None` for fewer than 2 samples.
    pub fn std_dev(&self) -> Option<Real> {
        self.variance().map(|v| v.sqrt())
    }

    /// Standard error of the mean, `s / √n`.
    pub fn error_estimate(&self) -> Option<Real> {
        self.std_dev().map(|s| s / (self.count as Real).sqrt())
    }

    /// Minimum sample value.  Returns `None` if no samples have been added.
    pub fn minimum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.min)
    }

    /// Maximum sample value.  Returns `None` if no samples have been added.
    pub fn maximum(&self) -> Option<Real> {
        (self.count > 0).then_some(self.max)
    }
}

impl FromIterator<Real> for Statistics {
    fn from_iter<I: IntoIterator<Item = Real>>(iter: I) -> Self {
        let mut s = Statistics::new();
        for x in iter {
            s.add(x);
        }
        s
    }
}

/// Mean with standard error and a two-sided normal confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanEstimate {
    /// Sample mean.
    pub mean: Real,
    /// Sample standard deviation.
    pub std_dev: Real,
    /// Standard error of the mean.
    pub std_error: Real,
    /// Lower end of the confidence interval.
    pub ci_low: Real,
    /// Upper end of the confidence interval.
    pub ci_high: Real,
    /// Number of samples.
    pub n: usize,
    /// Confidence level of the interval.
    pub confidence_level: Real,
}

/// Two-sided normal quantile `z_{α/2}` for a confidence level `1 − α`.
pub fn z_score(confidence_level: Real) -> Result<Real> {
    ensure!(
        confidence_level > 0.0 && confidence_level < 1.0,
        "confidence_level",
        confidence_level,
        "must lie in (0, 1)"
    );
    let alpha = 1.0 - confidence_level;
    Ok(normal_cdf_inverse(1.0 - 0.5 * alpha))
}

/// Mean, standard error, and `mean ± z·SE` over `samples`.
///
/// # Errors
/// `InvalidInput` for fewer than two samples, non-finite samples, or a
/// confidence level outside `(0, 1)`.
pub fn mean_confidence_interval(samples: &[Real], confidence_level: Real) -> Result<MeanEstimate> {
    let z = z_score(confidence_level)?;
    ensure!(
        samples.len() >= 2,
        "n_samples",
        samples.len(),
        "need at least 2 samples for a standard error"
    );
    let stats: Statistics = samples.iter().copied().collect();
    let mean = stats.mean;
    let std_dev = (stats.m2 / (stats.count as Real - 1.0)).sqrt();
    let std_error = std_dev / (stats.count as Real).sqrt();
    ensure!(
        mean.is_finite() && std_dev.is_finite(),
        "samples",
        (mean, std_dev),
        "samples contain non-finite values"
    );
    Ok(MeanEstimate {
        mean,
        std_dev,
        std_error,
        ci_low: mean - z * std_error,
        ci_high: mean + z * std_error,
        n: samples.len(),
        confidence_level,
    })
}
