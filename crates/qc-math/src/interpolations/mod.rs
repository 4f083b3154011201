//! 1D interpolation trait and implementations.
//!
//! Both interpolants extend their boundary values flatly outside
//! `[x_min, x_max]`; whether such a query is acceptable is decided by the
//! caller through [`Interpolation1D::is_in_range`].

pub mod pchip;

pub use pchip::PchipInterpolation;

use qc_core::{ensure, errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Check interpolation nodes: at least two points, equal lengths, finite
/// values, strictly increasing abscissae.
pub(crate) fn validate_nodes(xs: &[Real], ys: &[Real]) -> Result<()> {
    ensure!(xs.len() >= 2, "xs", xs.len(), "need at least 2 points for interpolation");
    ensure!(
        xs.len() == ys.len(),
        "ys",
        ys.len(),
        "xs and ys must have the same length ({})",
        xs.len()
    );
    ensure!(xs.iter().all(|x| x.is_finite()), "xs", xs, "abscissae must be finite");
    ensure!(ys.iter().all(|y| y.is_finite()), "ys", ys, "ordinates must be finite");
    ensure!(
        xs.windows(2).all(|w| w[1] > w[0]),
        "xs",
        xs,
        "abscissae must be strictly increasing"
    );
    Ok(())
}

/// Index `i` of the interval `[xs[i], xs[i+1]]` containing `x`, clamped to
/// the first and last interval.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    // partition_point returns the first index with xs[i] > x
    xs.partition_point(|&xi| xi <= x) - 1
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// `InvalidInput` if the nodes are fewer than two, of different lengths,
    /// non-finite, or not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        validate_nodes(xs, ys)?;
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        if x <= self.x_min() {
            return self.ys[0];
        }
        if x >= self.x_max() {
            return self.ys[self.ys.len() - 1];
        }
        let i = locate(&self.xs, x);
        let dx = self.xs[i + 1] - self.xs[i];
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }
}
