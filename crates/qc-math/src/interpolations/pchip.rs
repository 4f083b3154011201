//! Piecewise cubic Hermite interpolating polynomial (PCHIP).
//!
//! Shape-preserving cubic Hermite interpolation with Fritsch–Butland slopes:
//! interior derivatives are the weighted harmonic mean of the adjacent
//! secants, set to zero at local extrema, so the interpolant never
//! overshoots the data and is monotone wherever the data is. End slopes use
//! the one-sided three-point formula, limited to keep the shape.

use qc_core::{errors::Result, Real};

use super::{locate, validate_nodes, Interpolation1D};

/// Shape-preserving cubic Hermite spline.
#[derive(Debug, Clone)]
pub struct PchipInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
    /// Derivative at each knot
    ds: Vec<Real>,
}

impl PchipInterpolation {
    /// Build a PCHIP interpolant through strictly increasing `xs`.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        validate_nodes(xs, ys)?;
        let n = xs.len();

        let h: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let delta: Vec<Real> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        let mut ds = vec![0.0; n];
        if n == 2 {
            ds[0] = delta[0];
            ds[1] = delta[0];
        } else {
            for k in 1..n - 1 {
                let (d0, d1) = (delta[k - 1], delta[k]);
                if d0 == 0.0 || d1 == 0.0 || d0.signum() != d1.signum() {
                    ds[k] = 0.0;
                } else {
                    let w1 = 2.0 * h[k] + h[k - 1];
                    let w2 = h[k] + 2.0 * h[k - 1];
                    ds[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
                }
            }
            ds[0] = end_slope(h[0], h[1], delta[0], delta[1]);
            ds[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            ds,
        })
    }

    /// Knot derivatives.
    pub fn derivatives(&self) -> &[Real] {
        &self.ds
    }
}

/// Non-centred three-point end slope with shape-preserving limits.
fn end_slope(h0: Real, h1: Real, m0: Real, m1: Real) -> Real {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

impl Interpolation1D for PchipInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        let lo = locate(&self.xs, x);
        let hi = lo + 1;
        let h = self.xs[hi] - self.xs[lo];
        let t = (x - self.xs[lo]) / h;
        // Hermite basis
        let h00 = (1.0 + 2.0 * t) * (1.0 - t) * (1.0 - t);
        let h10 = t * (1.0 - t) * (1.0 - t);
        let h01 = t * t * (3.0 - 2.0 * t);
        let h11 = t * t * (t - 1.0);

        h00 * self.ys[lo] + h10 * h * self.ds[lo] + h01 * self.ys[hi] + h11 * h * self.ds[hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pchip_exact_on_nodes() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 1.0, 1.5, 3.0, 5.0];
        let s = PchipInterpolation::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            let v = s.operator(x);
            assert!((v - y).abs() < 1e-12, "at x={x}: expected {y}, got {v}");
        }
    }

    #[test]
    fn pchip_preserves_monotonicity() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.1, 0.5, 2.0, 4.0];
        let s = PchipInterpolation::new(&xs, &ys).unwrap();
        let mut prev = -1e30;
        for i in 0..=400 {
            let x = 4.0 * (i as f64) / 400.0;
            let v = s.operator(x);
            assert!(v >= prev - 1e-12, "not monotone at x={x}: {v} < {prev}");
            prev = v;
        }
    }

    #[test]
    fn pchip_step_function_does_not_overshoot() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 0.0, 1.0, 1.0];
        let s = PchipInterpolation::new(&xs, &ys).unwrap();
        for i in 0..=300 {
            let x = 3.0 * (i as f64) / 300.0;
            let v = s.operator(x);
            assert!(
                (-1e-12..=1.0 + 1e-12).contains(&v),
                "out of range at x={x}: {v}"
            );
        }
    }

    #[test]
    fn pchip_flat_at_local_extremum() {
        // Smile-shaped data: minimum at the middle node
        let s = PchipInterpolation::new(&[80.0, 90.0, 100.0, 110.0, 120.0], &[0.3, 0.25, 0.2, 0.22, 0.26])
            .unwrap();
        assert_eq!(s.derivatives()[2], 0.0);
        for i in 0..=100 {
            let x = 90.0 + 20.0 * i as f64 / 100.0;
            assert!(s.operator(x) >= 0.2 - 1e-12);
        }
    }

    #[test]
    fn pchip_reproduces_lines() {
        let xs = [0.0, 0.5, 2.0, 3.5];
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 + 2.0 * x).collect();
        let s = PchipInterpolation::new(&xs, &ys).unwrap();
        for x in [0.1, 0.9, 1.7, 3.0] {
            assert!((s.operator(x) - (1.0 + 2.0 * x)).abs() < 1e-12);
        }
    }

    #[test]
    fn two_points_is_linear() {
        let s = PchipInterpolation::new(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert!((s.operator(2.0) - 4.0).abs() < 1e-14);
    }
}
