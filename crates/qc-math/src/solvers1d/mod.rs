//! 1D bracketing root-finding solvers.
//!
//! Both solvers take their tolerance and iteration cap explicitly through
//! [`SolverSettings`] and report failures as `Error::Convergence`.

use qc_core::{
    errors::{Error, Result},
    Real,
};
use tracing::trace;

/// Default iteration cap.
pub const MAX_ITERATIONS: u32 = 100;
/// Default absolute accuracy on the root.
pub const DEFAULT_ACCURACY: Real = 1.0e-6;

/// Tolerance and iteration budget of a root solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Absolute accuracy on `x`.
    pub accuracy: Real,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

fn check_bracket(name: &str, x_min: Real, x_max: Real, fa: Real, fb: Real) -> Result<()> {
    if !(x_min < x_max) {
        return Err(Error::invalid_input(
            "bracket",
            (x_min, x_max),
            format!("{name}: x_min must be below x_max"),
        ));
    }
    if !fa.is_finite() || !fb.is_finite() {
        return Err(Error::convergence(
            name,
            0,
            format!("objective not finite at the bracket ends: f({x_min}) = {fa}, f({x_max}) = {fb}"),
        ));
    }
    if fa * fb > 0.0 {
        return Err(Error::convergence(
            name,
            0,
            format!("root not bracketed: f({x_min}) = {fa} and f({x_max}) = {fb} have the same sign"),
        ));
    }
    Ok(())
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method for finding a root of `f(x)` in `[x_min, x_max]`.
///
/// Combines bisection, secant, and inverse quadratic interpolation.
pub fn brent<F>(f: F, x_min: Real, x_max: Real, settings: &SolverSettings) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let acc = settings.accuracy;
    let mut a = x_min;
    let mut b = x_max;
    let mut fa = f(a);
    let mut fb = f(b);

    check_bracket("brent", x_min, x_max, fa, fb)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 0..settings.max_iterations {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * acc;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            trace!(iterations = iteration, root = b, "brent converged");
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                let p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                (p, (q - 1.0) * (r - 1.0) * (s - 1.0))
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()) && 2.0 * p < (e * q).abs() {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol {
            d
        } else if xm > 0.0 {
            tol
        } else {
            -tol
        };
        fb = f(b);
    }
    Err(Error::convergence(
        "brent",
        settings.max_iterations,
        format!("maximum iterations reached (last x = {b}, f(x) = {fb})"),
    ))
}

// ── Bisection ────────────────────────────────────────────────────────────────

/// Simple bisection method.
pub fn bisection<F>(f: F, x_min: Real, x_max: Real, settings: &SolverSettings) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let mut a = x_min;
    let mut b = x_max;
    let fa = f(a);
    let fb = f(b);

    check_bracket("bisection", x_min, x_max, fa, fb)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut f_lo = fa;
    for iteration in 0..settings.max_iterations {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 || (b - a) * 0.5 < settings.accuracy {
            trace!(iterations = iteration, root = mid, "bisection converged");
            return Ok(mid);
        }
        if fm * f_lo > 0.0 {
            a = mid;
            f_lo = fm;
        } else {
            b = mid;
        }
    }
    Err(Error::convergence(
        "bisection",
        settings.max_iterations,
        format!("maximum iterations reached (bracket [{a}, {b}])"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_core::ErrorKind;

    fn tight() -> SolverSettings {
        SolverSettings {
            accuracy: 1e-12,
            max_iterations: 200,
        }
    }

    #[test]
    fn brent_finds_sqrt2() {
        let root = brent(|x| x * x - 2.0, 0.0, 2.0, &tight()).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-10, "root = {root}");
    }

    #[test]
    fn bisection_finds_sqrt2() {
        let root = bisection(|x| x * x - 2.0, 0.0, 2.0, &tight()).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-10, "root = {root}");
    }

    #[test]
    fn brent_cubic() {
        let root = brent(|x| x * x * x - x - 1.0, 1.0, 2.0, &tight()).unwrap();
        assert!((root * root * root - root - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unbracketed_root_is_a_convergence_error() {
        let err = brent(|x| x * x + 1.0, -1.0, 1.0, &SolverSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Convergence);
        let err = bisection(|x| x * x + 1.0, -1.0, 1.0, &SolverSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Convergence);
    }

    #[test]
    fn iteration_cap_is_honoured() {
        let settings = SolverSettings {
            accuracy: 1e-14,
            max_iterations: 3,
        };
        let err = bisection(|x| x - 0.123_456_789, 0.0, 1.0, &settings).unwrap_err();
        assert!(matches!(err, Error::Convergence { iterations: 3, .. }));
    }

    #[test]
    fn inverted_bracket_is_invalid_input() {
        let err = brent(|x| x, 1.0, -1.0, &SolverSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
