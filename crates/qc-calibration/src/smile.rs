//! Implied-volatility smiles of a single maturity.
//!
//! [`SmileSlice`] holds validated market points; [`FittedSmile`] interpolates
//! them in strike, by default with the shape-preserving PCHIP cubic, which
//! never overshoots the quoted vols. Outside the quoted strike range the
//! smile is either extended flatly or the query is rejected, according to
//! [`Extrapolation`]; every query reports whether it extrapolated.

use qc_core::{ensure, errors::Error, errors::Result, Extrapolation, Real, Time, Volatility};
use qc_math::{Interpolation1D, LinearInterpolation, PchipInterpolation};
use serde::Serialize;

/// Interpolation scheme of a fitted smile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmileInterpolation {
    /// Piecewise linear.
    Linear,
    /// Shape-preserving cubic Hermite.
    #[default]
    Pchip,
}

/// Quoted implied vols of one maturity, strikes strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmileSlice {
    maturity: Time,
    strikes: Vec<Real>,
    vols: Vec<Volatility>,
}

impl SmileSlice {
    /// Validate and build a slice.
    ///
    /// # Errors
    /// `InvalidInput` unless `maturity > 0`, there are at least two points,
    /// strikes are positive and strictly increasing, and vols are positive
    /// and finite.
    pub fn new(maturity: Time, strikes: Vec<Real>, vols: Vec<Volatility>) -> Result<Self> {
        ensure!(
            maturity.is_finite() && maturity > 0.0,
            "t",
            maturity,
            "slice maturity must be positive and finite"
        );
        ensure!(strikes.len() >= 2, "strikes", strikes, "a smile needs at least two strikes");
        ensure!(
            vols.len() == strikes.len(),
            "vols",
            vols.len(),
            "expected {} vols, one per strike",
            strikes.len()
        );
        ensure!(
            strikes.iter().all(|k| k.is_finite() && *k > 0.0),
            "strikes",
            strikes,
            "strikes must be positive and finite"
        );
        ensure!(
            strikes.windows(2).all(|w| w[1] > w[0]),
            "strikes",
            strikes,
            "strikes must be strictly increasing"
        );
        ensure!(
            vols.iter().all(|v| v.is_finite() && *v > 0.0),
            "vols",
            vols,
            "vols must be positive and finite"
        );
        Ok(Self {
            maturity,
            strikes,
            vols,
        })
    }

    /// Like [`SmileSlice::new`], sorting the points by strike first.
    /// Duplicate strikes are still rejected.
    pub fn from_unsorted(maturity: Time, strikes: &[Real], vols: &[Volatility]) -> Result<Self> {
        ensure!(
            vols.len() == strikes.len(),
            "vols",
            vols.len(),
            "expected {} vols, one per strike",
            strikes.len()
        );
        let mut points: Vec<(Real, Volatility)> = strikes.iter().copied().zip(vols.iter().copied()).collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (strikes, vols) = points.into_iter().unzip();
        Self::new(maturity, strikes, vols)
    }

    /// Maturity of the slice.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Strikes, increasing.
    pub fn strikes(&self) -> &[Real] {
        &self.strikes
    }

    /// Vols, aligned with [`strikes`](Self::strikes).
    pub fn vols(&self) -> &[Volatility] {
        &self.vols
    }
}

/// A smile query result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmileQuery {
    /// Interpolated volatility.
    pub vol: Volatility,
    /// `true` if the strike was outside the quoted range.
    pub extrapolated: bool,
}

#[derive(Debug, Clone)]
enum Curve {
    Linear(LinearInterpolation),
    Pchip(PchipInterpolation),
}

impl Curve {
    fn build(kind: SmileInterpolation, xs: &[Real], ys: &[Real]) -> Result<Self> {
        Ok(match kind {
            SmileInterpolation::Linear => Curve::Linear(LinearInterpolation::new(xs, ys)?),
            SmileInterpolation::Pchip => Curve::Pchip(PchipInterpolation::new(xs, ys)?),
        })
    }

    fn interpolation(&self) -> &dyn Interpolation1D {
        match self {
            Curve::Linear(c) => c,
            Curve::Pchip(c) => c,
        }
    }
}

/// An interpolated smile, immutable once built.
#[derive(Debug, Clone)]
pub struct FittedSmile {
    kind: SmileInterpolation,
    extrapolation: Extrapolation,
    curve: Curve,
}

impl FittedSmile {
    /// Interpolate `slice` with `kind`.
    pub fn new(slice: &SmileSlice, kind: SmileInterpolation, extrapolation: Extrapolation) -> Result<Self> {
        Ok(Self {
            kind,
            extrapolation,
            curve: Curve::build(kind, slice.strikes(), slice.vols())?,
        })
    }

    /// Interpolation scheme.
    pub fn kind(&self) -> SmileInterpolation {
        self.kind
    }

    /// Lowest quoted strike.
    pub fn min_strike(&self) -> Real {
        self.curve.interpolation().x_min()
    }

    /// Highest quoted strike.
    pub fn max_strike(&self) -> Real {
        self.curve.interpolation().x_max()
    }

    /// Volatility at `strike`, with the extrapolation flag.
    ///
    /// # Errors
    /// `InvalidInput` for a non-positive strike, or for a strike outside the
    /// quoted range under [`Extrapolation::Forbid`].
    pub fn query(&self, strike: Real) -> Result<SmileQuery> {
        ensure!(strike.is_finite() && strike > 0.0, "k", strike, "strike must be positive and finite");
        let curve = self.curve.interpolation();
        let extrapolated = !curve.is_in_range(strike);
        if extrapolated && self.extrapolation == Extrapolation::Forbid {
            return Err(Error::invalid_input(
                "k",
                strike,
                format!("strike outside the quoted range [{}, {}]", curve.x_min(), curve.x_max()),
            ));
        }
        let clamped = strike.clamp(curve.x_min(), curve.x_max());
        Ok(SmileQuery {
            vol: curve.operator(clamped),
            extrapolated,
        })
    }

    /// Volatility at `strike`.
    pub fn vol(&self, strike: Real) -> Result<Volatility> {
        self.query(strike).map(|q| q.vol)
    }
}

/// Fit a smile through `(strikes, vols)` with the given scheme.
///
/// Points are sorted by strike first; duplicates are rejected.
pub fn fit_iv_smile(
    strikes: &[Real],
    vols: &[Volatility],
    kind: SmileInterpolation,
    extrapolation: Extrapolation,
) -> Result<FittedSmile> {
    // the maturity of a standalone smile plays no role in strike interpolation
    let slice = SmileSlice::from_unsorted(1.0, strikes, vols)?;
    FittedSmile::new(&slice, kind, extrapolation)
}

/// Shape-preserving PCHIP smile with constant extrapolation.
pub fn fit_iv_smile_pchip(strikes: &[Real], vols: &[Volatility]) -> Result<FittedSmile> {
    fit_iv_smile(strikes, vols, SmileInterpolation::Pchip, Extrapolation::Constant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qc_core::ErrorKind;

    #[test]
    fn exact_at_knots() {
        let strikes = [90.0, 100.0, 110.0];
        let vols = [0.25, 0.20, 0.23];
        for kind in [SmileInterpolation::Pchip, SmileInterpolation::Linear] {
            let smile = fit_iv_smile(&strikes, &vols, kind, Extrapolation::Constant).unwrap();
            for (k, v) in strikes.iter().zip(vols) {
                assert_abs_diff_eq!(smile.vol(*k).unwrap(), v, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn pchip_stays_within_neighbours() {
        let smile = fit_iv_smile_pchip(&[80.0, 90.0, 100.0, 110.0, 120.0], &[0.32, 0.26, 0.21, 0.20, 0.22]).unwrap();
        let v = smile.vol(95.0).unwrap();
        assert!(v < 0.26 && v > 0.21, "vol {v}");
        // a local minimum of the data is not undershot
        for k in [100.0, 102.5, 105.0, 107.5, 110.0] {
            assert!(smile.vol(k).unwrap() >= 0.20 - 1e-12);
        }
    }

    #[test]
    fn linear_midpoint() {
        let smile = fit_iv_smile(&[90.0, 110.0], &[0.3, 0.2], SmileInterpolation::Linear, Extrapolation::Constant)
            .unwrap();
        assert_abs_diff_eq!(smile.vol(100.0).unwrap(), 0.25, epsilon = 1e-15);
        assert_eq!(smile.kind(), SmileInterpolation::Linear);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let smile = fit_iv_smile_pchip(&[110.0, 90.0, 100.0], &[0.23, 0.25, 0.20]).unwrap();
        assert_eq!(smile.min_strike(), 90.0);
        assert_eq!(smile.max_strike(), 110.0);
        assert_abs_diff_eq!(smile.vol(90.0).unwrap(), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn duplicates_rejected() {
        let err = fit_iv_smile_pchip(&[100.0, 90.0, 100.0], &[0.2, 0.25, 0.21]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(SmileSlice::new(1.0, vec![100.0, 90.0], vec![0.2, 0.2]).is_err());
    }

    #[test]
    fn extrapolation_policies() {
        let constant = fit_iv_smile_pchip(&[90.0, 100.0, 110.0], &[0.25, 0.20, 0.23]).unwrap();
        let q = constant.query(150.0).unwrap();
        assert!(q.extrapolated);
        assert_abs_diff_eq!(q.vol, 0.23, epsilon = 1e-15);
        assert!(!constant.query(100.0).unwrap().extrapolated);

        let forbid = fit_iv_smile(
            &[90.0, 100.0, 110.0],
            &[0.25, 0.20, 0.23],
            SmileInterpolation::Pchip,
            Extrapolation::Forbid,
        )
        .unwrap();
        assert_eq!(forbid.query(80.0).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(forbid.query(110.0).is_ok());
    }

    #[test]
    fn slice_validation() {
        assert!(SmileSlice::new(0.0, vec![90.0, 100.0], vec![0.2, 0.2]).is_err());
        assert!(SmileSlice::new(1.0, vec![100.0], vec![0.2]).is_err());
        assert!(SmileSlice::new(1.0, vec![90.0, 100.0], vec![0.2, -0.1]).is_err());
        assert!(SmileSlice::new(1.0, vec![90.0, 100.0], vec![0.2]).is_err());
    }
}
