//! Implied-volatility surface by total-variance interpolation.
//!
//! Each smile slice is moved to log-moneyness `k = ln(K / F(T))` and turned
//! into total variance `w = σ²·T`, which is interpolated in `k` with PCHIP.
//! Across maturities `w` is interpolated linearly in `T` at fixed `k`, and a
//! query returns `σ = √(w / T)`.
//!
//! Outside the maturity range the volatility of the nearest slice is held
//! flat (`w ∝ T`), which also sends `w` to zero at `T = 0`.

use qc_core::{
    config::CalibrationConfig, ensure, errors::Error, errors::Result, Extrapolation, Rate, Real, Time,
    Volatility,
};
use qc_math::{Interpolation1D, PchipInterpolation};
use serde::Serialize;
use tracing::{debug, warn};

use crate::smile::SmileSlice;

/// Spot, rate, and dividend yield defining the forward `F(T) = S0·e^{(r − q)T}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForwardCurve {
    spot: Real,
    rate: Rate,
    dividend_yield: Rate,
}

impl ForwardCurve {
    /// Validate and build a forward curve.
    pub fn new(spot: Real, rate: Rate, dividend_yield: Rate) -> Result<Self> {
        ensure!(spot.is_finite() && spot > 0.0, "s0", spot, "spot must be positive and finite");
        ensure!(rate.is_finite(), "r", rate, "rate must be finite");
        ensure!(
            dividend_yield.is_finite() && dividend_yield >= 0.0,
            "q",
            dividend_yield,
            "dividend yield must be non-negative and finite"
        );
        Ok(Self {
            spot,
            rate,
            dividend_yield,
        })
    }

    /// Forward price at `t`.
    pub fn forward(&self, t: Time) -> Real {
        self.spot * ((self.rate - self.dividend_yield) * t).exp()
    }

    /// `ln(K / F(t))`.
    pub fn log_moneyness(&self, strike: Real, t: Time) -> Real {
        (strike / self.forward(t)).ln()
    }
}

#[derive(Debug, Clone)]
struct VarianceSlice {
    maturity: Time,
    /// Total variance as a function of log-moneyness.
    variance: PchipInterpolation,
}

impl VarianceSlice {
    fn at(&self, k: Real) -> (Real, bool) {
        let in_range = self.variance.is_in_range(k);
        (self.variance.operator(k), !in_range)
    }
}

/// A surface query result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceQuery {
    /// Implied volatility.
    pub vol: Volatility,
    /// Total variance `σ²·T`.
    pub total_variance: Real,
    /// Log-moneyness of the query.
    pub log_moneyness: Real,
    /// `true` if the query left the quoted maturity or moneyness range.
    pub extrapolated: bool,
}

/// Total variance decreasing in maturity at a fixed log-moneyness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalendarViolation {
    /// Log-moneyness of the check.
    pub log_moneyness: Real,
    /// Shorter maturity.
    pub maturity_short: Time,
    /// Longer maturity.
    pub maturity_long: Time,
    /// Total variance at the shorter maturity.
    pub variance_short: Real,
    /// Total variance at the longer maturity (should not be smaller).
    pub variance_long: Real,
}

/// Implied-volatility surface, immutable once built.
#[derive(Debug, Clone)]
pub struct IvSurface {
    forwards: ForwardCurve,
    slices: Vec<VarianceSlice>,
    /// Union of the slices' log-moneyness nodes, sorted.
    nodes: Vec<Real>,
    extrapolation: Extrapolation,
    atol: Real,
}

impl IvSurface {
    /// Build a surface from smiles of distinct maturities.
    ///
    /// A single smile gives a surface whose vol depends on strike only.
    ///
    /// # Errors
    /// `InvalidInput` for no slices or a repeated maturity.
    pub fn new(smiles: &[SmileSlice], forwards: ForwardCurve, config: &CalibrationConfig) -> Result<Self> {
        ensure!(!smiles.is_empty(), "smiles", smiles.len(), "a surface needs at least one smile");
        let mut ordered: Vec<&SmileSlice> = smiles.iter().collect();
        ordered.sort_by(|a, b| a.maturity().total_cmp(&b.maturity()));
        let maturities: Vec<Time> = ordered.iter().map(|s| s.maturity()).collect();
        ensure!(
            maturities.windows(2).all(|w| w[1] > w[0]),
            "smiles",
            maturities,
            "slice maturities must be distinct"
        );

        let mut nodes = Vec::new();
        let mut slices = Vec::with_capacity(ordered.len());
        for smile in ordered {
            let t = smile.maturity();
            // strikes are increasing, so log-moneyness is too
            let ks: Vec<Real> = smile.strikes().iter().map(|&k| forwards.log_moneyness(k, t)).collect();
            let ws: Vec<Real> = smile.vols().iter().map(|v| v * v * t).collect();
            nodes.extend_from_slice(&ks);
            slices.push(VarianceSlice {
                maturity: t,
                variance: PchipInterpolation::new(&ks, &ws)?,
            });
        }
        nodes.sort_by(|a, b| a.total_cmp(b));
        nodes.dedup();

        let surface = Self {
            forwards,
            slices,
            nodes,
            extrapolation: config.extrapolation,
            atol: config.sanity_atol,
        };
        let violations = surface.calendar_violations();
        if !violations.is_empty() {
            warn!(count = violations.len(), "surface has calendar arbitrage");
        }
        debug!(slices = surface.slices.len(), "iv surface built");
        Ok(surface)
    }

    /// Slice maturities, increasing.
    pub fn maturities(&self) -> Vec<Time> {
        self.slices.iter().map(|s| s.maturity).collect()
    }

    /// Forward curve used for moneyness.
    pub fn forwards(&self) -> &ForwardCurve {
        &self.forwards
    }

    /// Total variance at log-moneyness `k` and maturity `t`, with the
    /// extrapolation flag.
    fn variance_at(&self, k: Real, t: Time) -> (Real, bool) {
        let n = self.slices.len();
        let (first, last) = (&self.slices[0], &self.slices[n - 1]);
        if t <= first.maturity {
            let (w, out) = first.at(k);
            return (w * t / first.maturity, out || t < first.maturity);
        }
        if t >= last.maturity {
            let (w, out) = last.at(k);
            return (w * t / last.maturity, out || t > last.maturity);
        }
        // first index with maturity >= t; in 1..n since t is strictly inside
        let j = self.slices.partition_point(|s| s.maturity < t);
        let (lo, hi) = (&self.slices[j - 1], &self.slices[j]);
        let (w_lo, out_lo) = lo.at(k);
        let (w_hi, out_hi) = hi.at(k);
        let lambda = (t - lo.maturity) / (hi.maturity - lo.maturity);
        ((1.0 - lambda) * w_lo + lambda * w_hi, out_lo || out_hi)
    }

    /// Volatility at maturity `t` and strike `strike`.
    ///
    /// # Errors
    /// `InvalidInput` for a non-positive maturity or strike, or for an
    /// extrapolated point under [`Extrapolation::Forbid`].
    pub fn query(&self, t: Time, strike: Real) -> Result<SurfaceQuery> {
        ensure!(t.is_finite() && t > 0.0, "t", t, "query maturity must be positive and finite");
        ensure!(strike.is_finite() && strike > 0.0, "k", strike, "strike must be positive and finite");
        let k = self.forwards.log_moneyness(strike, t);
        let (w, extrapolated) = self.variance_at(k, t);
        if extrapolated && self.extrapolation == Extrapolation::Forbid {
            return Err(Error::invalid_input(
                "k",
                (t, strike),
                "point outside the quoted maturity or moneyness range",
            ));
        }
        let w = w.max(0.0);
        Ok(SurfaceQuery {
            vol: (w / t).sqrt(),
            total_variance: w,
            log_moneyness: k,
            extrapolated,
        })
    }

    /// Volatility at `(t, strike)`.
    pub fn vol(&self, t: Time, strike: Real) -> Result<Volatility> {
        self.query(t, strike).map(|q| q.vol)
    }

    /// Points where total variance decreases from one slice to the next,
    /// checked on the union of the slice nodes. Advisory only.
    pub fn calendar_violations(&self) -> Vec<CalendarViolation> {
        let mut violations = Vec::new();
        for pair in self.slices.windows(2) {
            let (short, long) = (&pair[0], &pair[1]);
            for &k in &self.nodes {
                let (variance_short, _) = short.at(k);
                let (variance_long, _) = long.at(k);
                if variance_long < variance_short - self.atol {
                    violations.push(CalendarViolation {
                        log_moneyness: k,
                        maturity_short: short.maturity,
                        maturity_long: long.maturity,
                        variance_short,
                        variance_long,
                    });
                }
            }
        }
        violations
    }
}

/// Build a total-variance surface from smiles.
pub fn iv_surface_total_variance(
    smiles: &[SmileSlice],
    forwards: ForwardCurve,
    config: &CalibrationConfig,
) -> Result<IvSurface> {
    IvSurface::new(smiles, forwards, config)
}
