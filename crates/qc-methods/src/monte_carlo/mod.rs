//! Monte Carlo simulation framework.
//!
//! * [`SampleGenerator`] — maps one row of standard normals to a sample
//!   ([`GbmPathGenerator`] for a single asset path,
//!   [`CorrelatedTerminalGenerator`] for correlated terminal values)
//! * [`PathPricer`] — evaluates a discounted payoff on a sample
//! * [`MonteCarloModel`] — runs a generator and several pricers over a
//!   [`SampleDraw`] and returns one column of values per pricer
//! * [`control_variate`] — regression-based variance reduction on those columns

pub mod control_variate;

pub use control_variate::{control_variate_adjust, ControlVariateFit};

use nalgebra::DMatrix;
use qc_core::{ensure, errors::Result, Rate, Real, Time, Volatility};
use qc_math::{matrix_utilities, SampleDraw};
use tracing::debug;

use crate::lattice::TimeGrid;

// ─── Path ─────────────────────────────────────────────────────────────────────

/// A single sample path: time points and the asset value at each.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Time points, starting at 0.
    pub times: Vec<Time>,
    /// Asset values, starting at the spot.
    pub values: Vec<Real>,
}

impl Path {
    /// Number of time steps (= len − 1).
    pub fn steps(&self) -> usize {
        self.values.len() - 1
    }

    /// The final value.
    pub fn back(&self) -> Real {
        self.values[self.values.len() - 1]
    }

    /// The initial value.
    pub fn front(&self) -> Real {
        self.values[0]
    }

    /// Number of points including the initial one.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the path holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

/// Turns one row of independent standard normals into a sample.
pub trait SampleGenerator {
    /// The generated sample (a path, a vector of terminal values, ...).
    type Sample;

    /// Number of normals consumed per sample.
    fn dimension(&self) -> usize;

    /// Build the sample from `normals.len() == self.dimension()` normals.
    fn sample(&self, normals: &[Real]) -> Self::Sample;
}

/// Exact log-Euler discretisation of geometric Brownian motion on a grid:
/// `ln S_{i+1} = ln S_i + (r − q − σ²/2)·Δt + σ·√Δt·z_i`.
#[derive(Debug, Clone)]
pub struct GbmPathGenerator {
    spot: Real,
    grid: TimeGrid,
    drifts: Vec<Real>,
    diffusions: Vec<Real>,
}

impl GbmPathGenerator {
    /// Generator for one asset over `grid`.
    pub fn new(spot: Real, rate: Rate, dividend_yield: Rate, volatility: Volatility, grid: TimeGrid) -> Self {
        let mu = rate - dividend_yield - 0.5 * volatility * volatility;
        let (drifts, diffusions) = (0..grid.steps())
            .map(|i| {
                let dt = grid.dt(i);
                (mu * dt, volatility * dt.sqrt())
            })
            .unzip();
        Self {
            spot,
            grid,
            drifts,
            diffusions,
        }
    }

    /// The simulation grid.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }
}

impl SampleGenerator for GbmPathGenerator {
    type Sample = Path;

    fn dimension(&self) -> usize {
        self.grid.steps()
    }

    fn sample(&self, normals: &[Real]) -> Path {
        let mut values = Vec::with_capacity(self.grid.size());
        values.push(self.spot);
        let mut log_s = self.spot.ln();
        for ((z, drift), diffusion) in normals.iter().zip(&self.drifts).zip(&self.diffusions) {
            log_s += drift + diffusion * z;
            values.push(log_s.exp());
        }
        Path {
            times: self.grid.times().to_vec(),
            values,
        }
    }
}

/// Terminal values of correlated lognormal assets:
/// `ln S_i(T) = ln S_i + (r − q_i − σ_i²/2)·T + σ_i·√T·(L·z)_i`,
/// with `L` the Cholesky factor of the correlation matrix.
#[derive(Debug, Clone)]
pub struct CorrelatedTerminalGenerator {
    log_means: Vec<Real>,
    loadings: DMatrix<Real>,
}

impl CorrelatedTerminalGenerator {
    /// Build from per-asset parameters and a validated correlation matrix.
    ///
    /// # Errors
    /// * `InvalidInput` on mismatched lengths or an invalid correlation matrix.
    /// * `ModelInvalid` when the Cholesky factorisation fails.
    pub fn new(
        spots: &[Real],
        vols: &[Volatility],
        dividend_yields: &[Rate],
        rate: Rate,
        maturity: Time,
        correlation: &DMatrix<Real>,
    ) -> Result<Self> {
        let n = spots.len();
        ensure!(n >= 1, "spots", n, "at least one asset is required");
        ensure!(vols.len() == n, "vols", vols.len(), "expected {n} volatilities");
        ensure!(
            dividend_yields.len() == n,
            "dividend_yields",
            dividend_yields.len(),
            "expected {n} dividend yields"
        );
        matrix_utilities::validate_correlation(correlation)?;
        ensure!(correlation.nrows() == n, "correlation", correlation.nrows(), "expected {n}×{n}");
        let chol = matrix_utilities::cholesky_lower(correlation)?;
        debug!(assets = n, "correlation factorised");

        let sqrt_t = maturity.sqrt();
        let log_means = (0..n)
            .map(|i| spots[i].ln() + (rate - dividend_yields[i] - 0.5 * vols[i] * vols[i]) * maturity)
            .collect();
        let loadings = DMatrix::from_fn(n, n, |i, j| vols[i] * sqrt_t * chol[(i, j)]);
        Ok(Self { log_means, loadings })
    }
}

impl SampleGenerator for CorrelatedTerminalGenerator {
    type Sample = Vec<Real>;

    fn dimension(&self) -> usize {
        self.log_means.len()
    }

    fn sample(&self, normals: &[Real]) -> Vec<Real> {
        self.log_means
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let shock: Real = (0..=i).map(|j| self.loadings[(i, j)] * normals[j]).sum();
                (m + shock).exp()
            })
            .collect()
    }
}

// ─── PathPricer ───────────────────────────────────────────────────────────────

/// Discounted payoff of a sample.
pub trait PathPricer<S: ?Sized> {
    /// Evaluate the discounted payoff.
    fn value(&self, sample: &S) -> Real;
}

impl<S: ?Sized, F: Fn(&S) -> Real> PathPricer<S> for F {
    fn value(&self, sample: &S) -> Real {
        self(sample)
    }
}

// ─── MonteCarloModel ──────────────────────────────────────────────────────────

/// Runs one generator and several pricers over every row of a draw.
pub struct MonteCarloModel<'a, G: SampleGenerator> {
    generator: G,
    pricers: Vec<Box<dyn PathPricer<G::Sample> + 'a>>,
}

impl<'a, G: SampleGenerator> MonteCarloModel<'a, G> {
    /// Model without pricers.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            pricers: Vec::new(),
        }
    }

    /// Add a pricer; its values form the next output column.
    pub fn with_pricer(mut self, pricer: impl PathPricer<G::Sample> + 'a) -> Self {
        self.pricers.push(Box::new(pricer));
        self
    }

    /// Evaluate every pricer on every row of `draw`.
    ///
    /// Antithetic pairs (rows `2i`, `2i + 1`) are averaged, so each column
    /// holds independent samples: `n / 2` for paired draws, `n` otherwise.
    ///
    /// # Errors
    /// `InvalidInput` if the draw's dimension differs from the generator's.
    pub fn simulate(&self, draw: &SampleDraw) -> Result<Vec<Vec<Real>>> {
        ensure!(
            draw.dim == self.generator.dimension(),
            "dim",
            draw.dim,
            "generator needs {} normals per sample",
            self.generator.dimension()
        );
        let mut columns: Vec<Vec<Real>> = vec![Vec::with_capacity(draw.n); self.pricers.len()];
        for row in draw.rows() {
            let sample = self.generator.sample(row);
            for (column, pricer) in columns.iter_mut().zip(&self.pricers) {
                column.push(pricer.value(&sample));
            }
        }
        if draw.antithetic_pairs {
            columns = columns.iter().map(|c| pair_average(c)).collect();
        }
        debug!(rows = draw.n, columns = columns.len(), "monte carlo simulation done");
        Ok(columns)
    }
}

/// Average consecutive pairs `(x_{2i} + x_{2i+1}) / 2`.
pub fn pair_average(values: &[Real]) -> Vec<Real> {
    values.chunks_exact(2).map(|p| 0.5 * (p[0] + p[1])).collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qc_math::{draw, draw_normals, SamplingMethod};

    fn gbm(steps: usize) -> GbmPathGenerator {
        GbmPathGenerator::new(100.0, 0.05, 0.0, 0.2, TimeGrid::uniform(1.0, steps).unwrap())
    }

    #[test]
    fn zero_shocks_follow_the_drift() {
        let g = gbm(4);
        let path = g.sample(&[0.0; 4]);
        assert_eq!(path.len(), 5);
        assert_eq!(path.front(), 100.0);
        assert_relative_eq!(path.back(), 100.0 * (0.05 - 0.02_f64).exp(), max_relative = 1e-12);
        assert_relative_eq!(path.times[4], 1.0);
    }

    #[test]
    fn gbm_paths_stay_positive() {
        let g = gbm(252);
        let d = draw(100, 252, SamplingMethod::Plain, Some(12345)).unwrap();
        for row in d.rows() {
            assert!(g.sample(row).values.iter().all(|&v| v > 0.0));
        }
    }

    #[test]
    fn european_call_converges_to_black_scholes() {
        let model = MonteCarloModel::new(gbm(1)).with_pricer(|p: &Path| {
            (-0.05_f64).exp() * (p.back() - 100.0).max(0.0)
        });
        let d = draw_normals(100_000, 1, SamplingMethod::Plain, Some(42), true).unwrap();
        let col = &model.simulate(&d).unwrap()[0];
        assert_eq!(col.len(), 50_000);
        let mean = col.iter().sum::<Real>() / col.len() as Real;
        assert!((mean - 10.450_583_572_185_565).abs() < 0.15, "mc = {mean}");
    }

    #[test]
    fn pricers_become_columns() {
        let model = MonteCarloModel::new(gbm(2))
            .with_pricer(|p: &Path| p.back())
            .with_pricer(|p: &Path| p.front());
        let d = draw(8, 2, SamplingMethod::Plain, Some(1)).unwrap();
        let cols = model.simulate(&d).unwrap();
        assert_eq!(cols.len(), 2);
        assert!(cols[1].iter().all(|&v| v == 100.0));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let model = MonteCarloModel::new(gbm(3)).with_pricer(|p: &Path| p.back());
        let d = draw(8, 2, SamplingMethod::Plain, Some(1)).unwrap();
        assert!(model.simulate(&d).is_err());
    }

    #[test]
    fn correlated_terminals_match_moments() {
        let corr = DMatrix::from_row_slice(2, 2, &[1.0, 0.6, 0.6, 1.0]);
        let g = CorrelatedTerminalGenerator::new(&[100.0, 50.0], &[0.2, 0.3], &[0.0, 0.01], 0.03, 1.0, &corr)
            .unwrap();
        let d = draw(40_000, 2, SamplingMethod::LatinHypercube, Some(5)).unwrap();
        let (mut m0, mut m1, mut cross) = (0.0, 0.0, 0.0);
        let mut logs = Vec::with_capacity(d.n);
        for row in d.rows() {
            let s = g.sample(row);
            m0 += s[0];
            m1 += s[1];
            logs.push((s[0].ln(), s[1].ln()));
        }
        let n = d.n as Real;
        assert_relative_eq!(m0 / n, 100.0 * 0.03_f64.exp(), max_relative = 5e-3);
        assert_relative_eq!(m1 / n, 50.0 * 0.02_f64.exp(), max_relative = 5e-3);
        let (a, b): (Real, Real) = logs.iter().fold((0.0, 0.0), |acc, l| (acc.0 + l.0, acc.1 + l.1));
        let (a, b) = (a / n, b / n);
        for (x, y) in &logs {
            cross += (x - a) * (y - b);
        }
        let cov = cross / (n - 1.0);
        assert!((cov - 0.6 * 0.2 * 0.3).abs() < 2e-3, "cov = {cov}");
    }

    #[test]
    fn invalid_correlation_is_rejected() {
        let corr = DMatrix::from_row_slice(2, 2, &[1.0, 1.2, 1.2, 1.0]);
        assert!(CorrelatedTerminalGenerator::new(&[1.0, 1.0], &[0.2, 0.2], &[0.0, 0.0], 0.0, 1.0, &corr).is_err());
    }

    #[test]
    fn pairs_are_averaged() {
        assert_eq!(pair_average(&[1.0, 3.0, 2.0, 4.0]), vec![2.0, 3.0]);
    }
}
