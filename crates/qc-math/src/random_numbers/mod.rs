//! Random number generators and sampling methods.
//!
//! Every stochastic draw builds a fresh [`MersenneTwisterUniformRng`] from an
//! explicit seed; there is no shared generator state. [`draw`] is the single
//! entry point mapping a closed [`SamplingMethod`] onto its generator:
//!
//! | method | construction |
//! |---|---|
//! | `Plain` | i.i.d. standard normals |
//! | `Antithetic` | i.i.d. normals paired with their negation |
//! | `LatinHypercube` | one uniform per equal-probability bin, bins permuted per dimension |
//! | `Sobol` | Joe–Kuo Sobol' points, optional random digital shift |
//! | `Halton` | radical inverses in prime bases, optional digit permutation |
//!
//! Uniforms are clipped to `[1e-12, 1 − 1e-12]` before the inverse normal
//! CDF is applied.

pub mod halton;
pub mod latin_hypercube;
pub mod sobol;

pub use halton::HaltonRsg;
pub use latin_hypercube::latin_hypercube_uniforms;
pub use sobol::SobolRsg;

use qc_core::{config::DEFAULT_SEED, ensure, errors::Result, Real};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use rand_mt::Mt19937GenRand64;
use serde::Serialize;
use tracing::debug;

use crate::distributions::normal_cdf_inverse;

/// Uniforms are kept at least this far from 0 and 1.
pub const UNIFORM_CLIP: Real = 1e-12;

/// A uniform pseudo-random number generator based on the Mersenne Twister
/// MT19937-64 algorithm.
///
/// Implements [`RngCore`], so `rand` / `rand_distr` distributions and
/// shuffles can be driven by it.
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Generate the next uniform deviate in `[0, 1)` with 53 random bits.
    pub fn next_real(&mut self) -> Real {
        (self.rng.next_u64() >> 11) as Real * (1.0 / (1u64 << 53) as Real)
    }
}

impl RngCore for MersenneTwisterUniformRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.rng.fill_bytes(dest);
        Ok(())
    }
}

// ── Sampling methods ──────────────────────────────────────────────────────────

/// Closed set of sampling schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SamplingMethod {
    /// Independent pseudo-random draws.
    #[default]
    Plain,
    /// Independent draws paired with their mirror images.
    Antithetic,
    /// Latin Hypercube stratification.
    LatinHypercube,
    /// Sobol' low-discrepancy sequence.
    Sobol {
        /// Apply a seeded random digital shift.
        scramble: bool,
    },
    /// Halton low-discrepancy sequence.
    Halton {
        /// Apply seeded digit permutations.
        scramble: bool,
    },
}

impl SamplingMethod {
    /// `true` for Sobol and Halton.
    pub fn is_quasi_random(&self) -> bool {
        matches!(self, SamplingMethod::Sobol { .. } | SamplingMethod::Halton { .. })
    }

    fn mirrors(&self) -> bool {
        matches!(self, SamplingMethod::Antithetic)
    }
}

/// A seeded `(n × dim)` sample matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleDraw {
    /// Number of rows.
    pub n: usize,
    /// Number of columns.
    pub dim: usize,
    /// Row-major values.
    pub values: Vec<Real>,
    /// Seed actually used (the default when the caller supplied none).
    pub seed_effective: u64,
    /// Method that produced the draw.
    pub method: SamplingMethod,
    /// Rows `2i` and `2i + 1` are mirror images of each other.
    pub antithetic_pairs: bool,
}

impl SampleDraw {
    /// Row `i` as a slice of length `dim`.
    pub fn row(&self, i: usize) -> &[Real] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterator over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Real]> + '_ {
        self.values.chunks_exact(self.dim)
    }

    /// Copy into an nalgebra matrix.
    pub fn to_matrix(&self) -> nalgebra::DMatrix<Real> {
        nalgebra::DMatrix::from_row_slice(self.n, self.dim, &self.values)
    }
}

/// Draw an `(n × dim)` matrix of standard normals.
///
/// A missing `seed` is replaced by the default seed (123) and reported as
/// `seed_effective`. Identical `(n, dim, method, seed)` always yield
/// bit-identical output.
///
/// # Errors
/// `InvalidInput` for `n == 0`, `dim == 0`, an odd `n` with `Antithetic`,
/// or a Sobol dimension above [`sobol::MAX_DIMENSION`].
pub fn draw(n: usize, dim: usize, method: SamplingMethod, seed: Option<u64>) -> Result<SampleDraw> {
    draw_normals(n, dim, method, seed, method.mirrors())
}

/// [`draw`] with optional antithetic pairing layered on any method.
///
/// With `antithetic = true`, `n / 2` base rows are generated and each is
/// followed by its mirror: `−z` for pseudo-random normals, `1 − u` before
/// the inverse CDF for stratified and quasi-random uniforms.
/// `SamplingMethod::Antithetic` always pairs, whatever the flag says.
pub fn draw_normals(
    n: usize,
    dim: usize,
    method: SamplingMethod,
    seed: Option<u64>,
    antithetic: bool,
) -> Result<SampleDraw> {
    let antithetic = antithetic || method.mirrors();
    validate_shape(n, dim, antithetic)?;
    let seed_effective = seed.unwrap_or(DEFAULT_SEED);
    let n_base = if antithetic { n / 2 } else { n };

    let base: Vec<Real> = match method {
        SamplingMethod::Plain | SamplingMethod::Antithetic => {
            let mut rng = MersenneTwisterUniformRng::new(seed_effective);
            (0..n_base * dim)
                .map(|_| StandardNormal.sample(&mut rng))
                .collect()
        }
        _ => uniform_base(n_base, dim, method, seed_effective)?,
    };

    let mut values = Vec::with_capacity(n * dim);
    let normal_from_uniform = |u: Real| normal_cdf_inverse(u.clamp(UNIFORM_CLIP, 1.0 - UNIFORM_CLIP));
    let from_uniforms = !matches!(method, SamplingMethod::Plain | SamplingMethod::Antithetic);
    for row in base.chunks_exact(dim) {
        if from_uniforms {
            values.extend(row.iter().map(|&u| normal_from_uniform(u)));
            if antithetic {
                values.extend(row.iter().map(|&u| normal_from_uniform(1.0 - u)));
            }
        } else {
            values.extend_from_slice(row);
            if antithetic {
                values.extend(row.iter().map(|&z| -z));
            }
        }
    }

    debug!(n, dim, ?method, seed_effective, antithetic, "drew standard normals");
    Ok(SampleDraw {
        n,
        dim,
        values,
        seed_effective,
        method,
        antithetic_pairs: antithetic,
    })
}

/// Draw an `(n × dim)` matrix of uniforms in `[1e-12, 1 − 1e-12]`.
///
/// `Antithetic` pairs each row `u` with `1 − u`.
pub fn draw_uniforms(
    n: usize,
    dim: usize,
    method: SamplingMethod,
    seed: Option<u64>,
) -> Result<SampleDraw> {
    let antithetic = method.mirrors();
    validate_shape(n, dim, antithetic)?;
    let seed_effective = seed.unwrap_or(DEFAULT_SEED);
    let n_base = if antithetic { n / 2 } else { n };
    let base = uniform_base(n_base, dim, method, seed_effective)?;

    let mut values = Vec::with_capacity(n * dim);
    for row in base.chunks_exact(dim) {
        values.extend(row.iter().map(|&u| u.clamp(UNIFORM_CLIP, 1.0 - UNIFORM_CLIP)));
        if antithetic {
            values.extend(row.iter().map(|&u| (1.0 - u).clamp(UNIFORM_CLIP, 1.0 - UNIFORM_CLIP)));
        }
    }
    Ok(SampleDraw {
        n,
        dim,
        values,
        seed_effective,
        method,
        antithetic_pairs: antithetic,
    })
}

fn validate_shape(n: usize, dim: usize, antithetic: bool) -> Result<()> {
    ensure!(n >= 1, "n", n, "sample count must be at least 1");
    ensure!(dim >= 1, "dim", dim, "dimension must be at least 1");
    ensure!(
        !antithetic || n % 2 == 0,
        "n",
        n,
        "antithetic sampling requires an even sample count"
    );
    Ok(())
}

/// Row-major `(n × dim)` uniforms in `[0, 1)` for the given method.
fn uniform_base(n: usize, dim: usize, method: SamplingMethod, seed: u64) -> Result<Vec<Real>> {
    let values = match method {
        SamplingMethod::Plain | SamplingMethod::Antithetic => {
            let mut rng = MersenneTwisterUniformRng::new(seed);
            (0..n * dim).map(|_| rng.next_real()).collect()
        }
        SamplingMethod::LatinHypercube => {
            let mut rng = MersenneTwisterUniformRng::new(seed);
            latin_hypercube_uniforms(n, dim, &mut rng)
        }
        SamplingMethod::Sobol { scramble } => {
            let mut rsg = if scramble {
                SobolRsg::with_digital_shift(dim, &mut MersenneTwisterUniformRng::new(seed))?
            } else {
                SobolRsg::new(dim)?
            };
            let mut out = Vec::with_capacity(n * dim);
            for _ in 0..n {
                out.extend(rsg.next_sequence());
            }
            out
        }
        SamplingMethod::Halton { scramble } => {
            let mut rsg = if scramble {
                HaltonRsg::with_permutations(dim, &mut MersenneTwisterUniformRng::new(seed))
            } else {
                HaltonRsg::new(dim)
            };
            let mut out = Vec::with_capacity(n * dim);
            for _ in 0..n {
                out.extend(rsg.next_sequence());
            }
            out
        }
    };
    Ok(values)
}
