//! Latin Hypercube sampling.

use qc_core::Real;
use rand::{seq::SliceRandom, Rng};

/// Row-major `(n × dim)` Latin Hypercube uniforms.
///
/// Each column holds exactly one point in every bin `[i/n, (i+1)/n)`,
/// jittered uniformly inside the bin; bins are randomly permuted per column.
pub fn latin_hypercube_uniforms<R: Rng + ?Sized>(n: usize, dim: usize, rng: &mut R) -> Vec<Real> {
    let mut out = vec![0.0; n * dim];
    let mut column: Vec<Real> = Vec::with_capacity(n);
    for j in 0..dim {
        column.clear();
        column.extend((0..n).map(|i| (i as Real + rng.gen::<Real>()) / n as Real));
        column.shuffle(rng);
        for (i, &u) in column.iter().enumerate() {
            out[i * dim + j] = u;
        }
    }
    out
}
