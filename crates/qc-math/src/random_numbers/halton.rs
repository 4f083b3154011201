//! Halton low-discrepancy sequence.
//!
//! Dimension `j` uses the radical inverse of the point index in the `j`-th
//! prime base. Indexing starts at 1 so the origin is never produced. The
//! scrambled variant applies a seeded random permutation of the digits
//! `1..b` in each base (0 stays fixed), which breaks the correlation between
//! high dimensions.

use qc_core::Real;
use rand::{seq::SliceRandom, RngCore};

/// Halton sequence generator.
#[derive(Debug, Clone)]
pub struct HaltonRsg {
    bases: Vec<u64>,
    permutations: Option<Vec<Vec<u64>>>,
    index: u64,
}

impl HaltonRsg {
    /// Unscrambled generator over the first `dimension` primes.
    pub fn new(dimension: usize) -> Self {
        Self {
            bases: first_primes(dimension),
            permutations: None,
            index: 0,
        }
    }

    /// Generator with per-base digit permutations drawn from `rng`.
    pub fn with_permutations<R: RngCore>(dimension: usize, rng: &mut R) -> Self {
        let bases = first_primes(dimension);
        let permutations = bases
            .iter()
            .map(|&b| {
                let mut perm: Vec<u64> = (0..b).collect();
                perm[1..].shuffle(rng);
                perm
            })
            .collect();
        Self {
            bases,
            permutations: Some(permutations),
            index: 0,
        }
    }

    /// Dimension of the generated points.
    pub fn dimension(&self) -> usize {
        self.bases.len()
    }

    /// Next point in `(0, 1)^d`.
    pub fn next_sequence(&mut self) -> Vec<Real> {
        self.index += 1;
        let index = self.index;
        match &self.permutations {
            None => self
                .bases
                .iter()
                .map(|&b| radical_inverse(index, b, None))
                .collect(),
            Some(perms) => self
                .bases
                .iter()
                .zip(perms)
                .map(|(&b, p)| radical_inverse(index, b, Some(p)))
                .collect(),
        }
    }
}

/// Digit-reversed expansion of `index` in `base`, optionally mapping each
/// digit through `perm`.
pub fn radical_inverse(mut index: u64, base: u64, perm: Option<&[u64]>) -> Real {
    let inv_base = 1.0 / base as Real;
    let mut factor = inv_base;
    let mut value = 0.0;
    while index > 0 {
        let digit = index % base;
        let digit = perm.map_or(digit, |p| p[digit as usize]);
        value += digit as Real * factor;
        index /= base;
        factor *= inv_base;
    }
    value
}

/// The first `n` primes.
pub fn first_primes(n: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
