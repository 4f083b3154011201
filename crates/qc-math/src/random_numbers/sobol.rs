//! Sobol' low-discrepancy sequence.
//!
//! Gray-code construction over primitive polynomials of GF(2). The first
//! dimension is the base-2 van der Corput sequence; the next fifty use the
//! tabulated Joe–Kuo initial direction numbers. Further dimensions take the
//! remaining primitive polynomials in order of degree and coefficients, up
//! to degree 18, with odd initial direction numbers drawn from a fixed hash,
//! which gives the usual 21201 dimensions. Optionally a random digital shift
//! (one random 32-bit word per dimension XOR-ed into every point)
//! randomises the sequence while keeping its net structure.

use qc_core::{ensure, errors::Result, Real};
use rand::RngCore;

/// Highest supported dimension: van der Corput plus one dimension per
/// primitive polynomial of degree at most 18.
pub const MAX_DIMENSION: usize = 21_201;

const MAX_DEGREE: usize = 18;

const BITS: usize = 32;

/// Sobol' sequence generator.
#[derive(Debug, Clone)]
pub struct SobolRsg {
    dimension: usize,
    sequence_count: u64,
    int_sequence: Vec<u32>,
    direction_numbers: Vec<[u32; BITS]>,
    shift: Vec<u32>,
}

impl SobolRsg {
    /// Unscrambled generator of the given dimension.
    ///
    /// # Errors
    /// `InvalidInput` if `dimension` is zero or exceeds [`MAX_DIMENSION`].
    pub fn new(dimension: usize) -> Result<Self> {
        ensure!(
            (1..=MAX_DIMENSION).contains(&dimension),
            "dim",
            dimension,
            "Sobol dimension must lie in [1, {MAX_DIMENSION}]"
        );
        let direction_numbers = direction_table(dimension);
        ensure!(
            direction_numbers.len() == dimension,
            "dim",
            dimension,
            "ran out of primitive polynomials"
        );
        Ok(Self {
            dimension,
            sequence_count: 0,
            int_sequence: vec![0; dimension],
            direction_numbers,
            shift: vec![0; dimension],
        })
    }

    /// Generator with a random digital shift drawn from `rng`.
    pub fn with_digital_shift<R: RngCore>(dimension: usize, rng: &mut R) -> Result<Self> {
        let mut rsg = Self::new(dimension)?;
        for s in rsg.shift.iter_mut() {
            *s = rng.next_u32();
        }
        Ok(rsg)
    }

    /// Discard the next `n` points.
    pub fn skip(&mut self, n: u64) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Dimension of the generated points.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of points generated so far.
    pub fn sequence_count(&self) -> u64 {
        self.sequence_count
    }

    /// Next point in `[0, 1)^d`.
    pub fn next_sequence(&mut self) -> Vec<Real> {
        self.advance();
        let norm = (1u64 << BITS) as Real;
        self.int_sequence
            .iter()
            .zip(&self.shift)
            .map(|(&v, &s)| (v ^ s) as Real / norm)
            .collect()
    }

    fn advance(&mut self) {
        // Gray code: flip the direction number at the rightmost zero bit
        let c = (!self.sequence_count).trailing_zeros() as usize;
        for (x, v) in self.int_sequence.iter_mut().zip(&self.direction_numbers) {
            *x ^= v[c];
        }
        self.sequence_count += 1;
    }
}

fn direction_table(dimension: usize) -> Vec<[u32; BITS]> {
    let tabulated = (dimension - 1).min(JOE_KUO.len());
    let mut table = Vec::with_capacity(dimension);
    table.push(van_der_corput());
    table.extend(
        JOE_KUO[..tabulated]
            .iter()
            .map(|&(degree, poly, initial)| direction_numbers(degree, poly, initial)),
    );
    for (degree, poly) in primitive_polynomials(dimension - 1 - tabulated) {
        let d = table.len();
        let initial: Vec<u32> = (1..=degree).map(|k| initial_direction_number(d, k)).collect();
        table.push(direction_numbers(degree, poly, &initial));
    }
    table
}

fn van_der_corput() -> [u32; BITS] {
    let mut v = [0u32; BITS];
    for (i, vi) in v.iter_mut().enumerate() {
        *vi = 1u32 << (BITS - 1 - i);
    }
    v
}

fn direction_numbers(degree: usize, poly: u32, initial: &[u32]) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    for (i, &m) in initial.iter().enumerate() {
        v[i] = m << (BITS - 1 - i);
    }
    for i in degree..BITS {
        v[i] = v[i - degree] ^ (v[i - degree] >> degree);
        for k in 1..degree {
            if poly & (1 << (degree - 1 - k)) != 0 {
                v[i] ^= v[i - k];
            }
        }
    }
    v
}

/// Odd `m_k < 2^k` for dimension `d` past the table.
fn initial_direction_number(d: usize, k: usize) -> u32 {
    let bits = splitmix64(((d as u64) << 8) | k as u64) >> (64 - k);
    bits as u32 | 1
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The first `count` primitive polynomials missing from [`JOE_KUO`], ordered
/// by degree and then by coefficients, in the table's
/// `(degree, coefficients)` encoding.
fn primitive_polynomials(count: usize) -> Vec<(usize, u32)> {
    let mut found = Vec::with_capacity(count);
    for degree in 1..=MAX_DEGREE {
        if found.len() == count {
            break;
        }
        let order = (1u64 << degree) - 1;
        let factors = prime_factors(order);
        for poly in 0..(1u32 << (degree - 1)) {
            if found.len() == count {
                break;
            }
            if JOE_KUO.iter().any(|&(s, a, _)| s == degree && a == poly) {
                continue;
            }
            if is_primitive(full_polynomial(degree, poly), degree, order, &factors) {
                found.push((degree, poly));
            }
        }
    }
    found
}

/// `x^degree + a_1 x^(degree-1) + ... + 1` as a bit mask.
fn full_polynomial(degree: usize, poly: u32) -> u64 {
    (1u64 << degree) | (u64::from(poly) << 1) | 1
}

/// `x` generates the whole multiplicative group mod `poly`.
fn is_primitive(poly: u64, degree: usize, order: u64, factors: &[u64]) -> bool {
    x_pow_mod(order, poly, degree) == 1 && factors.iter().all(|&f| x_pow_mod(order / f, poly, degree) != 1)
}

fn x_pow_mod(mut e: u64, poly: u64, degree: usize) -> u64 {
    let mut base = reduce(2, poly, degree);
    let mut r = 1;
    while e != 0 {
        if e & 1 != 0 {
            r = mul_mod(r, base, poly, degree);
        }
        base = mul_mod(base, base, poly, degree);
        e >>= 1;
    }
    r
}

fn reduce(a: u64, poly: u64, degree: usize) -> u64 {
    if a & (1 << degree) != 0 {
        a ^ poly
    } else {
        a
    }
}

fn mul_mod(mut a: u64, mut b: u64, poly: u64, degree: usize) -> u64 {
    let mut r = 0;
    while b != 0 {
        if b & 1 != 0 {
            r ^= a;
        }
        b >>= 1;
        a = reduce(a << 1, poly, degree);
    }
    r
}

fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut p = 2;
    while p * p <= n {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// `(degree, polynomial coefficients, initial direction numbers)` for
/// dimensions 2 to 51: the first fifty primitive polynomials, with initial
/// direction numbers after S. Joe and F. Y. Kuo, "Constructing Sobol
/// sequences with better two-dimensional projections", SIAM J. Sci. Comput.
/// 30(5), 2008. Coefficients exclude the leading and constant terms.
const JOE_KUO: &[(usize, u32, &[u32])] = &[
    (1, 0, &[1]),
    (2, 1, &[1, 1]),
    (3, 1, &[1, 1, 1]),
    (3, 2, &[1, 3, 1]),
    (4, 1, &[1, 1, 1, 1]),
    (4, 4, &[1, 3, 3, 1]),
    (5, 2, &[1, 1, 1, 3, 3]),
    (5, 4, &[1, 3, 5, 13, 7]),
    (5, 7, &[1, 1, 5, 5, 15]),
    (5, 11, &[1, 3, 1, 7, 9]),
    (5, 13, &[1, 1, 3, 1, 13]),
    (5, 14, &[1, 1, 7, 13, 25]),
    (6, 1, &[1, 3, 7, 5, 29, 17]),
    (6, 13, &[1, 1, 5, 9, 5, 57]),
    (6, 16, &[1, 3, 1, 13, 25, 49]),
    (6, 19, &[1, 1, 3, 7, 17, 23]),
    (6, 22, &[1, 3, 5, 1, 15, 13]),
    (6, 25, &[1, 1, 1, 15, 7, 61]),
    (7, 1, &[1, 3, 1, 3, 5, 43, 79]),
    (7, 4, &[1, 1, 7, 5, 1, 35, 65]),
    (7, 7, &[1, 3, 3, 9, 31, 47, 3]),
    (7, 8, &[1, 1, 5, 7, 11, 15, 93]),
    (7, 14, &[1, 3, 7, 11, 17, 63, 111]),
    (7, 19, &[1, 1, 3, 3, 19, 37, 53]),
    (7, 21, &[1, 3, 1, 5, 5, 55, 99]),
    (7, 28, &[1, 1, 7, 15, 29, 7, 73]),
    (7, 31, &[1, 3, 5, 3, 29, 23, 83]),
    (7, 32, &[1, 1, 1, 9, 15, 39, 13]),
    (7, 37, &[1, 3, 3, 5, 9, 45, 117]),
    (7, 41, &[1, 1, 5, 13, 7, 25, 91]),
    (7, 42, &[1, 3, 7, 1, 19, 51, 97]),
    (7, 50, &[1, 1, 3, 11, 5, 41, 109]),
    (7, 55, &[1, 3, 1, 7, 27, 11, 63]),
    (7, 56, &[1, 1, 7, 3, 21, 33, 75]),
    (7, 59, &[1, 3, 5, 15, 31, 5, 49]),
    (7, 62, &[1, 1, 1, 1, 23, 57, 15]),
    (8, 14, &[1, 3, 3, 13, 3, 19, 111, 235]),
    (8, 21, &[1, 1, 5, 1, 13, 41, 49, 237]),
    (8, 22, &[1, 3, 7, 7, 17, 27, 91, 157]),
    (8, 38, &[1, 1, 3, 9, 1, 53, 55, 69]),
    (8, 47, &[1, 3, 1, 3, 19, 21, 77, 193]),
    (8, 49, &[1, 1, 7, 11, 31, 17, 113, 43]),
    (8, 50, &[1, 3, 5, 5, 5, 63, 19, 213]),
    (8, 52, &[1, 1, 1, 7, 21, 45, 5, 251]),
    (8, 56, &[1, 3, 3, 3, 27, 29, 97, 7]),
    (8, 67, &[1, 1, 5, 15, 7, 7, 43, 195]),
    (8, 70, &[1, 3, 7, 9, 29, 35, 79, 35]),
    (8, 84, &[1, 1, 3, 5, 15, 59, 23, 59]),
    (8, 97, &[1, 3, 1, 11, 1, 25, 121, 85]),
    (8, 103, &[1, 1, 7, 1, 19, 3, 103, 101]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_numbers::MersenneTwisterUniformRng;

    #[test]
    fn first_dimension_is_van_der_corput() {
        let mut rsg = SobolRsg::new(1).unwrap();
        let pts: Vec<Real> = (0..4).map(|_| rsg.next_sequence()[0]).collect();
        assert_eq!(pts, vec![0.5, 0.75, 0.25, 0.375]);
    }

    #[test]
    fn points_stay_in_unit_cube() {
        let mut rsg = SobolRsg::new(300).unwrap();
        for _ in 0..1000 {
            let v = rsg.next_sequence();
            assert_eq!(v.len(), 300);
            assert!(v.iter().all(|&x| (0.0..1.0).contains(&x)));
        }
    }

    #[test]
    fn dimension_limits() {
        assert!(SobolRsg::new(0).is_err());
        assert!(SobolRsg::new(MAX_DIMENSION + 1).is_err());
        let mut rsg = SobolRsg::new(MAX_DIMENSION).unwrap();
        assert_eq!(rsg.next_sequence().len(), MAX_DIMENSION);
    }

    #[test]
    fn table_polynomials_are_primitive_and_first_in_order() {
        for (d, &(degree, poly, initial)) in JOE_KUO.iter().enumerate() {
            let order = (1u64 << degree) - 1;
            assert!(
                is_primitive(full_polynomial(degree, poly), degree, order, &prime_factors(order)),
                "row {d}: degree {degree}, coefficients {poly}"
            );
            assert_eq!(initial.len(), degree);
            for (k, &m) in initial.iter().enumerate() {
                assert!(m % 2 == 1 && m < 1 << (k + 1), "row {d}: m_{} = {m}", k + 1);
            }
        }
        // everything after the table has degree 8 or more
        assert_eq!(primitive_polynomials(1)[0].0, 8);
    }

    #[test]
    fn primitive_polynomial_counts_by_degree() {
        // φ(2^s − 1) / s primitive polynomials of degree s; the table holds
        // every one up to degree 7 and 14 of the 16 of degree 8
        let polys = primitive_polynomials(1060);
        let count = |s: usize| polys.iter().filter(|p| p.0 == s).count();
        assert_eq!(polys.len(), 1060);
        assert_eq!(count(8), 2);
        assert_eq!(count(9), 48);
        assert_eq!(count(10), 60);
        assert_eq!(count(11), 176);
        assert_eq!(count(12), 144);
        assert_eq!(count(13), 630);
        assert_eq!(primitive_polynomials(1061)[1060].0, 14);
    }

    #[test]
    fn generated_dimensions_are_stratified() {
        let dim = 400;
        let mut rsg = SobolRsg::new(dim).unwrap();
        let pts: Vec<Vec<Real>> = (0..256).map(|_| rsg.next_sequence()).collect();
        for d in JOE_KUO.len() + 1..dim {
            let mut bins = [0usize; 256];
            for p in &pts {
                bins[(p[d] * 256.0) as usize] += 1;
            }
            assert!(bins.iter().all(|&b| b <= 2), "dimension {d}");
        }
    }

    #[test]
    fn first_power_of_two_block_is_stratified() {
        // 2^k points put exactly one point in each dyadic interval per dimension
        let mut rsg = SobolRsg::new(8).unwrap();
        let pts: Vec<Vec<Real>> = (0..64).map(|_| rsg.next_sequence()).collect();
        for d in 0..8 {
            let mut bins = [0usize; 64];
            for p in &pts {
                bins[(p[d] * 64.0) as usize] += 1;
            }
            // the origin is never emitted, point 64 takes its place
            assert!(bins.iter().all(|&b| b <= 2), "dimension {d}: {bins:?}");
        }
    }

    #[test]
    fn two_dimensional_mean() {
        let mut rsg = SobolRsg::new(2).unwrap();
        let n = 4096;
        let mut sum = [0.0, 0.0];
        for _ in 0..n {
            let v = rsg.next_sequence();
            sum[0] += v[0];
            sum[1] += v[1];
        }
        for s in sum {
            assert!((s / n as Real - 0.5).abs() < 0.01);
        }
    }

    #[test]
    fn skip_matches_manual_advance() {
        let mut a = SobolRsg::new(3).unwrap();
        a.skip(100);
        let mut b = SobolRsg::new(3).unwrap();
        for _ in 0..100 {
            b.next_sequence();
        }
        assert_eq!(a.next_sequence(), b.next_sequence());
        assert_eq!(a.sequence_count(), 101);
    }

    #[test]
    fn digital_shift_is_seeded() {
        let a = SobolRsg::with_digital_shift(4, &mut MersenneTwisterUniformRng::new(1))
            .unwrap()
            .next_sequence();
        let b = SobolRsg::with_digital_shift(4, &mut MersenneTwisterUniformRng::new(1))
            .unwrap()
            .next_sequence();
        let c = SobolRsg::with_digital_shift(4, &mut MersenneTwisterUniformRng::new(2))
            .unwrap()
            .next_sequence();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&x| (0.0..1.0).contains(&x)));
    }
}
