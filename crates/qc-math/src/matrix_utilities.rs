//! Matrix helpers over nalgebra: correlation checks, Cholesky factors,
//! covariance assembly and ridge-regularised linear solves.

use nalgebra::{DMatrix, DVector};
use qc_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

/// Tolerance for symmetry, unit diagonal and eigenvalue checks.
pub const CORRELATION_TOLERANCE: Real = 1e-12;

/// Build a square matrix from nested rows.
///
/// # Errors
/// `InvalidInput` when the rows are ragged, the matrix is not `n × n`, or an
/// entry is not finite.
pub fn matrix_from_rows(field: &'static str, rows: &[Vec<Real>], n: usize) -> Result<DMatrix<Real>> {
    ensure!(rows.len() == n, field, rows.len(), "expected {n} rows");
    ensure!(
        rows.iter().all(|r| r.len() == n),
        field,
        rows.iter().map(Vec::len).collect::<Vec<_>>(),
        "every row must have {n} entries"
    );
    ensure!(
        rows.iter().flatten().all(|x| x.is_finite()),
        field,
        rows,
        "entries must be finite"
    );
    Ok(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
}

/// Smallest eigenvalue of a symmetric matrix.
pub fn min_eigenvalue(m: &DMatrix<Real>) -> Real {
    m.clone()
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .copied()
        .fold(Real::INFINITY, Real::min)
}

/// Check that `m` is a valid correlation matrix: square, symmetric, unit
/// diagonal, entries in `[-1, 1]` and positive semi-definite.
pub fn validate_correlation(m: &DMatrix<Real>) -> Result<()> {
    let n = m.nrows();
    ensure!(m.ncols() == n, "correlation", (m.nrows(), m.ncols()), "matrix must be square");
    for i in 0..n {
        ensure!(
            (m[(i, i)] - 1.0).abs() <= CORRELATION_TOLERANCE,
            "correlation",
            m[(i, i)],
            "diagonal entry {i} must be 1"
        );
        for j in 0..i {
            ensure!(
                (m[(i, j)] - m[(j, i)]).abs() <= CORRELATION_TOLERANCE,
                "correlation",
                (m[(i, j)], m[(j, i)]),
                "matrix must be symmetric at ({i}, {j})"
            );
            ensure!(
                (-1.0..=1.0).contains(&m[(i, j)]),
                "correlation",
                m[(i, j)],
                "entry ({i}, {j}) must lie in [-1, 1]"
            );
        }
    }
    let lambda_min = min_eigenvalue(m);
    ensure!(
        lambda_min >= -CORRELATION_TOLERANCE,
        "correlation",
        lambda_min,
        "matrix must be positive semi-definite (smallest eigenvalue below -1e-12)"
    );
    Ok(())
}

/// Lower Cholesky factor `L` with `A = L·Lᵀ`.
///
/// # Errors
/// `ModelInvalid` if `m` is not positive definite.
pub fn cholesky_lower(m: &DMatrix<Real>) -> Result<DMatrix<Real>> {
    m.clone().cholesky().map(|c| c.l()).ok_or_else(|| {
        Error::model_invalid(
            "cholesky",
            "matrix is not positive definite; Cholesky factorisation failed",
        )
    })
}

/// Covariance `C_ij = σ_i ρ_ij σ_j`.
pub fn covariance_from_correlation(vols: &[Real], correlation: &DMatrix<Real>) -> Result<DMatrix<Real>> {
    let n = vols.len();
    ensure!(
        correlation.nrows() == n && correlation.ncols() == n,
        "correlation",
        (correlation.nrows(), correlation.ncols()),
        "correlation must be {n}×{n}"
    );
    Ok(DMatrix::from_fn(n, n, |i, j| vols[i] * correlation[(i, j)] * vols[j]))
}

/// Solve `(A + ridge·I) x = b`.
///
/// Cholesky first, LU when the regularised matrix is not positive definite.
///
/// # Errors
/// `ModelInvalid` when the system is singular or the solution not finite.
pub fn solve_regularized(a: &DMatrix<Real>, b: &DVector<Real>, ridge: Real) -> Result<DVector<Real>> {
    let n = a.nrows();
    ensure!(a.ncols() == n && b.len() == n, "system", (a.nrows(), a.ncols(), b.len()), "dimension mismatch");
    let regularized = a + DMatrix::<Real>::identity(n, n) * ridge;
    let x = match regularized.clone().cholesky() {
        Some(chol) => Some(chol.solve(b)),
        None => regularized.lu().solve(b),
    };
    match x {
        Some(x) if x.iter().all(|v| v.is_finite()) => Ok(x),
        _ => Err(Error::model_invalid(
            "linear_solve",
            format!("regularised {n}×{n} system is singular"),
        )),
    }
}
