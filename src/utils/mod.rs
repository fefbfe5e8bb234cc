//! # Utilities
//!
//! Shared linear algebra helpers for the Gibbs samplers: Cholesky
//! factorization, triangular substitution, and matrix inversion on top of
//! faer matrices.

use faer::Mat;
use faer::prelude::Solve;
use thiserror::Error;

/// Fatal numerical failures surfaced by the linear algebra layer.
///
/// These abort the run that triggered them; draws are never retried and
/// failing matrices are never silently regularized.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NumericalError {
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
    #[error("linear solve produced non-finite values")]
    SolveFailed,
}

/// Lower-triangular Cholesky factor `L` with `matrix = L * L^T`.
///
/// Returns `None` if the matrix is not square or not positive definite.
#[must_use]
pub fn cholesky_lower(matrix: &Mat<f64>) -> Option<Mat<f64>> {
    let dim = matrix.ncols();
    if matrix.nrows() != dim {
        return None;
    }
    let mut lower = Mat::<f64>::zeros(dim, dim);
    for row in 0..dim {
        for col in 0..=row {
            let mut sum = matrix[(row, col)];
            for k in 0..col {
                sum -= lower[(row, k)] * lower[(col, k)];
            }
            if row == col {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                lower[(row, col)] = sum.sqrt();
            } else {
                let denom = lower[(col, col)];
                if denom <= 0.0 {
                    return None;
                }
                lower[(row, col)] = sum / denom;
            }
        }
    }
    Some(lower)
}

/// Solve `L * x = b` by forward substitution, `L` lower triangular.
#[must_use]
pub fn forward_substitute(lower: &Mat<f64>, rhs: &[f64]) -> Vec<f64> {
    let dim = rhs.len();
    let mut solution = vec![0.0; dim];
    for row in 0..dim {
        let mut sum = rhs[row];
        for col in 0..row {
            sum -= lower[(row, col)] * solution[col];
        }
        solution[row] = sum / lower[(row, row)];
    }
    solution
}

/// Solve `L^T * x = b` by back substitution, `L` lower triangular.
#[must_use]
pub fn back_substitute(lower: &Mat<f64>, rhs: &[f64]) -> Vec<f64> {
    let dim = rhs.len();
    let mut solution = vec![0.0; dim];
    for row in (0..dim).rev() {
        let mut sum = rhs[row];
        for col in (row + 1)..dim {
            sum -= lower[(col, row)] * solution[col];
        }
        solution[row] = sum / lower[(row, row)];
    }
    solution
}

/// Solve `A * x = b` for symmetric positive-definite `A` given its lower
/// Cholesky factor.
#[must_use]
pub fn cholesky_solve(lower: &Mat<f64>, rhs: &[f64]) -> Vec<f64> {
    back_substitute(lower, &forward_substitute(lower, rhs))
}

/// Inverse of a lower-triangular matrix by forward substitution on the
/// identity columns.
#[must_use]
pub fn invert_lower_triangular(lower: &Mat<f64>) -> Mat<f64> {
    let dim = lower.ncols();
    let mut inverse = Mat::<f64>::zeros(dim, dim);
    for col in 0..dim {
        let mut basis = vec![0.0; dim];
        basis[col] = 1.0;
        let solution = forward_substitute(lower, &basis);
        for row in col..dim {
            inverse[(row, col)] = solution[row];
        }
    }
    inverse
}

/// # Errors
///
/// Returns `NumericalError::SolveFailed` if the solve produces non-finite
/// values.
pub fn solve_linear_system(a: &Mat<f64>, b: &Mat<f64>) -> Result<Mat<f64>, NumericalError> {
    let rhs = b.clone();
    let lu = a.full_piv_lu();
    let solution = lu.solve(rhs);
    if !matrix_is_finite(&solution) {
        return Err(NumericalError::SolveFailed);
    }
    Ok(solution)
}

/// General matrix inverse, one linear solve per basis column.
///
/// # Errors
///
/// Returns `NumericalError::SolveFailed` if the matrix is singular.
pub fn matrix_inverse(matrix: &Mat<f64>) -> Result<Mat<f64>, NumericalError> {
    let dim = matrix.ncols();
    let mut inverse = Mat::<f64>::zeros(dim, dim);
    for col in 0..dim {
        let basis = Mat::from_fn(dim, 1, |row, _| if row == col { 1.0 } else { 0.0 });
        let solution = solve_linear_system(matrix, &basis)?;
        for row in 0..dim {
            inverse[(row, col)] = solution[(row, 0)];
        }
    }
    Ok(inverse)
}

#[must_use]
pub fn matrix_is_finite(matrix: &Mat<f64>) -> bool {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            if !matrix[(i, j)].is_finite() {
                return false;
            }
        }
    }
    true
}

/// Average a matrix with its transpose in place.
pub fn symmetrize(matrix: &mut Mat<f64>) {
    let dim = matrix.nrows().min(matrix.ncols());
    for row in 0..dim {
        for col in 0..row {
            let symmetric = 0.5 * (matrix[(row, col)] + matrix[(col, row)]);
            matrix[(row, col)] = symmetric;
            matrix[(col, row)] = symmetric;
        }
    }
}

#[must_use]
pub fn identity_matrix(dim: usize) -> Mat<f64> {
    Mat::from_fn(dim, dim, |row, col| if row == col { 1.0 } else { 0.0 })
}

#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}
