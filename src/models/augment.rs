//! Cholesky prior augmentation and the augmented normal equations.
//!
//! A conjugate `Normal(beta0, A0⁻¹)` prior is folded into the likelihood by
//! appending pseudo-observation rows `M` with `Mᵀ M = A0` and response
//! column `M · beta0`. The posterior then falls out of the same
//! normal-equations machinery as the likelihood alone, so proper- and
//! improper-prior draws share one code path.

use faer::Mat;
use rand::rngs::StdRng;

use crate::distributions::sample_standard_normal;
use crate::priors::CoefficientPrior;
use crate::utils::{NumericalError, back_substitute, cholesky_lower, cholesky_solve};

/// Design matrix with a reserved prior-augmentation region.
///
/// Layout is `(n_obs + n_aug) × (n_cov + 1)`: real observation rows first,
/// pseudo-rows after them, and the last column holding the response
/// contribution of every row.
#[derive(Debug, Clone)]
pub(crate) struct AugmentedDesign {
    matrix: Mat<f64>,
    n_obs: usize,
    n_cov: usize,
    n_aug: usize,
}

impl AugmentedDesign {
    /// Build from a full design matrix, folding in the coefficient prior.
    ///
    /// An improper prior, or a precision matrix that is exactly zero,
    /// contributes no pseudo-rows.
    pub(crate) fn with_coefficient_prior(
        design: &Mat<f64>,
        prior: &CoefficientPrior,
    ) -> Result<Self, NumericalError> {
        let n_obs = design.nrows();
        let n_cov = design.ncols();
        let mut built = match prior {
            CoefficientPrior::Improper => Self::empty(n_obs, n_cov, 0),
            CoefficientPrior::Gaussian { mean, precision } => {
                if is_zero_matrix(precision) {
                    Self::empty(n_obs, n_cov, 0)
                } else {
                    let lower =
                        cholesky_lower(precision).ok_or(NumericalError::NotPositiveDefinite)?;
                    let mut built = Self::empty(n_obs, n_cov, n_cov);
                    // Pseudo-row i is row i of Lᵀ, so the block contributes
                    // L Lᵀ = A0 to XᵀX and A0·beta0 to Xᵀy.
                    for i in 0..n_cov {
                        let mut response = 0.0;
                        for j in 0..n_cov {
                            built.matrix[(n_obs + i, j)] = lower[(j, i)];
                            response += lower[(j, i)] * mean[j];
                        }
                        built.matrix[(n_obs + i, n_cov)] = response;
                    }
                    built
                }
            }
        };
        for i in 0..n_obs {
            for j in 0..n_cov {
                built.matrix[(i, j)] = design[(i, j)];
            }
        }
        Ok(built)
    }

    /// Build from a row subset of a source design, reserving `n_aug`
    /// pseudo-rows to be written per sweep.
    pub(crate) fn from_rows(source: &Mat<f64>, rows: &[usize], n_aug: usize) -> Self {
        let n_cov = source.ncols();
        let mut built = Self::empty(rows.len(), n_cov, n_aug);
        for (i, &row) in rows.iter().enumerate() {
            for j in 0..n_cov {
                built.matrix[(i, j)] = source[(row, j)];
            }
        }
        built
    }

    fn empty(n_obs: usize, n_cov: usize, n_aug: usize) -> Self {
        Self {
            matrix: Mat::<f64>::zeros(n_obs + n_aug, n_cov + 1),
            n_obs,
            n_cov,
            n_aug,
        }
    }

    pub(crate) const fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub(crate) const fn n_aug(&self) -> usize {
        self.n_aug
    }

    #[cfg(test)]
    pub(crate) const fn matrix(&self) -> &Mat<f64> {
        &self.matrix
    }

    /// Set one real row's response entry.
    pub(crate) fn set_response(&mut self, row: usize, value: f64) {
        debug_assert!(row < self.n_obs);
        self.matrix[(row, self.n_cov)] = value;
    }

    /// Set every real row's response from a column vector.
    pub(crate) fn set_responses(&mut self, values: &Mat<f64>) {
        debug_assert_eq!(values.nrows(), self.n_obs);
        for row in 0..self.n_obs {
            self.matrix[(row, self.n_cov)] = values[(row, 0)];
        }
    }

    /// Overwrite the pseudo-row block with a `n_aug × n_cov` matrix and a
    /// zero response, as the per-group random-effect prior requires.
    pub(crate) fn write_prior_rows(&mut self, block: &Mat<f64>) {
        debug_assert_eq!(block.nrows(), self.n_aug);
        debug_assert_eq!(block.ncols(), self.n_cov);
        for i in 0..self.n_aug {
            for j in 0..self.n_cov {
                self.matrix[(self.n_obs + i, j)] = block[(i, j)];
            }
            self.matrix[(self.n_obs + i, self.n_cov)] = 0.0;
        }
    }

    /// Dot product of one real row's covariates with a coefficient vector.
    pub(crate) fn row_dot(&self, row: usize, coefficients: &[f64]) -> f64 {
        let mut total = 0.0;
        for j in 0..self.n_cov {
            total += self.matrix[(row, j)] * coefficients[j];
        }
        total
    }

    /// Solve the augmented normal equations over all rows, real and pseudo.
    ///
    /// # Errors
    ///
    /// Returns `NumericalError::NotPositiveDefinite` if the cross-product
    /// matrix fails its Cholesky factorization; this is fatal to the run.
    pub(crate) fn solve(&self) -> Result<NormalEquations, NumericalError> {
        let p = self.n_cov;
        let rows = self.n_obs + self.n_aug;
        let mut cross = Mat::<f64>::zeros(p, p);
        let mut xty = vec![0.0; p];
        let mut yty = 0.0;
        for i in 0..rows {
            let response = self.matrix[(i, p)];
            yty += response * response;
            for j in 0..p {
                let value = self.matrix[(i, j)];
                xty[j] += value * response;
                for k in 0..=j {
                    cross[(j, k)] += value * self.matrix[(i, k)];
                }
            }
        }
        for j in 0..p {
            for k in (j + 1)..p {
                cross[(j, k)] = cross[(k, j)];
            }
        }

        let chol = cholesky_lower(&cross).ok_or(NumericalError::NotPositiveDefinite)?;
        let mean = cholesky_solve(&chol, &xty);
        let explained = mean.iter().zip(&xty).map(|(m, x)| m * x).sum::<f64>();
        let rss = (yty - explained).max(0.0);
        Ok(NormalEquations { mean, chol, rss })
    }
}

/// Solved augmented normal equations: conditional mean, Cholesky factor of
/// the cross-product matrix, and the residual sum of squares at the mean
/// over all augmented rows.
#[derive(Debug, Clone)]
pub(crate) struct NormalEquations {
    pub(crate) mean: Vec<f64>,
    chol: Mat<f64>,
    pub(crate) rss: f64,
}

impl NormalEquations {
    /// Draw from `Normal(mean, variance · (XᵀX)⁻¹)`.
    ///
    /// With `XᵀX = L Lᵀ`, the perturbation is `√variance · L⁻ᵀ z`.
    pub(crate) fn draw(&self, rng: &mut StdRng, variance: f64) -> Vec<f64> {
        let p = self.mean.len();
        let noise: Vec<f64> = (0..p).map(|_| sample_standard_normal(rng)).collect();
        let perturbation = back_substitute(&self.chol, &noise);
        let sd = variance.sqrt();
        self.mean
            .iter()
            .zip(&perturbation)
            .map(|(mean, shift)| sd.mul_add(*shift, *mean))
            .collect()
    }
}

fn is_zero_matrix(matrix: &Mat<f64>) -> bool {
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            if matrix[(i, j)] != 0.0 {
                return false;
            }
        }
    }
    true
}
