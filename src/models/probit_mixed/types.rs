//! Core public types for the probit mixed model.

use faer::Mat;
use thiserror::Error;

use crate::input::InputError;
use crate::priors::{CoefficientPrior, CovariancePrior};
use crate::utils::{NumericalError, matrix_is_finite};

/// Errors returned by probit mixed-model configuration and sampling.
#[derive(Debug, Error)]
pub enum ProbitMixedError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    #[error("sweep count must be positive")]
    InvalidSweepCount,
    #[error("coefficient prior does not match {expected} fixed effects")]
    InvalidCoefficientPrior { expected: usize },
    #[error("covariance prior does not match {expected} random effects")]
    InvalidCovariancePrior { expected: usize },
    #[error("initial beta length ({found}) must match fixed-effect count ({expected})")]
    BetaDimensionMismatch { expected: usize, found: usize },
    #[error("initial gamma must hold one vector of length {n_random} per group ({n_groups})")]
    GammaDimensionMismatch { n_groups: usize, n_random: usize },
    #[error("initial Psi must be a finite {expected}-dimensional square matrix")]
    PsiDimensionMismatch { expected: usize },
}

/// Sampler configuration for the probit mixed model.
#[derive(Debug, Clone)]
pub struct ProbitMixedConfig {
    /// Number of Gibbs sweeps; every sweep is stored.
    pub n_sweeps: usize,
    /// Prior on the fixed-effect coefficients.
    pub coefficient_prior: CoefficientPrior,
    /// Inverse-Wishart prior on the random-effects covariance.
    pub covariance_prior: CovariancePrior,
    /// Whether to run the marginal-data-augmentation working parameter.
    pub marginal_augmentation: bool,
}

impl ProbitMixedConfig {
    /// # Errors
    ///
    /// Returns `ProbitMixedError` if options are internally inconsistent
    /// for the given model dimensions.
    pub fn validate(&self, n_fixed: usize, n_random: usize) -> Result<(), ProbitMixedError> {
        if self.n_sweeps == 0 {
            return Err(ProbitMixedError::InvalidSweepCount);
        }
        if !self.coefficient_prior.is_valid(n_fixed) {
            return Err(ProbitMixedError::InvalidCoefficientPrior { expected: n_fixed });
        }
        if !self.covariance_prior.is_valid(n_random) {
            return Err(ProbitMixedError::InvalidCovariancePrior { expected: n_random });
        }
        Ok(())
    }
}

/// Mutable chain state, seeded by the caller and updated in place each
/// sweep.
#[derive(Debug, Clone)]
pub struct ProbitMixedState {
    /// Fixed-effect coefficients.
    pub beta: Vec<f64>,
    /// One random-effect vector per group.
    pub gamma: Vec<Vec<f64>>,
    /// Random-effects covariance; symmetric positive definite after every
    /// sweep.
    pub psi: Mat<f64>,
}

impl ProbitMixedState {
    /// Zero coefficients and random effects with an identity covariance.
    #[must_use]
    pub fn zeros(n_fixed: usize, n_random: usize, n_groups: usize) -> Self {
        Self {
            beta: vec![0.0; n_fixed],
            gamma: vec![vec![0.0; n_random]; n_groups],
            psi: crate::utils::identity_matrix(n_random),
        }
    }

    pub(crate) fn validate(
        &self,
        n_fixed: usize,
        n_random: usize,
        n_groups: usize,
    ) -> Result<(), ProbitMixedError> {
        if self.beta.len() != n_fixed {
            return Err(ProbitMixedError::BetaDimensionMismatch {
                expected: n_fixed,
                found: self.beta.len(),
            });
        }
        if self.gamma.len() != n_groups
            || self.gamma.iter().any(|effect| effect.len() != n_random)
        {
            return Err(ProbitMixedError::GammaDimensionMismatch { n_groups, n_random });
        }
        if self.psi.nrows() != n_random
            || self.psi.ncols() != n_random
            || !matrix_is_finite(&self.psi)
        {
            return Err(ProbitMixedError::PsiDimensionMismatch { expected: n_random });
        }
        Ok(())
    }
}
