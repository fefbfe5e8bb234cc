//! Prior specifications and log-density helpers.
//!
//! Priors are tagged variants dispatched once at setup: the samplers never
//! re-branch on proper/improper flags inside the sweep loop.

use faer::Mat;
use statrs::function::gamma::ln_gamma;

use crate::utils::{cholesky_lower, invert_lower_triangular, matrix_is_finite, usize_to_f64};

/// Prior on a coefficient vector (fixed effects).
#[derive(Debug, Clone)]
pub enum CoefficientPrior {
    /// Flat prior `p(beta) ∝ 1`.
    Improper,
    /// Conjugate `Normal(mean, precision⁻¹)` prior.
    ///
    /// A precision matrix that is exactly zero degenerates to the improper
    /// case: the augmentation it induces contributes no pseudo-observations.
    Gaussian { mean: Vec<f64>, precision: Mat<f64> },
}

impl CoefficientPrior {
    /// Whether the prior is dimensionally and numerically consistent with a
    /// coefficient vector of length `dim`.
    #[must_use]
    pub fn is_valid(&self, dim: usize) -> bool {
        match self {
            Self::Improper => true,
            Self::Gaussian { mean, precision } => {
                mean.len() == dim
                    && precision.nrows() == dim
                    && precision.ncols() == dim
                    && mean.iter().all(|value| value.is_finite())
                    && matrix_is_finite(precision)
            }
        }
    }
}

/// Treatment of the error variance in the normal linear model.
#[derive(Debug, Clone, Copy)]
pub enum VarianceMode {
    /// Keep the caller-supplied variance for the entire run.
    Fixed,
    /// Improper prior `p(sig2) ∝ 1/sig2`.
    Improper,
    /// Conjugate scaled-inverse-chi-squared prior with the given scale and
    /// degrees of freedom.
    ScaledInvChiSquared { scale: f64, df: f64 },
}

impl VarianceMode {
    /// Whether the variance hyperparameters are numerically valid.
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::Fixed | Self::Improper => true,
            Self::ScaledInvChiSquared { scale, df } => scale > 0.0 && df > 0.0,
        }
    }
}

/// Inverse-Wishart prior on the random-effects covariance matrix.
#[derive(Debug, Clone)]
pub struct CovariancePrior {
    /// Prior degrees of freedom.
    pub df: f64,
    /// Prior scale matrix.
    pub scale: Mat<f64>,
}

impl CovariancePrior {
    /// Whether the prior is proper for a covariance of dimension `dim`.
    #[must_use]
    pub fn is_valid(&self, dim: usize) -> bool {
        self.scale.nrows() == dim
            && self.scale.ncols() == dim
            && matrix_is_finite(&self.scale)
            && self.df > usize_to_f64(dim) - 1.0
    }
}

/// Log-density for `ScaledInvChiSq(df, scale)`.
#[must_use]
pub fn log_scaled_inv_chi_squared_density(value: f64, df: f64, scale: f64) -> f64 {
    if !(value > 0.0 && df > 0.0 && scale > 0.0) {
        return f64::NEG_INFINITY;
    }
    let half_df = 0.5 * df;
    half_df.mul_add(
        (half_df * scale).ln(),
        -ln_gamma(half_df) - (1.0 + half_df).mul_add(value.ln(), half_df * scale / value),
    )
}

/// Log-density for `InverseWishart(df, scale)` evaluated at a symmetric
/// positive-definite matrix.
///
/// Returns negative infinity when the argument or the scale fails its
/// Cholesky factorization.
#[must_use]
pub fn log_inverse_wishart_density(value: &Mat<f64>, df: f64, scale: &Mat<f64>) -> f64 {
    let dim = value.ncols();
    if dim == 0 || value.nrows() != dim || scale.nrows() != dim || scale.ncols() != dim {
        return f64::NEG_INFINITY;
    }
    let q = usize_to_f64(dim);
    if df <= q - 1.0 {
        return f64::NEG_INFINITY;
    }
    let Some(value_chol) = cholesky_lower(value) else {
        return f64::NEG_INFINITY;
    };
    let Some(scale_chol) = cholesky_lower(scale) else {
        return f64::NEG_INFINITY;
    };

    let log_det_value = 2.0 * log_diag_sum(&value_chol);
    let log_det_scale = 2.0 * log_diag_sum(&scale_chol);

    let value_chol_inv = invert_lower_triangular(&value_chol);
    let value_inverse = value_chol_inv.transpose() * &value_chol_inv;
    let mut trace = 0.0;
    for row in 0..dim {
        for col in 0..dim {
            trace += scale[(row, col)] * value_inverse[(col, row)];
        }
    }

    0.5 * df * log_det_scale
        - 0.5 * df * q * std::f64::consts::LN_2
        - ln_multivariate_gamma(0.5 * df, dim)
        - 0.5 * (df + q + 1.0) * log_det_value
        - 0.5 * trace
}

fn log_diag_sum(lower: &Mat<f64>) -> f64 {
    (0..lower.ncols()).map(|idx| lower[(idx, idx)].ln()).sum()
}

fn ln_multivariate_gamma(a: f64, dim: usize) -> f64 {
    let q = usize_to_f64(dim);
    let mut total = 0.25 * q * (q - 1.0) * std::f64::consts::PI.ln();
    for j in 0..dim {
        total += ln_gamma(a - 0.5 * usize_to_f64(j));
    }
    total
}
