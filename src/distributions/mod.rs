//! Random variate generators used by the Gibbs sweeps.
//!
//! Every generator consumes an explicit `StdRng`, so identically seeded
//! streams replay identical draw sequences.

use faer::Mat;
use rand::RngExt;
use rand::rngs::StdRng;
use statrs::function::erf::erf;

use crate::utils::{NumericalError, cholesky_lower, matrix_inverse, usize_to_f64};

/// Standardized bound above which the one-sided truncated normal sampler
/// switches from naive rejection to exponential rejection.
const TAIL_REJECTION_BOUND: f64 = 0.45;

/// Standard normal draw via Box–Muller.
#[must_use]
pub fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let u1 = (1.0_f64 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    (-2.0_f64 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn standard_normal_cdf(value: f64) -> f64 {
    0.5 * (1.0 + erf(value / std::f64::consts::SQRT_2))
}

/// Gamma draw with the given shape and scale, Marsaglia–Tsang squeeze with
/// the boost step for shape below one.
#[must_use]
pub fn sample_gamma(rng: &mut StdRng, shape: f64, scale: f64) -> f64 {
    if !(shape > 0.0 && scale > 0.0) {
        return f64::NAN;
    }

    if shape < 1.0 {
        let u = (1.0_f64 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
        return sample_gamma(rng, shape + 1.0, scale) * u.powf(1.0 / shape);
    }

    let shape_minus_third = shape - (1.0 / 3.0);
    let coeff = (1.0 / (9.0 * shape_minus_third)).sqrt();
    loop {
        let standard_normal = sample_standard_normal(rng);
        let one_plus_coeff_noise = coeff.mul_add(standard_normal, 1.0);
        if one_plus_coeff_noise <= 0.0 {
            continue;
        }
        let cubic_term = one_plus_coeff_noise * one_plus_coeff_noise * one_plus_coeff_noise;
        let uniform = rng.random::<f64>();
        if uniform
            < (0.0331 * standard_normal * standard_normal * standard_normal)
                .mul_add(-standard_normal, 1.0)
        {
            return scale * shape_minus_third * cubic_term;
        }
        if uniform.ln()
            < (0.5 * standard_normal).mul_add(
                standard_normal,
                shape_minus_third * (1.0 - cubic_term + cubic_term.ln()),
            )
        {
            return scale * shape_minus_third * cubic_term;
        }
    }
}

/// Chi-squared draw with `dof` degrees of freedom.
#[must_use]
pub fn sample_chi_square(rng: &mut StdRng, dof: f64) -> f64 {
    sample_gamma(rng, 0.5 * dof, 2.0)
}

/// Draw from `Normal(mean, 1)` truncated to `[0, ∞)`.
#[must_use]
pub fn sample_truncated_normal_positive(rng: &mut StdRng, mean: f64) -> f64 {
    mean + standard_normal_at_least(rng, -mean)
}

/// Draw from `Normal(mean, 1)` truncated to `(−∞, 0]`.
#[must_use]
pub fn sample_truncated_normal_negative(rng: &mut StdRng, mean: f64) -> f64 {
    -(standard_normal_at_least(rng, mean) - mean)
}

/// Standard normal draw conditioned on being at least `bound`.
///
/// Naive rejection is used while the acceptance region keeps decent mass;
/// past that, exponential rejection (Robert 1995) keeps the acceptance
/// probability bounded away from zero arbitrarily deep in the tail.
fn standard_normal_at_least(rng: &mut StdRng, bound: f64) -> f64 {
    if bound <= TAIL_REJECTION_BOUND {
        loop {
            let z = sample_standard_normal(rng);
            if z >= bound {
                return z;
            }
        }
    }

    let lambda = 0.5 * (bound + bound.mul_add(bound, 4.0).sqrt());
    loop {
        let u = (1.0_f64 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
        let z = bound - u.ln() / lambda;
        let gap = z - lambda;
        if rng.random::<f64>() <= (-0.5 * gap * gap).exp() {
            return z;
        }
    }
}

/// Wishart draw with `df` degrees of freedom and the given scale matrix,
/// via the Bartlett decomposition.
///
/// # Errors
///
/// Returns `NumericalError::NotPositiveDefinite` if the scale fails its
/// Cholesky factorization or `df` does not exceed `dim - 1`.
pub fn sample_wishart(rng: &mut StdRng, df: f64, scale: &Mat<f64>) -> Result<Mat<f64>, NumericalError> {
    let dim = scale.ncols();
    if dim == 0 || df <= usize_to_f64(dim) - 1.0 {
        return Err(NumericalError::NotPositiveDefinite);
    }
    let chol = cholesky_lower(scale).ok_or(NumericalError::NotPositiveDefinite)?;
    let mut bartlett = Mat::<f64>::zeros(dim, dim);
    for row in 0..dim {
        let dof = df - usize_to_f64(row);
        bartlett[(row, row)] = sample_chi_square(rng, dof).sqrt();
        for col in 0..row {
            bartlett[(row, col)] = sample_standard_normal(rng);
        }
    }
    let product = &chol * &bartlett;
    Ok(&product * product.transpose())
}

/// Inverse-Wishart draw with `df` degrees of freedom and the given scale
/// matrix.
///
/// # Errors
///
/// Returns `NumericalError` if the scale cannot be inverted or the
/// underlying Wishart draw fails; callers treat this as fatal.
pub fn sample_inverse_wishart(
    rng: &mut StdRng,
    df: f64,
    scale: &Mat<f64>,
) -> Result<Mat<f64>, NumericalError> {
    let inv_scale = matrix_inverse(scale)?;
    let precision_sample = sample_wishart(rng, df, &inv_scale)?;
    matrix_inverse(&precision_sample)
}
