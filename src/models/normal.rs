//! Gibbs sampler for the normal linear regression model.
//!
//! State is `(beta, sig2)`. Each sweep draws `beta` from its multivariate
//! normal conditional via the prior-augmented normal equations, then `sig2`
//! from a scaled-inverse-chi-squared conditional unless the variance is
//! fixed.

use rand::rngs::StdRng;
use thiserror::Error;

use crate::distributions::sample_chi_square;
use crate::draws::{NormalDraws, RunStatus};
use crate::input::{InputError, RegressionInput};
use crate::models::augment::AugmentedDesign;
use crate::priors::{CoefficientPrior, VarianceMode};
use crate::utils::{NumericalError, usize_to_f64};

/// Errors returned by normal-regression configuration and sampling.
#[derive(Debug, Error)]
pub enum NormalRegressionError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    #[error("sweep count must be positive")]
    InvalidSweepCount,
    #[error("coefficient prior does not match {expected} covariates")]
    InvalidCoefficientPrior { expected: usize },
    #[error("variance prior hyperparameters must be positive")]
    InvalidVariancePrior,
    #[error("initial beta length ({found}) must match covariate count ({expected})")]
    StateDimensionMismatch { expected: usize, found: usize },
    #[error("initial variance must be positive and finite")]
    InvalidInitialVariance,
}

/// Sampler configuration for the normal linear model.
#[derive(Debug, Clone)]
pub struct NormalRegressionConfig {
    /// Number of Gibbs sweeps; every sweep is stored.
    pub n_sweeps: usize,
    /// Prior on the coefficient vector.
    pub coefficient_prior: CoefficientPrior,
    /// Treatment of the error variance.
    pub variance: VarianceMode,
}

impl NormalRegressionConfig {
    /// # Errors
    ///
    /// Returns `NormalRegressionError` if options are internally
    /// inconsistent for `n_cov` covariates.
    pub fn validate(&self, n_cov: usize) -> Result<(), NormalRegressionError> {
        if self.n_sweeps == 0 {
            return Err(NormalRegressionError::InvalidSweepCount);
        }
        if !self.coefficient_prior.is_valid(n_cov) {
            return Err(NormalRegressionError::InvalidCoefficientPrior { expected: n_cov });
        }
        if !self.variance.is_valid() {
            return Err(NormalRegressionError::InvalidVariancePrior);
        }
        Ok(())
    }
}

/// Mutable chain state, seeded by the caller and updated in place each
/// sweep.
#[derive(Debug, Clone)]
pub struct NormalState {
    pub beta: Vec<f64>,
    pub sig2: f64,
}

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct NormalRegressionRun {
    pub status: RunStatus,
    pub draws: NormalDraws,
}

/// Run the normal-regression Gibbs sampler to completion.
///
/// # Errors
///
/// Returns `NormalRegressionError` if inputs, configuration, or the initial
/// state are invalid, or on a fatal numerical failure.
pub fn run_normal_regression(
    input: &RegressionInput,
    config: &NormalRegressionConfig,
    state: &mut NormalState,
    rng: &mut StdRng,
) -> Result<NormalRegressionRun, NormalRegressionError> {
    run_normal_regression_with_cancel(input, config, state, rng, || false)
}

/// Run the normal-regression Gibbs sampler, polling `should_stop` once per
/// sweep.
///
/// A stop request returns `RunStatus::Cancelled` with the draws recorded so
/// far; slots past the last completed sweep are left untouched.
///
/// # Errors
///
/// Returns `NormalRegressionError` if inputs, configuration, or the initial
/// state are invalid, or on a fatal numerical failure.
pub fn run_normal_regression_with_cancel(
    input: &RegressionInput,
    config: &NormalRegressionConfig,
    state: &mut NormalState,
    rng: &mut StdRng,
    mut should_stop: impl FnMut() -> bool,
) -> Result<NormalRegressionRun, NormalRegressionError> {
    input.validate()?;
    let n_cov = input.n_cov();
    config.validate(n_cov)?;
    if state.beta.len() != n_cov {
        return Err(NormalRegressionError::StateDimensionMismatch {
            expected: n_cov,
            found: state.beta.len(),
        });
    }
    if !(state.sig2 > 0.0 && state.sig2.is_finite()) {
        return Err(NormalRegressionError::InvalidInitialVariance);
    }

    let mut design =
        AugmentedDesign::with_coefficient_prior(&input.design, &config.coefficient_prior)?;
    design.set_responses(&input.outcome);
    // The response and prior rows never change, so the conditional for beta
    // shares one factorization across sweeps.
    let equations = design.solve()?;

    let mut draws = NormalDraws::new(config.n_sweeps, n_cov);
    for _ in 0..config.n_sweeps {
        if should_stop() {
            return Ok(NormalRegressionRun {
                status: RunStatus::Cancelled(draws.n_recorded()),
                draws,
            });
        }

        state.beta = equations.draw(rng, state.sig2);
        draw_variance(input, &design, config.variance, state, rng);
        draws.record(&state.beta, state.sig2);
    }

    Ok(NormalRegressionRun {
        status: RunStatus::Completed(draws.n_recorded()),
        draws,
    })
}

/// Draw `sig2` from its scaled-inverse-chi-squared conditional, using the
/// residual sum of squares at the freshly drawn `beta` over the real rows
/// only.
fn draw_variance(
    input: &RegressionInput,
    design: &AugmentedDesign,
    variance: VarianceMode,
    state: &mut NormalState,
    rng: &mut StdRng,
) {
    let n_obs = usize_to_f64(design.n_obs());
    match variance {
        VarianceMode::Fixed => {}
        VarianceMode::Improper => {
            let rss = real_row_rss(input, design, &state.beta);
            state.sig2 = rss / sample_chi_square(rng, n_obs);
        }
        VarianceMode::ScaledInvChiSquared { scale, df } => {
            let rss = real_row_rss(input, design, &state.beta);
            state.sig2 = df.mul_add(scale, rss) / sample_chi_square(rng, n_obs + df);
        }
    }
}

fn real_row_rss(input: &RegressionInput, design: &AugmentedDesign, beta: &[f64]) -> f64 {
    let mut rss = 0.0;
    for row in 0..design.n_obs() {
        let residual = input.outcome[(row, 0)] - design.row_dot(row, beta);
        rss += residual * residual;
    }
    rss
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::identity_matrix;
    use faer::Mat;
    use rand::SeedableRng;

    fn small_input() -> RegressionInput {
        RegressionInput::new(
            Mat::from_fn(6, 1, |i, _| f64::from(u32::try_from(i).unwrap_or(0))),
            Mat::from_fn(6, 2, |i, j| {
                if j == 0 {
                    1.0
                } else {
                    f64::from(u32::try_from(i).unwrap_or(0))
                }
            }),
        )
    }

    fn improper_config(n_sweeps: usize) -> NormalRegressionConfig {
        NormalRegressionConfig {
            n_sweeps,
            coefficient_prior: CoefficientPrior::Improper,
            variance: VarianceMode::Improper,
        }
    }

    #[test]
    fn rejects_zero_sweeps() {
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_normal_regression(&small_input(), &improper_config(0), &mut state, &mut rng)
            .expect_err("zero sweeps should fail");
        assert!(matches!(err, NormalRegressionError::InvalidSweepCount));
    }

    #[test]
    fn rejects_mismatched_initial_state() {
        let mut state = NormalState {
            beta: vec![0.0],
            sig2: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_normal_regression(&small_input(), &improper_config(5), &mut state, &mut rng)
            .expect_err("short beta should fail");
        assert!(matches!(
            err,
            NormalRegressionError::StateDimensionMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn rejects_non_positive_initial_variance() {
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_normal_regression(&small_input(), &improper_config(5), &mut state, &mut rng)
            .expect_err("zero variance should fail");
        assert!(matches!(err, NormalRegressionError::InvalidInitialVariance));
    }

    #[test]
    fn rejects_prior_with_wrong_dimension() {
        let config = NormalRegressionConfig {
            n_sweeps: 5,
            coefficient_prior: CoefficientPrior::Gaussian {
                mean: vec![0.0; 3],
                precision: identity_matrix(3),
            },
            variance: VarianceMode::Improper,
        };
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_normal_regression(&small_input(), &config, &mut state, &mut rng)
            .expect_err("3-dim prior on 2 covariates should fail");
        assert!(matches!(
            err,
            NormalRegressionError::InvalidCoefficientPrior { expected: 2 }
        ));
    }

    #[test]
    fn fixed_variance_is_retained_for_the_whole_run() {
        let config = NormalRegressionConfig {
            n_sweeps: 20,
            coefficient_prior: CoefficientPrior::Improper,
            variance: VarianceMode::Fixed,
        };
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 2.5,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let run = run_normal_regression(&small_input(), &config, &mut state, &mut rng)
            .expect("run should succeed");
        assert_eq!(run.status, RunStatus::Completed(20));
        assert!(run.draws.sig2_flat().iter().all(|value| *value == 2.5));
        assert_eq!(state.sig2, 2.5);
    }

    #[test]
    fn final_state_matches_last_stored_draw() {
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let run = run_normal_regression(&small_input(), &improper_config(10), &mut state, &mut rng)
            .expect("run should succeed");
        assert_eq!(run.draws.beta_draw(9), state.beta.as_slice());
        assert_eq!(run.draws.sig2_draw(9), state.sig2);
    }

    #[test]
    fn collinear_design_surfaces_a_numerical_error() {
        let input = RegressionInput::new(
            Mat::from_fn(4, 1, |_i, _| 1.0),
            Mat::from_fn(4, 2, |_i, _j| 1.0),
        );
        let mut state = NormalState {
            beta: vec![0.0, 0.0],
            sig2: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(4);
        let err = run_normal_regression(&input, &improper_config(5), &mut state, &mut rng)
            .expect_err("collinear design should fail");
        assert!(matches!(
            err,
            NormalRegressionError::Numerical(NumericalError::NotPositiveDefinite)
        ));
    }
}
