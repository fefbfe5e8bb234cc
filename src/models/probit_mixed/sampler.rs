//! Gibbs sampler for the probit model with correlated group random effects.
//!
//! State is `(beta, gamma[group], Psi)` plus one ephemeral latent variable
//! per observation. Each sweep runs the fixed update order: latent
//! truncated-normal draws, fixed effects, per-group random effects, then the
//! inverse-Wishart covariance draw, with an optional marginal-data-
//! augmentation working scale wrapped around the whole sweep.

use faer::Mat;
use rand::rngs::StdRng;

use crate::distributions::{
    sample_chi_square, sample_inverse_wishart, sample_truncated_normal_negative,
    sample_truncated_normal_positive,
};
use crate::draws::{ProbitMixedDraws, RunStatus};
use crate::input::GroupedRegressionInput;
use crate::models::augment::AugmentedDesign;
use crate::utils::{
    NumericalError, cholesky_lower, invert_lower_triangular, symmetrize, usize_to_f64,
};

use super::input::{build_group_blocks, partition_groups};
use super::types::{ProbitMixedConfig, ProbitMixedError, ProbitMixedState};

/// Result of a sampling run.
#[derive(Debug, Clone)]
pub struct ProbitMixedRun {
    pub status: RunStatus,
    pub draws: ProbitMixedDraws,
}

/// Run the probit mixed-model Gibbs sampler to completion.
///
/// # Errors
///
/// Returns `ProbitMixedError` if inputs, configuration, or the initial
/// state are invalid, or on a fatal numerical failure.
pub fn run_probit_mixed(
    input: &GroupedRegressionInput,
    config: &ProbitMixedConfig,
    state: &mut ProbitMixedState,
    rng: &mut StdRng,
) -> Result<ProbitMixedRun, ProbitMixedError> {
    run_probit_mixed_with_cancel(input, config, state, rng, || false)
}

/// Run the probit mixed-model Gibbs sampler, polling `should_stop` once per
/// sweep.
///
/// A stop request returns `RunStatus::Cancelled` with the draws recorded so
/// far; slots past the last completed sweep are left untouched.
///
/// # Errors
///
/// Returns `ProbitMixedError` if inputs, configuration, or the initial
/// state are invalid, or on a fatal numerical failure.
pub fn run_probit_mixed_with_cancel(
    input: &GroupedRegressionInput,
    config: &ProbitMixedConfig,
    state: &mut ProbitMixedState,
    rng: &mut StdRng,
    mut should_stop: impl FnMut() -> bool,
) -> Result<ProbitMixedRun, ProbitMixedError> {
    input.validate()?;
    let n_fixed = input.n_fixed();
    let n_random = input.n_random();
    let n_groups = input.n_groups();
    config.validate(n_fixed, n_random)?;
    state.validate(n_fixed, n_random, n_groups)?;

    let mut fixed_design =
        AugmentedDesign::with_coefficient_prior(&input.fixed_design, &config.coefficient_prior)?;
    let group_rows = partition_groups(&input.group_ids, n_groups);
    let mut group_blocks = build_group_blocks(&input.random_design, &group_rows);
    let mut latent = vec![0.0; input.n_obs()];

    let mut draws = ProbitMixedDraws::new(config.n_sweeps, n_fixed, n_random, n_groups);
    for _ in 0..config.n_sweeps {
        if should_stop() {
            return Ok(ProbitMixedRun {
                status: RunStatus::Cancelled(draws.n_recorded()),
                draws,
            });
        }

        gibbs_sweep(
            input,
            config,
            &group_rows,
            &mut fixed_design,
            &mut group_blocks,
            &mut latent,
            state,
            rng,
        )?;
        draws.record(&state.beta, &state.psi, &state.gamma);
    }

    Ok(ProbitMixedRun {
        status: RunStatus::Completed(draws.n_recorded()),
        draws,
    })
}

/// One Gibbs sweep. The update order is fixed: each step conditions on the
/// latest values drawn by the steps before it.
#[allow(clippy::too_many_arguments)]
fn gibbs_sweep(
    input: &GroupedRegressionInput,
    config: &ProbitMixedConfig,
    group_rows: &[Vec<usize>],
    fixed_design: &mut AugmentedDesign,
    group_blocks: &mut [AugmentedDesign],
    latent: &mut [f64],
    state: &mut ProbitMixedState,
    rng: &mut StdRng,
) -> Result<(), ProbitMixedError> {
    let n_obs = usize_to_f64(input.n_obs());
    let n_random = input.n_random();

    // Working scale drawn from its prior; identity when MDA is off.
    let mut working = if config.marginal_augmentation {
        n_obs / sample_chi_square(rng, n_obs)
    } else {
        1.0
    };
    let mut scale = working.sqrt();

    // Step 1: latent variables, truncated to the side the outcome dictates.
    for row in 0..latent.len() {
        let random_part = random_row_dot(
            &input.random_design,
            row,
            &state.gamma[input.group_ids[row]],
        );
        let mean = fixed_design.row_dot(row, &state.beta) + random_part;
        let value = if input.outcome[row] {
            sample_truncated_normal_positive(rng, mean)
        } else {
            sample_truncated_normal_negative(rng, mean)
        };
        latent[row] = value * scale;
        fixed_design.set_response(row, (value - random_part) * scale);
    }

    // Step 2: fixed effects from the prior-augmented normal equations. The
    // working scale is refreshed from the augmented residual sum of squares
    // before the draw.
    let equations = fixed_design.solve()?;
    if config.marginal_augmentation {
        working = equations.rss / sample_chi_square(rng, n_obs);
        scale = working.sqrt();
    }
    state.beta = equations.draw(rng, working);

    // Step 3: per-group random effects. The pseudo-rows are L⁻¹ with
    // Psi = L Lᵀ, so the block contributes Psi⁻¹ as the prior precision.
    let psi_chol = cholesky_lower(&state.psi).ok_or(NumericalError::NotPositiveDefinite)?;
    let prior_rows = invert_lower_triangular(&psi_chol);
    for (group, block) in group_blocks.iter_mut().enumerate() {
        block.write_prior_rows(&prior_rows);
        for (slot, &row) in group_rows[group].iter().enumerate() {
            block.set_response(slot, latent[row] - fixed_design.row_dot(row, &state.beta));
        }
        let group_equations = block.solve()?;
        state.gamma[group] = group_equations.draw(rng, working);
    }

    // Step 4: covariance from its inverse-Wishart conditional.
    let mut scale_matrix = config.covariance_prior.scale.clone();
    for effect in &state.gamma {
        for row in 0..n_random {
            for col in 0..n_random {
                scale_matrix[(row, col)] += effect[row] * effect[col];
            }
        }
    }
    symmetrize(&mut scale_matrix);
    let df = config.covariance_prior.df + usize_to_f64(state.gamma.len());
    let mut psi = sample_inverse_wishart(rng, df, &scale_matrix)?;
    // The inversion leaves round-off asymmetry; the draw itself is SPD.
    symmetrize(&mut psi);
    state.psi = psi;

    // Step 5: return every block to the identified unit-variance scale.
    if config.marginal_augmentation {
        for value in &mut state.beta {
            *value /= scale;
        }
        for effect in &mut state.gamma {
            for value in effect {
                *value /= scale;
            }
        }
        for row in 0..n_random {
            for col in 0..n_random {
                state.psi[(row, col)] /= working;
            }
        }
    }

    Ok(())
}

fn random_row_dot(design: &Mat<f64>, row: usize, effect: &[f64]) -> f64 {
    let mut total = 0.0;
    for col in 0..design.ncols() {
        total += design[(row, col)] * effect[col];
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priors::{CoefficientPrior, CovariancePrior};
    use crate::utils::identity_matrix;
    use rand::SeedableRng;

    fn toy_input() -> GroupedRegressionInput {
        let n = 12;
        GroupedRegressionInput::new(
            (0..n).map(|i| i % 3 != 0).collect(),
            Mat::from_fn(n, 2, |i, j| {
                if j == 0 {
                    1.0
                } else {
                    f64::from(u32::try_from(i % 4).unwrap_or(0))
                }
            }),
            Mat::from_fn(n, 1, |_i, _j| 1.0),
            (0..n).map(|i| i % 3).collect(),
        )
    }

    fn toy_config(mda: bool) -> ProbitMixedConfig {
        ProbitMixedConfig {
            n_sweeps: 25,
            coefficient_prior: CoefficientPrior::Gaussian {
                mean: vec![0.0, 0.0],
                precision: Mat::from_fn(2, 2, |i, j| if i == j { 0.1 } else { 0.0 }),
            },
            covariance_prior: CovariancePrior {
                df: 3.0,
                scale: identity_matrix(1),
            },
            marginal_augmentation: mda,
        }
    }

    #[test]
    fn psi_stays_positive_definite_with_and_without_mda() {
        for mda in [false, true] {
            let input = toy_input();
            let config = toy_config(mda);
            let mut state = ProbitMixedState::zeros(2, 1, 3);
            let mut rng = StdRng::seed_from_u64(21);
            let run = run_probit_mixed(&input, &config, &mut state, &mut rng)
                .expect("run should succeed");
            assert_eq!(run.status, RunStatus::Completed(25));
            for sweep in 0..run.draws.n_recorded() {
                let psi = run.draws.psi_draw(sweep);
                assert!(cholesky_lower(&psi).is_some());
            }
        }
    }

    #[test]
    fn final_state_matches_last_stored_draw() {
        let input = toy_input();
        let config = toy_config(true);
        let mut state = ProbitMixedState::zeros(2, 1, 3);
        let mut rng = StdRng::seed_from_u64(22);
        let run =
            run_probit_mixed(&input, &config, &mut state, &mut rng).expect("run should succeed");
        let last = run.draws.n_recorded() - 1;
        assert_eq!(run.draws.beta_draw(last), state.beta.as_slice());
        assert_eq!(run.draws.gamma_draw(last, 2), state.gamma[2].as_slice());
        assert_eq!(run.draws.psi_draw(last)[(0, 0)], state.psi[(0, 0)]);
    }

    #[test]
    fn indefinite_initial_psi_is_a_fatal_error() {
        let input = toy_input();
        let config = toy_config(false);
        let mut state = ProbitMixedState::zeros(2, 1, 3);
        state.psi[(0, 0)] = -1.0;
        let mut rng = StdRng::seed_from_u64(23);
        let err = run_probit_mixed(&input, &config, &mut state, &mut rng)
            .expect_err("indefinite Psi should fail");
        assert!(matches!(
            err,
            ProbitMixedError::Numerical(NumericalError::NotPositiveDefinite)
        ));
    }
}
