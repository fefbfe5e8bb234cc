use faer::Mat;
use rand::SeedableRng;
use rand::rngs::StdRng;

use conjugate_models::distributions::sample_standard_normal;
use conjugate_models::{
    CoefficientPrior, NormalRegressionConfig, NormalState, RegressionInput, RunStatus,
    VarianceMode, run_normal_regression, run_normal_regression_with_cancel,
    summarize_normal_draws,
};

const TRUE_BETA: [f64; 2] = [1.5, -0.7];
const TRUE_SIG2: f64 = 0.8;

fn synthetic_input(n_obs: usize, seed: u64) -> RegressionInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let design = Mat::from_fn(n_obs, 2, |_i, j| {
        if j == 0 {
            1.0
        } else {
            sample_standard_normal(&mut rng)
        }
    });
    let outcome = Mat::from_fn(n_obs, 1, |i, _| {
        let noise = TRUE_SIG2.sqrt() * sample_standard_normal(&mut rng);
        TRUE_BETA[0] + TRUE_BETA[1] * design[(i, 1)] + noise
    });
    RegressionInput::new(outcome, design)
}

fn fresh_state() -> NormalState {
    NormalState {
        beta: vec![0.0, 0.0],
        sig2: 1.0,
    }
}

#[test]
fn posterior_means_recover_the_generating_parameters() {
    let input = synthetic_input(400, 100);
    let config = NormalRegressionConfig {
        n_sweeps: 3_000,
        coefficient_prior: CoefficientPrior::Improper,
        variance: VarianceMode::Improper,
    };
    let mut state = fresh_state();
    let mut rng = StdRng::seed_from_u64(101);
    let run =
        run_normal_regression(&input, &config, &mut state, &mut rng).expect("run should succeed");
    assert_eq!(run.status, RunStatus::Completed(3_000));

    let summary = summarize_normal_draws(&run.draws);
    assert!((summary.beta[0].mean - TRUE_BETA[0]).abs() < 0.15);
    assert!((summary.beta[1].mean - TRUE_BETA[1]).abs() < 0.15);
    let sig2 = summary.sig2.expect("variance summarized");
    assert!((sig2.mean - TRUE_SIG2).abs() < 0.2);
    // The credible interval should bracket the truth comfortably.
    assert!(summary.beta[1].q025 < TRUE_BETA[1] && TRUE_BETA[1] < summary.beta[1].q975);
}

#[test]
fn zero_precision_matches_the_improper_prior_exactly() {
    let input = synthetic_input(50, 200);
    let improper = NormalRegressionConfig {
        n_sweeps: 200,
        coefficient_prior: CoefficientPrior::Improper,
        variance: VarianceMode::Improper,
    };
    let zero_precision = NormalRegressionConfig {
        n_sweeps: 200,
        coefficient_prior: CoefficientPrior::Gaussian {
            mean: vec![5.0, -5.0],
            precision: Mat::<f64>::zeros(2, 2),
        },
        variance: VarianceMode::Improper,
    };

    let mut state_a = fresh_state();
    let mut rng_a = StdRng::seed_from_u64(201);
    let run_a = run_normal_regression(&input, &improper, &mut state_a, &mut rng_a)
        .expect("improper run should succeed");

    let mut state_b = fresh_state();
    let mut rng_b = StdRng::seed_from_u64(201);
    let run_b = run_normal_regression(&input, &zero_precision, &mut state_b, &mut rng_b)
        .expect("zero-precision run should succeed");

    assert_eq!(run_a.draws.beta_flat(), run_b.draws.beta_flat());
    assert_eq!(run_a.draws.sig2_flat(), run_b.draws.sig2_flat());
}

#[test]
fn tight_prior_pins_the_coefficients_at_the_prior_mean() {
    let input = synthetic_input(30, 300);
    let target = [4.0, 2.0];
    let config = NormalRegressionConfig {
        n_sweeps: 100,
        coefficient_prior: CoefficientPrior::Gaussian {
            mean: target.to_vec(),
            precision: Mat::from_fn(2, 2, |i, j| if i == j { 1.0e12 } else { 0.0 }),
        },
        variance: VarianceMode::Fixed,
    };
    let mut state = fresh_state();
    let mut rng = StdRng::seed_from_u64(301);
    let run =
        run_normal_regression(&input, &config, &mut state, &mut rng).expect("run should succeed");
    for sweep in 0..run.draws.n_recorded() {
        let beta = run.draws.beta_draw(sweep);
        assert!((beta[0] - target[0]).abs() < 1.0e-3);
        assert!((beta[1] - target[1]).abs() < 1.0e-3);
    }
}

#[test]
fn proper_variance_prior_dominates_with_high_degrees_of_freedom() {
    let input = synthetic_input(20, 400);
    let config = NormalRegressionConfig {
        n_sweeps: 500,
        coefficient_prior: CoefficientPrior::Improper,
        variance: VarianceMode::ScaledInvChiSquared {
            scale: 3.0,
            df: 1.0e6,
        },
    };
    let mut state = fresh_state();
    let mut rng = StdRng::seed_from_u64(401);
    let run =
        run_normal_regression(&input, &config, &mut state, &mut rng).expect("run should succeed");
    let summary = summarize_normal_draws(&run.draws);
    assert!((summary.sig2.expect("variance summarized").mean - 3.0).abs() < 0.05);
}

#[test]
fn cancellation_after_k_sweeps_reports_k_and_leaves_later_slots_untouched() {
    let input = synthetic_input(40, 500);
    let config = NormalRegressionConfig {
        n_sweeps: 100,
        coefficient_prior: CoefficientPrior::Improper,
        variance: VarianceMode::Improper,
    };
    let mut state = fresh_state();
    let mut rng = StdRng::seed_from_u64(501);
    let mut polls = 0;
    let run = run_normal_regression_with_cancel(&input, &config, &mut state, &mut rng, || {
        polls += 1;
        polls > 7
    })
    .expect("run should succeed");

    assert_eq!(run.status, RunStatus::Cancelled(7));
    assert!(run.status.is_cancelled());
    assert_eq!(run.draws.n_recorded(), 7);
    for sweep in 0..7 {
        assert!(run.draws.sig2_draw(sweep) > 0.0);
    }
    for sweep in 7..100 {
        assert_eq!(run.draws.sig2_draw(sweep), 0.0);
        assert!(run.draws.beta_draw(sweep).iter().all(|value| *value == 0.0));
    }
}

#[test]
fn identical_seeds_replay_identical_draw_sequences() {
    let input = synthetic_input(60, 600);
    let config = NormalRegressionConfig {
        n_sweeps: 250,
        coefficient_prior: CoefficientPrior::Gaussian {
            mean: vec![0.0, 0.0],
            precision: Mat::from_fn(2, 2, |i, j| if i == j { 0.01 } else { 0.0 }),
        },
        variance: VarianceMode::ScaledInvChiSquared { scale: 1.0, df: 3.0 },
    };

    let mut state_a = fresh_state();
    let mut rng_a = StdRng::seed_from_u64(601);
    let run_a = run_normal_regression(&input, &config, &mut state_a, &mut rng_a)
        .expect("first run should succeed");

    let mut state_b = fresh_state();
    let mut rng_b = StdRng::seed_from_u64(601);
    let run_b = run_normal_regression(&input, &config, &mut state_b, &mut rng_b)
        .expect("second run should succeed");

    assert_eq!(run_a.draws.beta_flat(), run_b.draws.beta_flat());
    assert_eq!(run_a.draws.sig2_flat(), run_b.draws.sig2_flat());
    assert_eq!(state_a.beta, state_b.beta);
}

#[test]
fn flat_marshalling_matches_the_structured_constructor() {
    let structured = synthetic_input(10, 700);
    let mut outcome = Vec::with_capacity(10);
    let mut design = vec![0.0; 20];
    for i in 0..10 {
        outcome.push(structured.outcome[(i, 0)]);
        for j in 0..2 {
            design[j * 10 + i] = structured.design[(i, j)];
        }
    }
    let flat = RegressionInput::from_flat(&outcome, &design, 10, 2).expect("valid flat input");

    let config = NormalRegressionConfig {
        n_sweeps: 50,
        coefficient_prior: CoefficientPrior::Improper,
        variance: VarianceMode::Improper,
    };
    let mut state_a = fresh_state();
    let mut rng_a = StdRng::seed_from_u64(701);
    let run_a = run_normal_regression(&structured, &config, &mut state_a, &mut rng_a)
        .expect("structured run should succeed");
    let mut state_b = fresh_state();
    let mut rng_b = StdRng::seed_from_u64(701);
    let run_b = run_normal_regression(&flat, &config, &mut state_b, &mut rng_b)
        .expect("flat run should succeed");
    assert_eq!(run_a.draws.beta_flat(), run_b.draws.beta_flat());
}
