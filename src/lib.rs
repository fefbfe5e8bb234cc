#![forbid(unsafe_code)]

//! # `conjugate_models`
//!
//! Gibbs samplers for two conjugate Bayesian regression families: normal
//! linear regression with a scalar error variance, and probit regression
//! with correlated group-level random effects and a full random-effects
//! covariance matrix.
//!
//! Conjugate priors are folded into the likelihood as Cholesky-derived
//! pseudo-observations, so proper- and improper-prior draws run through one
//! normal-equations code path. Samplers consume an explicit seeded RNG,
//! store every sweep, and support cooperative cancellation at sweep
//! boundaries.

pub mod distributions;
pub mod draws;
pub mod input;
pub mod models;
pub mod priors;
pub mod summary;
pub mod utils;

pub use draws::{NormalDraws, ProbitMixedDraws, RunStatus};
pub use input::{GroupedRegressionInput, InputError, RegressionInput};
pub use priors::{
    CoefficientPrior, CovariancePrior, VarianceMode, log_inverse_wishart_density,
    log_scaled_inv_chi_squared_density,
};
pub use summary::{
    NormalDrawSummary, ParameterSummary, ProbitMixedDrawSummary, summarize_normal_draws,
    summarize_probit_draws,
};
pub use utils::NumericalError;

pub use models::normal::{
    NormalRegressionConfig, NormalRegressionError, NormalRegressionRun, NormalState,
    run_normal_regression, run_normal_regression_with_cancel,
};
pub use models::probit_mixed::{
    ProbitMixedConfig, ProbitMixedError, ProbitMixedRun, ProbitMixedState, run_probit_mixed,
    run_probit_mixed_with_cancel,
};
