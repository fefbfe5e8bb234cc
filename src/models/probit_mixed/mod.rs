//! Probit regression with correlated group random effects.
//!
//! The flagship sampler of the crate: latent-variable data augmentation
//! turns the binary likelihood into a linear-Gaussian one, and the fixed
//! effects, per-group random effects, and full random-effects covariance
//! are each drawn from their exact conjugate conditionals.

pub(crate) mod input;
pub mod sampler;
pub mod types;

pub use sampler::{ProbitMixedRun, run_probit_mixed, run_probit_mixed_with_cancel};
pub use types::{ProbitMixedConfig, ProbitMixedError, ProbitMixedState};
