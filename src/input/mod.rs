//! # Model inputs
//!
//! Structured containers for design matrices, outcomes, and group labels,
//! with `from_flat` constructors that unpack the column-major flat arrays
//! used at the marshalling boundary.
//!
//! # Examples
//!
//! ```
//! use conjugate_models::RegressionInput;
//!
//! // Two observations, intercept plus one covariate, column-major.
//! let design = [1.0, 1.0, 0.0, 1.0];
//! let outcome = [0.3, 1.1];
//! let input = RegressionInput::from_flat(&outcome, &design, 2, 2).unwrap();
//!
//! assert_eq!(input.n_obs(), 2);
//! assert_eq!(input.design[(1, 1)], 1.0);
//! ```

use faer::Mat;
use thiserror::Error;

use crate::utils::matrix_is_finite;

/// Errors returned when marshalling or validating model inputs.
///
/// All of these are detected before any sweep runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("input must contain at least one observation")]
    NoObservations,
    #[error("design matrix must have at least one column")]
    EmptyDesign,
    #[error("outcome must be a single column matrix")]
    InvalidOutcomeShape,
    #[error("design matrix rows ({rows}) must match outcome rows ({len})")]
    DimensionMismatch { rows: usize, len: usize },
    #[error("flat array of length {found} does not hold {expected} values")]
    FlatLengthMismatch { expected: usize, found: usize },
    #[error("binary outcome at row {row} is not 0 or 1")]
    NonBinaryOutcome { row: usize },
    #[error("design matrix contains non-finite values")]
    NonFiniteDesign,
    #[error("outcome contains non-finite values")]
    NonFiniteOutcome,
    #[error("group index length ({labels}) must match outcome rows ({rows})")]
    GroupIndexLength { labels: usize, rows: usize },
    #[error("group {group} has no observations")]
    GroupIndexGap { group: usize },
}

/// Input for the normal linear regression model.
#[derive(Debug, Clone)]
pub struct RegressionInput {
    /// Continuous outcome, one row per observation.
    pub outcome: Mat<f64>,
    /// Design matrix, one row per observation.
    pub design: Mat<f64>,
}

impl RegressionInput {
    #[must_use]
    pub const fn new(outcome: Mat<f64>, design: Mat<f64>) -> Self {
        Self { outcome, design }
    }

    /// Unpack column-major flat arrays into a structured input.
    ///
    /// `design[j * n_obs + i]` holds the value for observation `i`,
    /// covariate `j`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FlatLengthMismatch` if either slice does not
    /// hold exactly the implied number of values.
    pub fn from_flat(
        outcome: &[f64],
        design: &[f64],
        n_obs: usize,
        n_cov: usize,
    ) -> Result<Self, InputError> {
        check_flat_len(outcome.len(), n_obs)?;
        check_flat_len(design.len(), n_obs * n_cov)?;
        Ok(Self {
            outcome: Mat::from_fn(n_obs, 1, |i, _| outcome[i]),
            design: Mat::from_fn(n_obs, n_cov, |i, j| design[j * n_obs + i]),
        })
    }

    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.outcome.nrows()
    }

    #[must_use]
    pub fn n_cov(&self) -> usize {
        self.design.ncols()
    }

    /// # Errors
    ///
    /// Returns `InputError` if shapes disagree or values are non-finite.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.outcome.nrows() == 0 {
            return Err(InputError::NoObservations);
        }
        if self.design.ncols() == 0 {
            return Err(InputError::EmptyDesign);
        }
        if self.outcome.ncols() != 1 {
            return Err(InputError::InvalidOutcomeShape);
        }
        if self.design.nrows() != self.outcome.nrows() {
            return Err(InputError::DimensionMismatch {
                rows: self.design.nrows(),
                len: self.outcome.nrows(),
            });
        }
        if !matrix_is_finite(&self.design) {
            return Err(InputError::NonFiniteDesign);
        }
        if !matrix_is_finite(&self.outcome) {
            return Err(InputError::NonFiniteOutcome);
        }
        Ok(())
    }
}

/// Input for the probit model with group random effects.
#[derive(Debug, Clone)]
pub struct GroupedRegressionInput {
    /// Binary outcome, one entry per observation.
    pub outcome: Vec<bool>,
    /// Fixed-effects design matrix, one row per observation.
    pub fixed_design: Mat<f64>,
    /// Random-effects design matrix, one row per observation.
    pub random_design: Mat<f64>,
    /// Group id per observation, in `[0, n_groups)` with no gaps.
    pub group_ids: Vec<usize>,
}

impl GroupedRegressionInput {
    #[must_use]
    pub const fn new(
        outcome: Vec<bool>,
        fixed_design: Mat<f64>,
        random_design: Mat<f64>,
        group_ids: Vec<usize>,
    ) -> Self {
        Self {
            outcome,
            fixed_design,
            random_design,
            group_ids,
        }
    }

    /// Unpack column-major flat arrays into a structured input.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if slice lengths disagree with the stated
    /// dimensions or an outcome entry is not 0/1.
    pub fn from_flat(
        outcome: &[u8],
        fixed_design: &[f64],
        random_design: &[f64],
        group_ids: &[usize],
        n_obs: usize,
        n_fixed: usize,
        n_random: usize,
    ) -> Result<Self, InputError> {
        check_flat_len(outcome.len(), n_obs)?;
        check_flat_len(fixed_design.len(), n_obs * n_fixed)?;
        check_flat_len(random_design.len(), n_obs * n_random)?;
        check_flat_len(group_ids.len(), n_obs)?;
        let outcome = outcome
            .iter()
            .enumerate()
            .map(|(row, &value)| match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(InputError::NonBinaryOutcome { row }),
            })
            .collect::<Result<Vec<bool>, InputError>>()?;
        Ok(Self {
            outcome,
            fixed_design: Mat::from_fn(n_obs, n_fixed, |i, j| fixed_design[j * n_obs + i]),
            random_design: Mat::from_fn(n_obs, n_random, |i, j| random_design[j * n_obs + i]),
            group_ids: group_ids.to_vec(),
        })
    }

    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.outcome.len()
    }

    #[must_use]
    pub fn n_fixed(&self) -> usize {
        self.fixed_design.ncols()
    }

    #[must_use]
    pub fn n_random(&self) -> usize {
        self.random_design.ncols()
    }

    /// Number of groups implied by the index (`max id + 1`).
    #[must_use]
    pub fn n_groups(&self) -> usize {
        self.group_ids.iter().max().map_or(0, |max| max + 1)
    }

    /// # Errors
    ///
    /// Returns `InputError` if shapes disagree, values are non-finite, or
    /// the group index leaves a gap in `0..n_groups`.
    pub fn validate(&self) -> Result<(), InputError> {
        let rows = self.outcome.len();
        if rows == 0 {
            return Err(InputError::NoObservations);
        }
        if self.fixed_design.ncols() == 0 || self.random_design.ncols() == 0 {
            return Err(InputError::EmptyDesign);
        }
        if self.fixed_design.nrows() != rows {
            return Err(InputError::DimensionMismatch {
                rows: self.fixed_design.nrows(),
                len: rows,
            });
        }
        if self.random_design.nrows() != rows {
            return Err(InputError::DimensionMismatch {
                rows: self.random_design.nrows(),
                len: rows,
            });
        }
        if self.group_ids.len() != rows {
            return Err(InputError::GroupIndexLength {
                labels: self.group_ids.len(),
                rows,
            });
        }
        if !matrix_is_finite(&self.fixed_design) || !matrix_is_finite(&self.random_design) {
            return Err(InputError::NonFiniteDesign);
        }
        let n_groups = self.n_groups();
        let mut seen = vec![false; n_groups];
        for &group in &self.group_ids {
            seen[group] = true;
        }
        if let Some(group) = seen.iter().position(|present| !present) {
            return Err(InputError::GroupIndexGap { group });
        }
        Ok(())
    }
}

fn check_flat_len(found: usize, expected: usize) -> Result<(), InputError> {
    if found == expected {
        Ok(())
    } else {
        Err(InputError::FlatLengthMismatch { expected, found })
    }
}
