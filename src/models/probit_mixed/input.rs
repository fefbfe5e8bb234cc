//! Group partitioning for the probit mixed model.

use faer::Mat;

use crate::models::augment::AugmentedDesign;

/// Row indices per group, in original observation order.
pub(crate) fn partition_groups(group_ids: &[usize], n_groups: usize) -> Vec<Vec<usize>> {
    let mut rows = vec![Vec::new(); n_groups];
    for (row, &group) in group_ids.iter().enumerate() {
        rows[group].push(row);
    }
    rows
}

/// One augmented design block per group: the group's random-effect rows in
/// original order, followed by `n_random` pseudo-rows rewritten each sweep
/// from the current covariance.
pub(crate) fn build_group_blocks(
    random_design: &Mat<f64>,
    group_rows: &[Vec<usize>],
) -> Vec<AugmentedDesign> {
    let n_random = random_design.ncols();
    group_rows
        .iter()
        .map(|rows| AugmentedDesign::from_rows(random_design, rows, n_random))
        .collect()
}
