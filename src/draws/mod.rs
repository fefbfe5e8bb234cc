//! Flat draw storage shared by both model families.
//!
//! Buffers are allocated at their exact final size before the sweep loop and
//! are never resized; a cancelled run leaves the slots past the last
//! completed sweep untouched. One record per sweep, fixed column order:
//! fixed effects, then (mixed model) the upper triangle of `Psi` row-major,
//! then all group random effects group-major.

use faer::Mat;

/// Outcome of a sweep loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// All requested sweeps ran.
    Completed(usize),
    /// The cancellation callback requested a stop after this many sweeps.
    Cancelled(usize),
}

impl RunStatus {
    /// Number of sweeps that actually ran.
    #[must_use]
    pub const fn sweeps(self) -> usize {
        match self {
            Self::Completed(count) | Self::Cancelled(count) => count,
        }
    }

    #[must_use]
    pub const fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Draw storage for the normal linear regression chain.
#[derive(Debug, Clone)]
pub struct NormalDraws {
    beta: Vec<f64>,
    sig2: Vec<f64>,
    n_cov: usize,
    recorded: usize,
}

impl NormalDraws {
    #[must_use]
    pub fn new(n_sweeps: usize, n_cov: usize) -> Self {
        Self {
            beta: vec![0.0; n_sweeps * n_cov],
            sig2: vec![0.0; n_sweeps],
            n_cov,
            recorded: 0,
        }
    }

    /// Append one sweep's state.
    ///
    /// # Panics
    ///
    /// Panics if the buffers are already full or `beta` has the wrong
    /// length; the driver sizes both at construction.
    pub fn record(&mut self, beta: &[f64], sig2: f64) {
        assert_eq!(beta.len(), self.n_cov);
        let offset = self.recorded * self.n_cov;
        self.beta[offset..offset + self.n_cov].copy_from_slice(beta);
        self.sig2[self.recorded] = sig2;
        self.recorded += 1;
    }

    /// Number of sweeps recorded so far.
    #[must_use]
    pub const fn n_recorded(&self) -> usize {
        self.recorded
    }

    #[must_use]
    pub const fn n_cov(&self) -> usize {
        self.n_cov
    }

    /// Coefficient draw for one sweep.
    #[must_use]
    pub fn beta_draw(&self, sweep: usize) -> &[f64] {
        &self.beta[sweep * self.n_cov..(sweep + 1) * self.n_cov]
    }

    /// Variance draw for one sweep.
    #[must_use]
    pub fn sig2_draw(&self, sweep: usize) -> f64 {
        self.sig2[sweep]
    }

    /// Full coefficient buffer, sweep-major.
    #[must_use]
    pub fn beta_flat(&self) -> &[f64] {
        &self.beta
    }

    /// Full variance buffer.
    #[must_use]
    pub fn sig2_flat(&self) -> &[f64] {
        &self.sig2
    }
}

/// Draw storage for the probit mixed-model chain.
#[derive(Debug, Clone)]
pub struct ProbitMixedDraws {
    beta: Vec<f64>,
    psi_upper: Vec<f64>,
    gamma: Vec<f64>,
    n_fixed: usize,
    n_random: usize,
    n_groups: usize,
    recorded: usize,
}

impl ProbitMixedDraws {
    #[must_use]
    pub fn new(n_sweeps: usize, n_fixed: usize, n_random: usize, n_groups: usize) -> Self {
        let psi_block = n_random * (n_random + 1) / 2;
        Self {
            beta: vec![0.0; n_sweeps * n_fixed],
            psi_upper: vec![0.0; n_sweeps * psi_block],
            gamma: vec![0.0; n_sweeps * n_groups * n_random],
            n_fixed,
            n_random,
            n_groups,
            recorded: 0,
        }
    }

    const fn psi_block(&self) -> usize {
        self.n_random * (self.n_random + 1) / 2
    }

    /// Append one sweep's state: `beta`, then the upper triangle of `psi`
    /// row-major, then every group's random effects group-major.
    ///
    /// # Panics
    ///
    /// Panics if the buffers are already full or a block has the wrong
    /// shape; the driver sizes everything at construction.
    pub fn record(&mut self, beta: &[f64], psi: &Mat<f64>, gamma: &[Vec<f64>]) {
        assert_eq!(beta.len(), self.n_fixed);
        assert_eq!(psi.nrows(), self.n_random);
        assert_eq!(gamma.len(), self.n_groups);

        let offset = self.recorded * self.n_fixed;
        self.beta[offset..offset + self.n_fixed].copy_from_slice(beta);

        let mut cursor = self.recorded * self.psi_block();
        for row in 0..self.n_random {
            for col in row..self.n_random {
                self.psi_upper[cursor] = psi[(row, col)];
                cursor += 1;
            }
        }

        let mut cursor = self.recorded * self.n_groups * self.n_random;
        for group_effect in gamma {
            assert_eq!(group_effect.len(), self.n_random);
            self.gamma[cursor..cursor + self.n_random].copy_from_slice(group_effect);
            cursor += self.n_random;
        }

        self.recorded += 1;
    }

    /// Number of sweeps recorded so far.
    #[must_use]
    pub const fn n_recorded(&self) -> usize {
        self.recorded
    }

    #[must_use]
    pub const fn n_fixed(&self) -> usize {
        self.n_fixed
    }

    #[must_use]
    pub const fn n_random(&self) -> usize {
        self.n_random
    }

    #[must_use]
    pub const fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// Fixed-effect draw for one sweep.
    #[must_use]
    pub fn beta_draw(&self, sweep: usize) -> &[f64] {
        &self.beta[sweep * self.n_fixed..(sweep + 1) * self.n_fixed]
    }

    /// Upper triangle of the covariance draw for one sweep, row-major.
    #[must_use]
    pub fn psi_upper_draw(&self, sweep: usize) -> &[f64] {
        let block = self.psi_block();
        &self.psi_upper[sweep * block..(sweep + 1) * block]
    }

    /// Covariance draw for one sweep, reassembled into a symmetric matrix.
    #[must_use]
    pub fn psi_draw(&self, sweep: usize) -> Mat<f64> {
        let upper = self.psi_upper_draw(sweep);
        let dim = self.n_random;
        let mut psi = Mat::<f64>::zeros(dim, dim);
        let mut cursor = 0;
        for row in 0..dim {
            for col in row..dim {
                psi[(row, col)] = upper[cursor];
                psi[(col, row)] = upper[cursor];
                cursor += 1;
            }
        }
        psi
    }

    /// Random-effect draw for one sweep and group.
    #[must_use]
    pub fn gamma_draw(&self, sweep: usize, group: usize) -> &[f64] {
        let offset = (sweep * self.n_groups + group) * self.n_random;
        &self.gamma[offset..offset + self.n_random]
    }

    /// Full fixed-effect buffer, sweep-major.
    #[must_use]
    pub fn beta_flat(&self) -> &[f64] {
        &self.beta
    }

    /// Full covariance buffer, sweep-major upper triangles.
    #[must_use]
    pub fn psi_flat(&self) -> &[f64] {
        &self.psi_upper
    }

    /// Full random-effect buffer, sweep-major then group-major.
    #[must_use]
    pub fn gamma_flat(&self) -> &[f64] {
        &self.gamma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_draws_record_in_sweep_order() {
        let mut draws = NormalDraws::new(2, 2);
        draws.record(&[1.0, 2.0], 0.5);
        draws.record(&[3.0, 4.0], 0.6);
        assert_eq!(draws.n_recorded(), 2);
        assert_eq!(draws.beta_draw(1), &[3.0, 4.0]);
        assert_eq!(draws.sig2_draw(0), 0.5);
        assert_eq!(draws.beta_flat(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn cancelled_slots_stay_zero() {
        let mut draws = NormalDraws::new(3, 1);
        draws.record(&[7.0], 1.0);
        assert_eq!(draws.beta_flat(), &[7.0, 0.0, 0.0]);
        assert_eq!(draws.sig2_flat(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn probit_draws_store_upper_triangle_then_groups() {
        let mut draws = ProbitMixedDraws::new(1, 1, 2, 2);
        let psi = Mat::from_fn(2, 2, |i, j| {
            let values = [[1.0, 0.2], [0.2, 2.0]];
            values[i][j]
        });
        draws.record(&[0.5], &psi, &[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(draws.psi_upper_draw(0), &[1.0, 0.2, 2.0]);
        assert_eq!(draws.gamma_draw(0, 1), &[3.0, 4.0]);
        let rebuilt = draws.psi_draw(0);
        assert_eq!(rebuilt[(1, 0)], 0.2);
    }
}
