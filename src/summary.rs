//! Posterior summaries over stored draws.

use num_traits::ToPrimitive;

use crate::draws::{NormalDraws, ProbitMixedDraws};

/// Scalar posterior summary statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub q025: f64,
    pub q50: f64,
    pub q975: f64,
}

/// Posterior summary for a normal-regression chain.
#[derive(Debug, Clone, Default)]
pub struct NormalDrawSummary {
    pub beta: Vec<ParameterSummary>,
    pub sig2: Option<ParameterSummary>,
    pub draw_count: usize,
}

/// Posterior summary for a probit mixed-model chain.
#[derive(Debug, Clone, Default)]
pub struct ProbitMixedDrawSummary {
    pub beta: Vec<ParameterSummary>,
    /// One entry per upper-triangle covariance element, row-major.
    pub psi_upper: Vec<ParameterSummary>,
    /// One vector of summaries per group.
    pub gamma: Vec<Vec<ParameterSummary>>,
    pub draw_count: usize,
}

/// Summarize the recorded sweeps of a normal-regression chain.
#[must_use]
pub fn summarize_normal_draws(draws: &NormalDraws) -> NormalDrawSummary {
    let draw_count = draws.n_recorded();
    if draw_count == 0 {
        return NormalDrawSummary::default();
    }
    let beta = (0..draws.n_cov())
        .map(|index| {
            let values: Vec<f64> = (0..draw_count)
                .map(|sweep| draws.beta_draw(sweep)[index])
                .collect();
            summarize_scalar(&values)
        })
        .collect();
    let sig2_values: Vec<f64> = (0..draw_count).map(|sweep| draws.sig2_draw(sweep)).collect();
    NormalDrawSummary {
        beta,
        sig2: Some(summarize_scalar(&sig2_values)),
        draw_count,
    }
}

/// Summarize the recorded sweeps of a probit mixed-model chain.
#[must_use]
pub fn summarize_probit_draws(draws: &ProbitMixedDraws) -> ProbitMixedDrawSummary {
    let draw_count = draws.n_recorded();
    if draw_count == 0 {
        return ProbitMixedDrawSummary::default();
    }
    let beta = (0..draws.n_fixed())
        .map(|index| {
            let values: Vec<f64> = (0..draw_count)
                .map(|sweep| draws.beta_draw(sweep)[index])
                .collect();
            summarize_scalar(&values)
        })
        .collect();
    let psi_block = draws.n_random() * (draws.n_random() + 1) / 2;
    let psi_upper = (0..psi_block)
        .map(|index| {
            let values: Vec<f64> = (0..draw_count)
                .map(|sweep| draws.psi_upper_draw(sweep)[index])
                .collect();
            summarize_scalar(&values)
        })
        .collect();
    let gamma = (0..draws.n_groups())
        .map(|group| {
            (0..draws.n_random())
                .map(|index| {
                    let values: Vec<f64> = (0..draw_count)
                        .map(|sweep| draws.gamma_draw(sweep, group)[index])
                        .collect();
                    summarize_scalar(&values)
                })
                .collect()
        })
        .collect();
    ProbitMixedDrawSummary {
        beta,
        psi_upper,
        gamma,
        draw_count,
    }
}

#[must_use]
fn summarize_scalar(values: &[f64]) -> ParameterSummary {
    if values.is_empty() {
        return ParameterSummary::default();
    }

    let n = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|value| {
            let centered = value - mean;
            centered * centered
        })
        .sum::<f64>()
        / n.max(1.0);

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    ParameterSummary {
        mean,
        std_dev: variance.sqrt(),
        q025: percentile(&sorted, 0.025),
        q50: percentile(&sorted, 0.5),
        q975: percentile(&sorted, 0.975),
    }
}

#[must_use]
fn percentile(sorted_values: &[f64], probability: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }

    let clamped = probability.clamp(0.0, 1.0);
    let last = sorted_values.len() - 1;
    let position = clamped * usize_to_f64(last);
    let lower = position.floor().to_usize().unwrap_or(0);
    let upper = position.ceil().to_usize().unwrap_or(last);

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = position - usize_to_f64(lower);
        (1.0 - weight).mul_add(sorted_values[lower], weight * sorted_values[upper])
    }
}

fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summarize_empty_chain() {
        let draws = NormalDraws::new(0, 2);
        let summary = summarize_normal_draws(&draws);
        assert_eq!(summary.draw_count, 0);
        assert!(summary.beta.is_empty());
        assert!(summary.sig2.is_none());
    }

    #[test]
    fn summarize_two_sweeps() {
        let mut draws = NormalDraws::new(2, 1);
        draws.record(&[0.0], 0.8);
        draws.record(&[2.0], 1.2);
        let summary = summarize_normal_draws(&draws);
        assert_eq!(summary.draw_count, 2);
        assert_relative_eq!(summary.beta[0].mean, 1.0);
        assert_relative_eq!(summary.sig2.expect("present").q50, 1.0);
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let sorted = [0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(percentile(&sorted, 0.5), 1.5);
        assert_relative_eq!(percentile(&sorted, 0.0), 0.0);
        assert_relative_eq!(percentile(&sorted, 1.0), 3.0);
    }
}
