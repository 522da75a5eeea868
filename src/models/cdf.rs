//! Theoretical CDFs for overlaying fitted models on an ECDF.

use crate::domain::{GammaParams, TwoStepParams};
use crate::math::regularized_gamma_p;
use crate::models::likelihood::DELTA_BETA_EPS;

/// Gamma CDF at `t`: `P(alpha, beta t)`.
pub fn gamma_cdf(params: &GammaParams, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    regularized_gamma_p(params.alpha, params.beta * t)
}

/// CDF of the two-step Poisson waiting time at `t`.
///
/// `β1 β2 / (β2 - β1) · [(1 - e^{-β1 t}) / β1 - (1 - e^{-β2 t}) / β2]`, which
/// collapses to `1 - e^{-β t}(1 + β t)` when the rates coincide.
pub fn two_step_cdf(params: &TwoStepParams, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let b1 = params.beta_1;
    if params.delta_beta < DELTA_BETA_EPS {
        let x = b1 * t;
        return (1.0 - (-x).exp() * (1.0 + x)).clamp(0.0, 1.0);
    }

    let b2 = params.beta_2();
    let tail_1 = -(-b1 * t).exp_m1() / b1;
    let tail_2 = -(-b2 * t).exp_m1() / b2;
    (b1 * b2 / (b2 - b1) * (tail_1 - tail_2)).clamp(0.0, 1.0)
}

/// `n` evenly spaced points on `[0, t_max]` (inclusive).
pub fn linspace(t_max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| t_max * i as f64 / (n as f64 - 1.0)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdfs_are_monotone_in_unit_interval() {
        let gamma = GammaParams { alpha: 3.0, beta: 0.01 };
        let two_step = TwoStepParams {
            beta_1: 0.005,
            delta_beta: 0.003,
        };
        let grid = linspace(2000.0, 200);
        let mut prev_g = 0.0;
        let mut prev_t = 0.0;
        for &t in &grid {
            let g = gamma_cdf(&gamma, t);
            let s = two_step_cdf(&two_step, t);
            assert!((0.0..=1.0).contains(&g) && (0.0..=1.0).contains(&s));
            assert!(g >= prev_g - 1e-12 && s >= prev_t - 1e-12);
            prev_g = g;
            prev_t = s;
        }
        assert!(gamma_cdf(&gamma, 1e6) > 0.999_999);
    }

    #[test]
    fn two_step_cdf_is_continuous_across_epsilon() {
        let t = 300.0;
        let below = two_step_cdf(
            &TwoStepParams {
                beta_1: 0.005,
                delta_beta: 0.0,
            },
            t,
        );
        let above = two_step_cdf(
            &TwoStepParams {
                beta_1: 0.005,
                delta_beta: 1e-7,
            },
            t,
        );
        assert!((below - above).abs() < 1e-4, "below={below} above={above}");
    }

    #[test]
    fn equal_rate_two_step_matches_gamma_two() {
        let b = 0.004;
        for &t in &[50.0, 400.0, 1500.0] {
            let g = gamma_cdf(&GammaParams { alpha: 2.0, beta: b }, t);
            let s = two_step_cdf(
                &TwoStepParams {
                    beta_1: b,
                    delta_beta: 0.0,
                },
                t,
            );
            assert!((g - s).abs() < 1e-10);
        }
    }

    #[test]
    fn linspace_endpoints() {
        let g = linspace(2000.0, 5);
        assert_eq!(g, vec![0.0, 500.0, 1000.0, 1500.0, 2000.0]);
        assert!(linspace(10.0, 0).is_empty());
    }
}
