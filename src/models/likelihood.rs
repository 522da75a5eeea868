//! Log-likelihoods of catastrophe times under the two model families.
//!
//! Both functions are pure and total: parameters outside the model's domain
//! yield `-inf` instead of an error, which is what the minimizer expects.

use crate::domain::{GammaParams, TwoStepParams};
use crate::math::ln_gamma;

/// Below this `delta_beta` the two-rate closed form divides by ~0; the
/// equal-rate limit is used instead.
pub const DELTA_BETA_EPS: f64 = 1e-9;

/// Gamma log-likelihood with shape `alpha` and rate `beta` (location 0).
///
/// `-inf` when `alpha <= 0` or `beta <= 0`.
pub fn log_likelihood_gamma(params: &GammaParams, samples: &[f64]) -> f64 {
    let GammaParams { alpha, beta } = *params;
    if !(alpha.is_finite() && beta.is_finite()) || alpha <= 0.0 || beta <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let log_norm = alpha * beta.ln() - ln_gamma(alpha);
    samples
        .iter()
        .map(|&t| log_norm + (alpha - 1.0) * t.ln() - beta * t)
        .sum()
}

/// Log-likelihood of the two-step Poisson model: catastrophe is the second of
/// two sequential arrivals with rates `beta_1` and `beta_1 + delta_beta`.
///
/// `-inf` when `beta_1 <= 0` or `delta_beta < 0`.
pub fn log_likelihood_two_step(params: &TwoStepParams, samples: &[f64]) -> f64 {
    let TwoStepParams { beta_1, delta_beta } = *params;
    if !(beta_1.is_finite() && delta_beta.is_finite()) || delta_beta < 0.0 || beta_1 <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let n = samples.len() as f64;
    let sum_t: f64 = samples.iter().sum();

    if delta_beta < DELTA_BETA_EPS {
        let sum_ln_t: f64 = samples.iter().map(|t| t.ln()).sum();
        return 2.0 * n * beta_1.ln() + sum_ln_t - beta_1 * sum_t;
    }

    // ln(1 - exp(-x)) == ln(-expm1(-x)), exact for small x.
    let sum_ln_tail: f64 = samples
        .iter()
        .map(|&t| (-(-delta_beta * t).exp_m1()).ln())
        .sum();

    n * (beta_1.ln() + (beta_1 + delta_beta).ln() - delta_beta.ln()) - beta_1 * sum_t + sum_ln_tail
}
