//! Model comparison by the Akaike information criterion.
//!
//! For each fitted family:
//! - log-likelihood at the MLE
//! - AIC = -2 ln L + 2k
//! - Akaike weight w_i = exp(-(AIC_i - AIC_min) / 2) / Σ_j exp(-(AIC_j - AIC_min) / 2)
//!
//! Weights are taken relative to the smallest AIC so the exponentials stay in
//! range however large the log-likelihoods get.

use tracing::debug;

use crate::domain::{FittedParams, GammaParams, ModelComparisonRecord, ModelKind, TwoStepParams, validate_samples};
use crate::error::FitError;
use crate::models::{log_likelihood_gamma, log_likelihood_two_step};

/// AIC for a log-likelihood and `k` free parameters.
pub fn aic(log_likelihood: f64, k: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * k as f64
}

/// Akaike weights for a set of AIC values (same order as the input).
///
/// Non-finite AICs get weight 0. If none is finite every weight is `NaN`.
pub fn aic_weights(aics: &[f64]) -> Vec<f64> {
    let min = aics
        .iter()
        .copied()
        .filter(|a| a.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return vec![f64::NAN; aics.len()];
    }

    let raw: Vec<f64> = aics
        .iter()
        .map(|&a| if a.is_finite() { (-(a - min) / 2.0).exp() } else { 0.0 })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Compare the Gamma and two-step fits on the same samples.
///
/// Records come back in a fixed order: Gamma first.
pub fn compare_models(
    samples: &[f64],
    gamma: &GammaParams,
    two_step: &TwoStepParams,
) -> Result<[ModelComparisonRecord; 2], FitError> {
    validate_samples(samples)?;

    let ll_gamma = log_likelihood_gamma(gamma, samples);
    let ll_two_step = log_likelihood_two_step(two_step, samples);
    let aics = [
        aic(ll_gamma, ModelKind::Gamma.param_count()),
        aic(ll_two_step, ModelKind::TwoStepPoisson.param_count()),
    ];
    if aics.iter().all(|a| !a.is_finite()) {
        return Err(FitError::malformed(
            "neither model assigns positive likelihood to the samples",
        ));
    }
    let weights = aic_weights(&aics);
    debug!(?aics, ?weights, "model comparison");

    Ok([
        ModelComparisonRecord {
            model: ModelKind::Gamma,
            params: FittedParams::Gamma(*gamma),
            log_likelihood: ll_gamma,
            aic: aics[0],
            aic_weight: weights[0],
        },
        ModelComparisonRecord {
            model: ModelKind::TwoStepPoisson,
            params: FittedParams::TwoStep(*two_step),
            log_likelihood: ll_two_step,
            aic: aics[1],
            aic_weight: weights[1],
        },
    ])
}

/// The record with the larger Akaike weight (Gamma on ties).
pub fn preferred(records: &[ModelComparisonRecord; 2]) -> &ModelComparisonRecord {
    if records[1].aic_weight > records[0].aic_weight {
        &records[1]
    } else {
        &records[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::mle::{fit_gamma, fit_two_step};
    use crate::models::gamma_generative_sample;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn aic_penalizes_parameters() {
        assert_eq!(aic(-100.0, 2), 204.0);
        assert_eq!(aic(0.0, 0), 0.0);
    }

    #[test]
    fn weights_sum_to_one_and_favor_lower_aic() {
        let w = aic_weights(&[100.0, 102.0]);
        assert!((w[0] + w[1] - 1.0).abs() < 1e-12);
        assert!(w[0] > w[1]);
        // Δ = 2 gives a weight ratio of e.
        assert!((w[0] / w[1] - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn weights_survive_huge_aics() {
        let w = aic_weights(&[1.0e6, 1.0e6 + 1.0]);
        assert!(w.iter().all(|v| v.is_finite()));
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn infinite_aic_gets_zero_weight() {
        let w = aic_weights(&[f64::INFINITY, 50.0]);
        assert_eq!(w, vec![0.0, 1.0]);
        assert!(aic_weights(&[f64::INFINITY, f64::NAN]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn comparison_on_gamma_data_prefers_gamma() {
        let truth = GammaParams { alpha: 6.0, beta: 0.02 };
        let mut rng = StdRng::seed_from_u64(11);
        let t = gamma_generative_sample(&truth, 2000, &mut rng);

        let g = fit_gamma(&t).unwrap();
        let s = fit_two_step(&t).unwrap();
        let records = compare_models(&t, &g, &s).unwrap();

        assert_eq!(records[0].model, ModelKind::Gamma);
        assert_eq!(records[1].model, ModelKind::TwoStepPoisson);
        assert!((records[0].aic_weight + records[1].aic_weight - 1.0).abs() < 1e-12);
        assert_eq!(preferred(&records).model, ModelKind::Gamma);
        for r in &records {
            assert!((r.aic - aic(r.log_likelihood, 2)).abs() < 1e-9);
        }
    }

    #[test]
    fn comparison_with_infeasible_parameters_is_malformed() {
        let bad_g = GammaParams { alpha: -1.0, beta: 0.01 };
        let bad_s = TwoStepParams {
            beta_1: 0.0,
            delta_beta: 0.0,
        };
        let err = compare_models(&[10.0, 20.0], &bad_g, &bad_s).unwrap_err();
        assert!(matches!(err, FitError::MalformedInput(_)));
    }
}
