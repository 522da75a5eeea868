//! Maximum-likelihood fits for a single model family.
//!
//! Given a validated set of catastrophe times we minimize the negative
//! log-likelihood with Powell's method (no gradients: the objective is `+inf`
//! outside the parameter domain) and return the parameter vector.

use tracing::debug;

use crate::domain::{GammaParams, ModelKind, ParameterVector, TwoStepParams, validate_samples};
use crate::error::FitError;
use crate::math::{PowellError, PowellOptions, minimize};
use crate::models::{log_likelihood_gamma, log_likelihood_two_step};

/// Fewest samples either estimator accepts.
///
/// With one point the Gamma moment guess divides by a zero variance.
pub const MIN_SAMPLES: usize = 2;

/// Starting point for the two-step fit, on the time scale of these experiments
/// (hundreds of seconds).
pub const TWO_STEP_INITIAL_GUESS: TwoStepParams = TwoStepParams {
    beta_1: 0.005,
    delta_beta: 0.001,
};

/// Gamma MLE with default minimizer settings.
pub fn fit_gamma(samples: &[f64]) -> Result<GammaParams, FitError> {
    fit_gamma_with(samples, &PowellOptions::default())
}

/// Gamma MLE, starting from the method-of-moments guess.
pub fn fit_gamma_with(samples: &[f64], opts: &PowellOptions) -> Result<GammaParams, FitError> {
    check_size(samples)?;
    let (mean, var) = mean_and_variance(samples);
    if !(var > 0.0 && var.is_finite()) {
        return Err(FitError::malformed(
            "catastrophe times have zero variance; the Gamma moment guess is undefined",
        ));
    }

    let beta_guess = mean / var;
    let guess = GammaParams {
        alpha: mean * beta_guess,
        beta: beta_guess,
    };

    let fitted = minimize_params(ModelKind::Gamma, guess, opts, |p: &GammaParams| {
        -log_likelihood_gamma(p, samples)
    })?;
    Ok(fitted)
}

/// Two-step Poisson MLE with default minimizer settings.
pub fn fit_two_step(samples: &[f64]) -> Result<TwoStepParams, FitError> {
    fit_two_step_with(samples, &PowellOptions::default())
}

/// Two-step Poisson MLE, starting from [`TWO_STEP_INITIAL_GUESS`].
pub fn fit_two_step_with(samples: &[f64], opts: &PowellOptions) -> Result<TwoStepParams, FitError> {
    check_size(samples)?;

    let fitted = minimize_params(
        ModelKind::TwoStepPoisson,
        TWO_STEP_INITIAL_GUESS,
        opts,
        |p: &TwoStepParams| -log_likelihood_two_step(p, samples),
    )?;

    // The objective is +inf for delta_beta < 0, so only a signed zero can slip through.
    Ok(TwoStepParams {
        beta_1: fitted.beta_1,
        delta_beta: if fitted.delta_beta > 0.0 { fitted.delta_beta } else { 0.0 },
    })
}

fn minimize_params<P, F>(model: ModelKind, guess: P, opts: &PowellOptions, objective: F) -> Result<P, FitError>
where
    P: ParameterVector,
    F: Fn(&P) -> f64,
{
    let res = minimize(
        |x| objective(&P::from_array([x[0], x[1]])),
        &guess.to_array(),
        opts,
    )
    .map_err(|e| convergence(model, e))?;

    debug!(
        model = model.display_name(),
        iterations = res.iterations,
        evaluations = res.evaluations,
        neg_log_like = res.fun,
        "MLE converged"
    );
    Ok(P::from_array([res.x[0], res.x[1]]))
}

fn convergence(model: ModelKind, err: PowellError) -> FitError {
    FitError::Convergence {
        model,
        message: err.to_string(),
    }
}

fn check_size(samples: &[f64]) -> Result<(), FitError> {
    validate_samples(samples)?;
    if samples.len() < MIN_SAMPLES {
        return Err(FitError::malformed(format!(
            "need at least {MIN_SAMPLES} catastrophe times, got {}",
            samples.len()
        )));
    }
    Ok(())
}

/// Mean and population variance (ddof = 0).
fn mean_and_variance(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n;
    (mean, var)
}
