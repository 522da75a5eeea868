//! Bootstrap confidence intervals for the MLEs.
//!
//! Each replicate draws a synthetic data set of the observed size (from the
//! fitted generative model, or by resampling the observations), refits it, and
//! contributes one parameter vector. Percentiles of the ensemble, taken per
//! coordinate, give the interval.
//!
//! Replicates are independent, so they run in parallel. Replicate `i` seeds its
//! own `StdRng` from `(seed, i)`, and outcomes are gathered in index order: the
//! interval depends only on the seed, never on the thread count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{
    BootstrapMethod, BootstrapOptions, ConfidenceInterval, FailurePolicy, GammaParams,
    ParameterVector, TwoStepParams, validate_samples,
};
use crate::error::FitError;
use crate::fit::mle::{fit_gamma_with, fit_two_step_with};
use crate::math::{PowellOptions, percentile_sorted};
use crate::models::{gamma_generative_sample, two_step_generative_sample};

/// SplitMix64 mix of a base seed and a replicate index.
///
/// Neighbouring indices land on unrelated seeds, so replicate streams do not
/// overlap the way `seed + i` streams can.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Draw `size` values from `samples` with replacement.
pub fn resample_with_replacement<R: Rng + ?Sized>(samples: &[f64], size: usize, rng: &mut R) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    (0..size)
        .map(|_| samples[rng.gen_range(0..samples.len())])
        .collect()
}

/// Percentile bootstrap interval for an arbitrary estimator.
///
/// - `fit_fn` maps a sample to a parameter vector (also used for the point
///   estimate that drives parametric draws).
/// - `generate_fn(params, size, rng)` draws a synthetic sample; it is only
///   called for [`BootstrapMethod::Parametric`].
///
/// Errors in the caller's samples or the point estimate come back as is. A
/// refit that fails on a synthetic sample is wrapped in
/// [`FitError::ReplicateFailed`] with its replicate index.
pub fn bootstrap_confidence_interval<P, F, G>(
    samples: &[f64],
    fit_fn: F,
    generate_fn: G,
    opts: &BootstrapOptions,
) -> Result<ConfidenceInterval<P>, FitError>
where
    P: ParameterVector,
    F: Fn(&[f64]) -> Result<P, FitError> + Sync,
    G: Fn(&P, usize, &mut StdRng) -> Vec<f64> + Sync,
{
    validate_options(opts)?;
    validate_samples(samples)?;

    let n = samples.len();
    let point = match opts.method {
        BootstrapMethod::Parametric => Some(fit_fn(samples)?),
        BootstrapMethod::Nonparametric => None,
    };

    let outcomes: Vec<Result<P, FitError>> = (0..opts.replicates)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(counter_rng_seed(opts.seed, i as u64));
            let draw = match &point {
                Some(p) => generate_fn(p, n, &mut rng),
                None => resample_with_replacement(samples, n, &mut rng),
            };
            fit_fn(&draw).map_err(|e| FitError::ReplicateFailed {
                replicate: i,
                source: Box::new(e),
            })
        })
        .collect();

    let mut columns: [Vec<f64>; 2] = [
        Vec::with_capacity(opts.replicates),
        Vec::with_capacity(opts.replicates),
    ];
    let mut failed = 0usize;
    let mut last_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(p) => {
                let [a, b] = p.to_array();
                columns[0].push(a);
                columns[1].push(b);
            }
            Err(e) => match opts.on_failure {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::Discard => {
                    failed += 1;
                    last_error = Some(e);
                }
            },
        }
    }

    if failed > 0 {
        warn!(
            failed,
            replicates = opts.replicates,
            "discarded bootstrap replicates whose fit failed"
        );
    }
    let kept = columns[0].len();
    if kept == 0 {
        return Err(last_error.unwrap_or_else(|| FitError::malformed("no bootstrap replicates")));
    }

    let tail = (1.0 - opts.coverage) / 2.0;
    let mut low = [0.0; 2];
    let mut high = [0.0; 2];
    for (k, column) in columns.iter_mut().enumerate() {
        if column.iter().any(|v| !v.is_finite()) {
            return Err(FitError::malformed(format!(
                "bootstrap produced a non-finite {}",
                P::NAMES[k]
            )));
        }
        column.sort_by(|a, b| a.total_cmp(b));
        low[k] = percentile_sorted(column, tail);
        high[k] = percentile_sorted(column, 1.0 - tail);
    }

    debug!(kept, coverage = opts.coverage, ?low, ?high, "bootstrap interval");
    Ok(ConfidenceInterval {
        low: P::from_array(low),
        high: P::from_array(high),
        coverage: opts.coverage,
        replicates: kept,
    })
}

/// Bootstrap interval for the Gamma MLE.
pub fn bootstrap_gamma(samples: &[f64], opts: &BootstrapOptions) -> Result<ConfidenceInterval<GammaParams>, FitError> {
    bootstrap_gamma_with(samples, opts, &PowellOptions::default())
}

/// [`bootstrap_gamma`] with explicit minimizer settings for every refit.
pub fn bootstrap_gamma_with(
    samples: &[f64],
    opts: &BootstrapOptions,
    minimizer: &PowellOptions,
) -> Result<ConfidenceInterval<GammaParams>, FitError> {
    bootstrap_confidence_interval(
        samples,
        |t: &[f64]| fit_gamma_with(t, minimizer),
        |p: &GammaParams, size, rng: &mut StdRng| gamma_generative_sample(p, size, rng),
        opts,
    )
}

/// Bootstrap interval for the two-step Poisson MLE.
pub fn bootstrap_two_step(
    samples: &[f64],
    opts: &BootstrapOptions,
) -> Result<ConfidenceInterval<TwoStepParams>, FitError> {
    bootstrap_two_step_with(samples, opts, &PowellOptions::default())
}

pub fn bootstrap_two_step_with(
    samples: &[f64],
    opts: &BootstrapOptions,
    minimizer: &PowellOptions,
) -> Result<ConfidenceInterval<TwoStepParams>, FitError> {
    bootstrap_confidence_interval(
        samples,
        |t: &[f64]| fit_two_step_with(t, minimizer),
        |p: &TwoStepParams, size, rng: &mut StdRng| two_step_generative_sample(p, size, rng),
        opts,
    )
}

fn validate_options(opts: &BootstrapOptions) -> Result<(), FitError> {
    if opts.replicates == 0 {
        return Err(FitError::malformed("bootstrap needs at least one replicate"));
    }
    if !(opts.coverage > 0.0 && opts.coverage < 1.0) {
        return Err(FitError::malformed(format!(
            "coverage must lie in (0, 1), got {}",
            opts.coverage
        )));
    }
    Ok(())
}
