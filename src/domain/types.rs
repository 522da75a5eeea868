//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the estimators without re-validation
//! - exported to JSON for an external plotting/reporting step
//! - printed by the terminal report

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::PowellOptions;

/// Which parametric family a fit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Gamma,
    TwoStepPoisson,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Gamma => "Gamma",
            ModelKind::TwoStepPoisson => "Two-step Poisson",
        }
    }

    /// Free parameters entering the AIC penalty.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Gamma => 2,
            ModelKind::TwoStepPoisson => 2,
        }
    }
}

/// Catastrophe times (seconds) for one experimental condition.
///
/// Invariant: non-empty, every value finite and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleSet(Vec<f64>);

impl SampleSet {
    pub fn new(values: Vec<f64>) -> Result<Self, FitError> {
        validate_samples(&values)?;
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check the sample-set invariant on a raw slice.
pub fn validate_samples(samples: &[f64]) -> Result<(), FitError> {
    if samples.is_empty() {
        return Err(FitError::malformed("sample set is empty"));
    }
    if let Some((i, v)) = samples
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && **v > 0.0))
    {
        return Err(FitError::malformed(format!(
            "sample {i} is {v}; catastrophe times must be finite and > 0"
        )));
    }
    Ok(())
}

/// A model's two parameters viewed as an ordered pair.
///
/// The bootstrap works on coordinates, so it only needs this view.
pub trait ParameterVector: Copy + Send + Sync + std::fmt::Debug {
    /// Coordinate names, in `to_array` order.
    const NAMES: [&'static str; 2];

    fn to_array(&self) -> [f64; 2];

    fn from_array(values: [f64; 2]) -> Self;
}

/// Gamma model: shape `alpha > 0`, rate `beta > 0` (scale `1 / beta`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl ParameterVector for GammaParams {
    const NAMES: [&'static str; 2] = ["alpha", "beta"];

    fn to_array(&self) -> [f64; 2] {
        [self.alpha, self.beta]
    }

    fn from_array(values: [f64; 2]) -> Self {
        Self {
            alpha: values[0],
            beta: values[1],
        }
    }
}

/// Two-step Poisson model: first rate `beta_1 > 0`, second rate
/// `beta_1 + delta_beta` with `delta_beta >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoStepParams {
    pub beta_1: f64,
    pub delta_beta: f64,
}

impl TwoStepParams {
    /// Rate of the second arrival.
    pub fn beta_2(&self) -> f64 {
        self.beta_1 + self.delta_beta
    }
}

impl ParameterVector for TwoStepParams {
    const NAMES: [&'static str; 2] = ["beta_1", "delta_beta"];

    fn to_array(&self) -> [f64; 2] {
        [self.beta_1, self.delta_beta]
    }

    fn from_array(values: [f64; 2]) -> Self {
        Self {
            beta_1: values[0],
            delta_beta: values[1],
        }
    }
}

/// Fitted parameters of either family (for comparison records / exports).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FittedParams {
    Gamma(GammaParams),
    TwoStep(TwoStepParams),
}

/// Percentile bootstrap interval, one bound per parameter coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval<P> {
    pub low: P,
    pub high: P,
    pub coverage: f64,
    /// Replicates that entered the percentiles (after any discards).
    pub replicates: usize,
}

/// One row of a model comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelComparisonRecord {
    pub model: ModelKind,
    pub params: FittedParams,
    pub log_likelihood: f64,
    pub aic: f64,
    pub aic_weight: f64,
}

/// Five-number summary plus moments (the numbers behind a box plot).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation (ddof = 0).
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl SampleSummary {
    pub fn from_samples(samples: &SampleSet) -> Self {
        let values = samples.as_slice();
        let n = values.len();
        let n_f = n as f64;
        let mean = values.iter().sum::<f64>() / n_f;
        let var = values.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n_f;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q = |p: f64| crate::math::percentile_sorted(&sorted, p);

        Self {
            n,
            mean,
            std: var.sqrt(),
            min: sorted[0],
            q1: q(0.25),
            median: q(0.5),
            q3: q(0.75),
            max: sorted[n - 1],
        }
    }
}

/// How bootstrap replicates are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMethod {
    /// Draw from the fitted generative model at the point estimate.
    Parametric,
    /// Resample the observed times with replacement.
    Nonparametric,
}

/// What to do when a replicate fit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Propagate the first failure and abandon the interval.
    Abort,
    /// Drop failed replicates and build the interval from the rest.
    Discard,
}

/// Settings for one bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOptions {
    pub replicates: usize,
    /// Nominal coverage, e.g. `0.95` for the 2.5 / 97.5 percentiles.
    pub coverage: f64,
    pub seed: u64,
    pub method: BootstrapMethod,
    pub on_failure: FailurePolicy,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            replicates: 1000,
            coverage: 0.95,
            seed: 0,
            method: BootstrapMethod::Parametric,
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// Catastrophe times for one condition (tubulin concentration).
#[derive(Debug, Clone, Serialize)]
pub struct ConditionSamples {
    /// Column label as it appeared in the input, e.g. `"12 uM"`.
    pub label: String,
    /// Concentration parsed from the label, when it has a numeric prefix.
    pub concentration_um: Option<u32>,
    pub samples: SampleSet,
}

/// All conditions of one experiment, ordered by concentration then label.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub conditions: Vec<ConditionSamples>,
}

/// Everything computed for one condition.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionAnalysis {
    pub label: String,
    pub concentration_um: Option<u32>,
    pub summary: SampleSummary,
    pub gamma: GammaParams,
    pub two_step: TwoStepParams,
    pub gamma_ci: Option<ConfidenceInterval<GammaParams>>,
    pub two_step_ci: Option<ConfidenceInterval<TwoStepParams>>,
    pub comparison: [ModelComparisonRecord; 2],
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub csv_path: PathBuf,
    /// Preamble lines before the header row.
    pub skip_rows: usize,
    /// Columns to keep; empty means all.
    pub columns: Vec<String>,

    /// `None` skips interval estimation.
    pub bootstrap: Option<BootstrapOptions>,
    /// Stopping rules for every MLE, bootstrap refits included.
    pub minimizer: PowellOptions,

    pub export_json: Option<PathBuf>,
    pub export_curves: Option<PathBuf>,
    /// Upper end of the theoretical CDF grid (seconds).
    pub t_max: f64,
    pub grid_points: usize,
}
