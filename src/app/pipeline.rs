//! Shared analysis pipeline used by every subcommand.
//!
//! CSV ingest -> per condition: MLEs -> bootstrap intervals -> AIC comparison
//!
//! The subcommands only differ in what they print.

use tracing::info;

use crate::domain::{AnalysisConfig, ConditionAnalysis, ConditionSamples, Dataset, SampleSummary};
use crate::error::{AppError, FitError};
use crate::fit::{
    bootstrap_gamma_with, bootstrap_two_step_with, compare_models, fit_gamma_with, fit_two_step_with, preferred,
};
use crate::io::ingest::{IngestOptions, load_dataset};

/// All computed outputs of one run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub dataset: Dataset,
    pub analyses: Vec<ConditionAnalysis>,
}

/// Load the CSV named in `config` and analyze every condition.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisRun, AppError> {
    let dataset = load_dataset(&IngestOptions {
        path: config.csv_path.clone(),
        skip_rows: config.skip_rows,
        columns: config.columns.clone(),
    })?;
    let analyses = analyze_dataset(&dataset, config)?;
    Ok(AnalysisRun { dataset, analyses })
}

/// Analyze every condition in order. The first failure stops the run.
pub fn analyze_dataset(dataset: &Dataset, config: &AnalysisConfig) -> Result<Vec<ConditionAnalysis>, AppError> {
    if dataset.conditions.is_empty() {
        return Err(AppError::new(3, "Dataset has no conditions to analyze."));
    }
    dataset
        .conditions
        .iter()
        .map(|c| analyze_condition(c, config).map_err(|e| with_label(&c.label, e)))
        .collect()
}

/// Fit, bootstrap (if enabled) and compare both models for one condition.
pub fn analyze_condition(condition: &ConditionSamples, config: &AnalysisConfig) -> Result<ConditionAnalysis, FitError> {
    let t = condition.samples.as_slice();

    let gamma = fit_gamma_with(t, &config.minimizer)?;
    let two_step = fit_two_step_with(t, &config.minimizer)?;

    let (gamma_ci, two_step_ci) = match &config.bootstrap {
        Some(opts) => (
            Some(bootstrap_gamma_with(t, opts, &config.minimizer)?),
            Some(bootstrap_two_step_with(t, opts, &config.minimizer)?),
        ),
        None => (None, None),
    };

    let comparison = compare_models(t, &gamma, &two_step)?;
    let best = preferred(&comparison);
    info!(
        condition = %condition.label,
        n = t.len(),
        alpha = gamma.alpha,
        beta = gamma.beta,
        beta_1 = two_step.beta_1,
        beta_2 = two_step.beta_2(),
        preferred = best.model.display_name(),
        weight = best.aic_weight,
        "condition analyzed"
    );

    Ok(ConditionAnalysis {
        label: condition.label.clone(),
        concentration_um: condition.concentration_um,
        summary: SampleSummary::from_samples(&condition.samples),
        gamma,
        two_step,
        gamma_ci,
        two_step_ci,
        comparison,
    })
}

fn with_label(label: &str, err: FitError) -> AppError {
    let app = AppError::from(err);
    AppError::new(app.exit_code(), format!("{label}: {app}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BootstrapOptions, ModelKind, SampleSet};
    use crate::math::PowellOptions;
    use std::path::PathBuf;

    fn config(bootstrap: Option<BootstrapOptions>) -> AnalysisConfig {
        AnalysisConfig {
            csv_path: PathBuf::from("unused.csv"),
            skip_rows: 0,
            columns: Vec::new(),
            bootstrap,
            minimizer: PowellOptions::default(),
            export_json: None,
            export_curves: None,
            t_max: 2000.0,
            grid_points: 200,
        }
    }

    fn condition(label: &str, values: Vec<f64>) -> ConditionSamples {
        ConditionSamples {
            label: label.to_string(),
            concentration_um: crate::io::ingest::parse_concentration(label),
            samples: SampleSet::new(values).unwrap(),
        }
    }

    #[test]
    fn small_condition_without_bootstrap() {
        let c = condition("12 uM", vec![10.0, 20.0, 30.0, 15.0, 25.0]);
        let a = analyze_condition(&c, &config(None)).unwrap();
        assert_eq!(a.summary.n, 5);
        assert!(a.gamma_ci.is_none() && a.two_step_ci.is_none());
        assert_eq!(a.comparison[0].model, ModelKind::Gamma);
        let total: f64 = a.comparison.iter().map(|r| r.aic_weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bootstrap_intervals_are_attached() {
        let values: Vec<f64> = (1..=40).map(|i| 100.0 + 13.0 * i as f64 + (i % 7) as f64 * 20.0).collect();
        let c = condition("7 uM", values);
        let opts = BootstrapOptions {
            replicates: 40,
            seed: 3,
            ..BootstrapOptions::default()
        };
        let a = analyze_condition(&c, &config(Some(opts))).unwrap();
        let ci = a.gamma_ci.unwrap();
        assert_eq!(ci.replicates, 40);
        assert!(ci.low.alpha <= ci.high.alpha);
        assert!(a.two_step_ci.is_some());
    }

    #[test]
    fn failures_carry_condition_label() {
        let ds = Dataset {
            conditions: vec![condition("9 uM", vec![42.0])],
        };
        let err = analyze_dataset(&ds, &config(None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("9 uM: malformed input"));
    }

    #[test]
    fn empty_dataset_is_no_usable_data() {
        let err = analyze_dataset(&Dataset::default(), &config(None)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
