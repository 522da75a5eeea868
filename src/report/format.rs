//! Terminal formatting for analysis results.
//!
//! Formatting lives here so the estimators stay free of presentation and
//! output changes stay localized.

use crate::domain::{
    AnalysisConfig, BootstrapOptions, ConditionAnalysis, ConfidenceInterval, FailurePolicy, ModelComparisonRecord,
    ParameterVector,
};
use crate::fit::selection::preferred;

/// Full report: run header, then one block per condition.
pub fn format_analysis(analyses: &[ConditionAnalysis], config: &AnalysisConfig) -> String {
    let mut out = String::new();

    out.push_str("=== mtcat - microtubule catastrophe times ===\n");
    out.push_str(&format!(
        "Input: {} (skip_rows={})\n",
        config.csv_path.display(),
        config.skip_rows
    ));
    out.push_str(&format!("Bootstrap: {}\n", describe_bootstrap(config.bootstrap.as_ref())));

    for a in analyses {
        out.push('\n');
        out.push_str(&format_condition(a));
    }

    out
}

/// One condition: sample summary, both MLEs with intervals, comparison table.
pub fn format_condition(a: &ConditionAnalysis) -> String {
    let mut out = String::new();
    let s = &a.summary;

    out.push_str(&format!("--- {} ---\n", a.label));
    out.push_str(&format!(
        "Times: n={} mean={:.1}s std={:.1}s\n",
        s.n, s.mean, s.std
    ));
    out.push_str(&format!(
        "       min={:.1} q1={:.1} median={:.1} q3={:.1} max={:.1}\n",
        s.min, s.q1, s.median, s.q3, s.max
    ));

    out.push_str(&format!(
        "Gamma MLE:    alpha={:.4}  beta={:.6}/s\n",
        a.gamma.alpha, a.gamma.beta
    ));
    if let Some(ci) = &a.gamma_ci {
        out.push_str(&format_interval(ci));
    }
    out.push_str(&format!(
        "Two-step MLE: beta_1={:.6}/s  beta_2={:.6}/s  (delta_beta={:.6})\n",
        a.two_step.beta_1,
        a.two_step.beta_2(),
        a.two_step.delta_beta
    ));
    if let Some(ci) = &a.two_step_ci {
        out.push_str(&format_interval(ci));
    }

    out.push_str(&format_comparison_table(&a.comparison));
    out
}

/// AIC table for one condition; the preferred model is starred.
pub fn format_comparison_table(records: &[ModelComparisonRecord; 2]) -> String {
    let mut out = String::new();
    let best = preferred(records).model;

    out.push_str(
        format!(
            "  {:<18} {:>14} {:>14} {:>10}",
            "model", "log_lik", "AIC", "weight"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("  {:-<18} {:-<14} {:-<14} {:-<10}", "", "", "", "").trim_end());
    out.push('\n');

    for r in records {
        let marker = if r.model == best { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {:<18} {:>14.3} {:>14.3} {:>10.4}\n",
            r.model.display_name(),
            r.log_likelihood,
            r.aic,
            r.aic_weight
        ));
    }

    out
}

fn format_interval<P: ParameterVector>(ci: &ConfidenceInterval<P>) -> String {
    let low = ci.low.to_array();
    let high = ci.high.to_array();
    let parts: Vec<String> = P::NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{name} [{}, {}]", fmt_num(low[i]), fmt_num(high[i])))
        .collect();
    format!(
        "  {:.0}% CI ({} reps): {}\n",
        ci.coverage * 100.0,
        ci.replicates,
        parts.join("  ")
    )
}

fn describe_bootstrap(opts: Option<&BootstrapOptions>) -> String {
    let Some(o) = opts else {
        return "disabled".to_string();
    };
    let policy = match o.on_failure {
        FailurePolicy::Abort => "abort on failure",
        FailurePolicy::Discard => "discard failures",
    };
    format!(
        "{} {:?} replicates, {:.0}% coverage, seed {} ({policy})",
        o.replicates,
        o.method,
        o.coverage * 100.0,
        o.seed
    )
    .to_lowercase()
}

/// Shape parameters read well with 4 decimals, rates (~1e-3) need more.
fn fmt_num(v: f64) -> String {
    if v.abs() >= 0.1 {
        format!("{v:.4}")
    } else {
        format!("{v:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FittedParams, GammaParams, ModelKind, SampleSet, SampleSummary, TwoStepParams};

    fn records(w_gamma: f64) -> [ModelComparisonRecord; 2] {
        let g = GammaParams { alpha: 3.0, beta: 0.01 };
        let s = TwoStepParams {
            beta_1: 0.005,
            delta_beta: 0.001,
        };
        [
            ModelComparisonRecord {
                model: ModelKind::Gamma,
                params: FittedParams::Gamma(g),
                log_likelihood: -100.0,
                aic: 204.0,
                aic_weight: w_gamma,
            },
            ModelComparisonRecord {
                model: ModelKind::TwoStepPoisson,
                params: FittedParams::TwoStep(s),
                log_likelihood: -101.0,
                aic: 206.0,
                aic_weight: 1.0 - w_gamma,
            },
        ]
    }

    #[test]
    fn comparison_table_stars_preferred_model() {
        let table = format_comparison_table(&records(0.73));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("* Gamma"));
        assert!(lines[3].starts_with("  Two-step Poisson"));
        assert!(lines[2].contains("0.7300"));

        let flipped = format_comparison_table(&records(0.2));
        assert!(flipped.lines().nth(3).unwrap().starts_with("* Two-step"));
    }

    #[test]
    fn condition_block_includes_intervals_when_present() {
        let samples = SampleSet::new(vec![100.0, 200.0, 300.0]).unwrap();
        let gamma = GammaParams { alpha: 3.0, beta: 0.01 };
        let mut a = ConditionAnalysis {
            label: "12 uM".to_string(),
            concentration_um: Some(12),
            summary: SampleSummary::from_samples(&samples),
            gamma,
            two_step: TwoStepParams {
                beta_1: 0.005,
                delta_beta: 0.001,
            },
            gamma_ci: None,
            two_step_ci: None,
            comparison: records(0.6),
        };
        let without = format_condition(&a);
        assert!(without.starts_with("--- 12 uM ---"));
        assert!(!without.contains("CI"));

        a.gamma_ci = Some(ConfidenceInterval {
            low: GammaParams { alpha: 2.5, beta: 0.008 },
            high: GammaParams { alpha: 3.5, beta: 0.012 },
            coverage: 0.95,
            replicates: 1000,
        });
        let with = format_condition(&a);
        assert!(with.contains("95% CI (1000 reps): alpha [2.5000, 3.5000]  beta [0.008000, 0.012000]"));
    }

    #[test]
    fn bootstrap_description() {
        assert_eq!(describe_bootstrap(None), "disabled");
        let text = describe_bootstrap(Some(&BootstrapOptions::default()));
        assert_eq!(text, "1000 parametric replicates, 95% coverage, seed 0 (abort on failure)");
    }
}
