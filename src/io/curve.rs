//! Curve data for plotting fitted models against the data.
//!
//! Per condition the file holds:
//! - the ECDF of the observed times (one step per sorted observation)
//! - the fitted Gamma and two-step CDFs on a shared time grid
//!
//! Rendering is left to whatever reads the JSON.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ConditionAnalysis, Dataset};
use crate::error::AppError;
use crate::models::{gamma_cdf, two_step_cdf};

/// Empirical CDF as parallel arrays: `y[i] = (i + 1) / n` at sorted `t[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ecdf {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
}

impl Ecdf {
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut t: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        t.sort_by(|a, b| a.total_cmp(b));
        let n = t.len() as f64;
        let y = (1..=t.len()).map(|i| i as f64 / n).collect();
        Self { t, y }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionCurves {
    pub label: String,
    pub concentration_um: Option<u32>,
    pub ecdf: Ecdf,
    pub gamma_cdf: Vec<f64>,
    pub two_step_cdf: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurveFile {
    pub grid_t: Vec<f64>,
    pub conditions: Vec<ConditionCurves>,
}

/// Evaluate the curves for every analyzed condition found in `dataset`.
pub fn build_curves(analyses: &[ConditionAnalysis], dataset: &Dataset, grid: &[f64]) -> CurveFile {
    let conditions = analyses
        .iter()
        .filter_map(|a| {
            let samples = dataset.conditions.iter().find(|c| c.label == a.label)?;
            Some(ConditionCurves {
                label: a.label.clone(),
                concentration_um: a.concentration_um,
                ecdf: Ecdf::from_samples(samples.samples.as_slice()),
                gamma_cdf: grid.iter().map(|&t| gamma_cdf(&a.gamma, t)).collect(),
                two_step_cdf: grid.iter().map(|&t| two_step_cdf(&a.two_step, t)).collect(),
            })
        })
        .collect();

    CurveFile {
        grid_t: grid.to_vec(),
        conditions,
    }
}

/// Write the curve JSON file.
pub fn write_curves_json(
    path: &Path,
    analyses: &[ConditionAnalysis],
    dataset: &Dataset,
    grid: &[f64],
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    let curves = build_curves(analyses, dataset, grid);
    serde_json::to_writer_pretty(BufWriter::new(file), &curves)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecdf_steps_through_sorted_samples() {
        let e = Ecdf::from_samples(&[30.0, 10.0, 20.0, 40.0]);
        assert_eq!(e.t, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(e.y, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn empty_ecdf() {
        let e = Ecdf::from_samples(&[]);
        assert!(e.t.is_empty() && e.y.is_empty());
    }
}
