//! Export analysis results to JSON.
//!
//! The file carries everything needed to rebuild the tables elsewhere:
//! - when and with which settings the run happened
//! - per condition: summary, both MLEs, intervals, AIC comparison

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AnalysisConfig, BootstrapOptions, ConditionAnalysis};
use crate::error::AppError;
use crate::math::PowellOptions;

/// Run settings echoed into the export.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSettings {
    pub csv_path: PathBuf,
    pub skip_rows: usize,
    pub columns: Vec<String>,
    pub bootstrap: Option<BootstrapOptions>,
    pub minimizer: PowellOptions,
}

impl ReportSettings {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            csv_path: config.csv_path.clone(),
            skip_rows: config.skip_rows,
            columns: config.columns.clone(),
            bootstrap: config.bootstrap.clone(),
            minimizer: config.minimizer.clone(),
        }
    }
}

/// Top-level JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub settings: ReportSettings,
    pub analyses: Vec<ConditionAnalysis>,
}

impl AnalysisReport {
    pub fn new(config: &AnalysisConfig, analyses: Vec<ConditionAnalysis>) -> Self {
        Self {
            tool: "mtcat".to_string(),
            generated_at: Utc::now(),
            settings: ReportSettings::from_config(config),
            analyses,
        }
    }
}

/// Write the report as pretty-printed JSON.
pub fn write_results_json(path: &Path, report: &AnalysisReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create results JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(|e| AppError::new(2, format!("Failed to write results JSON: {e}")))?;
    Ok(())
}
