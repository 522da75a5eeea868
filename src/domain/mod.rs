//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated inputs (`SampleSet`, `ConditionSamples`, `Dataset`)
//! - per-family parameter vectors (`GammaParams`, `TwoStepParams`)
//! - estimation outputs (`ConfidenceInterval`, `ModelComparisonRecord`, `ConditionAnalysis`)
//! - run configuration (`AnalysisConfig`, `BootstrapOptions`)

pub mod types;

pub use types::*;
