//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads the CSV and runs the analysis pipeline
//! - prints the report
//! - writes optional exports

use clap::Parser;

use crate::cli::{AnalyzeArgs, Cli, Command};
use crate::domain::{AnalysisConfig, BootstrapOptions};
use crate::error::AppError;
use crate::io::{AnalysisReport, write_curves_json, write_results_json};
use crate::math::PowellOptions;
use crate::models::linspace;

pub mod pipeline;

/// Entry point for the `mtcat` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args, OutputMode::Full),
        Command::Compare(args) => handle_analyze(&args, OutputMode::CompareOnly),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    CompareOnly,
}

fn handle_analyze(args: &AnalyzeArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = config_for_mode(args, mode)?;
    let run = pipeline::run_analysis(&config)?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_analysis(&run.analyses, &config));
        }
        OutputMode::CompareOnly => {
            for a in &run.analyses {
                println!("--- {} ---", a.label);
                println!("{}", crate::report::format_comparison_table(&a.comparison));
            }
        }
    }

    if let Some(path) = &config.export_json {
        let report = AnalysisReport::new(&config, run.analyses.clone());
        write_results_json(path, &report)?;
    }
    if let Some(path) = &config.export_curves {
        let grid = linspace(config.t_max, config.grid_points);
        write_curves_json(path, &run.analyses, &run.dataset, &grid)?;
    }

    Ok(())
}

/// `config_from_args`, minus work the chosen output never shows.
///
/// `compare` prints no intervals, so it only bootstraps when the results
/// JSON (which carries them) is requested.
fn config_for_mode(args: &AnalyzeArgs, mode: OutputMode) -> Result<AnalysisConfig, AppError> {
    let mut config = config_from_args(args)?;
    if mode == OutputMode::CompareOnly && config.export_json.is_none() {
        config.bootstrap = None;
    }
    Ok(config)
}

/// Validate flags and build the pipeline configuration.
pub fn config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    if !(args.t_max.is_finite() && args.t_max > 0.0) {
        return Err(AppError::new(2, "--t-max must be a positive number of seconds."));
    }
    if args.grid_points < 2 {
        return Err(AppError::new(2, "--grid-points must be at least 2."));
    }
    for (flag, tol) in [("--xtol", args.xtol), ("--ftol", args.ftol)] {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(AppError::new(2, format!("{flag} must be a positive number.")));
        }
    }

    let bootstrap = if args.no_bootstrap {
        None
    } else {
        if args.replicates == 0 {
            return Err(AppError::new(2, "--replicates must be at least 1."));
        }
        if !(args.coverage > 0.0 && args.coverage < 1.0) {
            return Err(AppError::new(2, "--coverage must lie strictly between 0 and 1."));
        }
        Some(BootstrapOptions {
            replicates: args.replicates,
            coverage: args.coverage,
            seed: args.seed,
            method: args.method,
            on_failure: args.on_failure,
        })
    };

    Ok(AnalysisConfig {
        csv_path: args.csv.clone(),
        skip_rows: args.skip_rows,
        columns: args.columns.iter().map(|c| c.trim().to_string()).collect(),
        bootstrap,
        minimizer: PowellOptions {
            xtol: args.xtol,
            ftol: args.ftol,
            ..PowellOptions::default()
        },
        export_json: args.export_json.clone(),
        export_curves: args.export_curves.clone(),
        t_max: args.t_max,
        grid_points: args.grid_points,
    })
}
