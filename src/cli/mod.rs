//! Command-line parsing for the catastrophe-time analyzer.
//!
//! Argument parsing stays separate from the estimation code; `app` turns the
//! parsed flags into an `AnalysisConfig`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{BootstrapMethod, FailurePolicy};
use crate::io::ingest::DEFAULT_SKIP_ROWS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mtcat",
    version,
    about = "Fit Gamma and two-step Poisson models to microtubule catastrophe times"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit both models per condition, print MLEs, intervals and AIC comparison.
    Analyze(AnalyzeArgs),
    /// Print the AIC comparison tables only (useful for scripting).
    Compare(AnalyzeArgs),
}

/// Options shared by `analyze` and `compare`.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Wide CSV: one column of catastrophe times (seconds) per condition.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Preamble lines before the header row.
    #[arg(long, default_value_t = DEFAULT_SKIP_ROWS)]
    pub skip_rows: usize,

    /// Columns to analyze (comma-separated header labels); default is all.
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Bootstrap replicates per model and condition.
    #[arg(long, default_value_t = 1000)]
    pub replicates: usize,

    /// Confidence interval coverage.
    #[arg(long, default_value_t = 0.95)]
    pub coverage: f64,

    /// Base seed for the bootstrap.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// How bootstrap replicates are drawn.
    #[arg(long, value_enum, default_value_t = BootstrapMethod::Parametric)]
    pub method: BootstrapMethod,

    /// What to do when a replicate fit fails.
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_failure: FailurePolicy,

    /// Skip confidence intervals.
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Relative step tolerance of the minimizer's line searches.
    #[arg(long, default_value_t = 1e-4)]
    pub xtol: f64,

    /// Relative objective tolerance per minimizer iteration.
    #[arg(long, default_value_t = 1e-4)]
    pub ftol: f64,

    /// Export results (MLEs, intervals, comparison) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export ECDF and fitted CDF curves to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_curves: Option<PathBuf>,

    /// Upper end (seconds) of the fitted CDF grid.
    #[arg(long, default_value_t = 2000.0)]
    pub t_max: f64,

    /// Points in the fitted CDF grid.
    #[arg(long, default_value_t = 200)]
    pub grid_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults() {
        let cli = Cli::parse_from(["mtcat", "analyze", "--csv", "times.csv"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(cli.verbose, 0);
        assert_eq!(args.skip_rows, 9);
        assert!(args.columns.is_empty());
        assert_eq!(args.replicates, 1000);
        assert_eq!(args.method, BootstrapMethod::Parametric);
        assert_eq!(args.on_failure, FailurePolicy::Abort);
        assert_eq!(args.grid_points, 200);
        assert_eq!(args.xtol, 1e-4);
        assert_eq!(args.ftol, 1e-4);
    }

    #[test]
    fn compare_with_columns_and_flags() {
        let cli = Cli::parse_from([
            "mtcat",
            "compare",
            "-vv",
            "--csv",
            "times.csv",
            "--columns",
            "7 uM,12 uM",
            "--method",
            "nonparametric",
            "--on-failure",
            "discard",
            "--no-bootstrap",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.columns, vec!["7 uM".to_string(), "12 uM".to_string()]);
        assert_eq!(args.method, BootstrapMethod::Nonparametric);
        assert_eq!(args.on_failure, FailurePolicy::Discard);
        assert!(args.no_bootstrap);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
