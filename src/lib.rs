//! `catastrophe-fit` library crate.
//!
//! The binary (`mtcat`) is a thin wrapper around this library so that:
//!
//! - the estimators are testable without spawning processes
//! - the core (models, fits, bootstrap, comparison) can be reused without the CSV/CLI layer

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
