//! Reporting: formatted terminal output for analyzed conditions.

pub mod format;

pub use format::*;
