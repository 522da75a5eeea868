//! Estimation on top of the models.
//!
//! Responsibilities:
//!
//! - maximum-likelihood fits for each family (Powell minimization)
//! - parametric / nonparametric bootstrap confidence intervals (parallel)
//! - AIC comparison between the fitted families

pub mod bootstrap;
pub mod mle;
pub mod selection;

pub use bootstrap::*;
pub use mle::*;
pub use selection::*;
