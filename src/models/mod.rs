//! Model implementations for catastrophe times.
//!
//! Models are implemented as small, pure functions so that the estimators can
//! stay generic:
//! - log-likelihoods (`likelihood`)
//! - theoretical CDFs for plot overlays (`cdf`)
//! - generative samplers for the parametric bootstrap (`generate`)

pub mod cdf;
pub mod generate;
pub mod likelihood;

pub use cdf::*;
pub use generate::*;
pub use likelihood::*;
