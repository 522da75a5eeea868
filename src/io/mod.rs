//! Input/output adapters around the estimation core.
//!
//! - CSV ingest into a `Dataset` (`ingest`)
//! - results JSON (`export`)
//! - ECDF / fitted CDF curves JSON (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
