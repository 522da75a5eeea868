//! Numerical building blocks: special functions, the Powell minimizer, percentiles.

pub mod powell;
pub mod quantile;
pub mod special;

pub use powell::*;
pub use quantile::*;
pub use special::*;
