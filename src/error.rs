use thiserror::Error;

use crate::domain::ModelKind;

/// Errors raised by the estimation core.
///
/// An infeasible parameter vector is *not* an error: the likelihoods return
/// `-inf` and the minimizer steers away from it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    /// Empty or non-positive samples, too few points, invalid options.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// The minimizer did not converge; carries its diagnostic.
    #[error("{} fit did not converge: {message}", .model.display_name())]
    Convergence { model: ModelKind, message: String },
    /// A bootstrap replicate could not be refit. The caller's samples were
    /// fine; the resampled data set was not.
    #[error("bootstrap replicate {replicate} failed: {source}")]
    ReplicateFailed { replicate: usize, source: Box<FitError> },
}

impl FitError {
    pub fn malformed(message: impl Into<String>) -> Self {
        FitError::MalformedInput(message.into())
    }
}

/// Error surfaced by the `mtcat` binary (message + process exit code).
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::MalformedInput(_) => 2,
            FitError::Convergence { .. } | FitError::ReplicateFailed { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
