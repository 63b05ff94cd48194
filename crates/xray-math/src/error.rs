//! Error types for statistics.

use thiserror::Error;

/// Errors raised by the checked statistics functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Percentile outside `[0, 100]`.
    #[error("percentile must be within [0, 100], got {0}")]
    InvalidPercentile(f64),
}

/// Result type for statistics.
pub type MathResult<T> = Result<T, MathError>;
