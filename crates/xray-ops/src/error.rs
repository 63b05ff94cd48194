//! Error types for image operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value (even kernel size, non-positive sigma, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation observed a cancelled [`CancelToken`](crate::CancelToken).
    #[error("operation cancelled")]
    Cancelled,

    /// Buffer construction or access failed.
    #[error(transparent)]
    Core(#[from] xray_core::Error),

    /// Pipeline recipe could not be parsed.
    #[error("pipeline recipe: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Worker pool could not be created.
    #[error("thread pool: {0}")]
    ThreadPool(String),

    /// A submitted job panicked; the payload message is kept.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// A submitted job's worker went away without reporting a result.
    #[error("worker disconnected before producing a result")]
    WorkerDisconnected,
}

impl OpsError {
    /// Shorthand for [`OpsError::InvalidParameter`].
    pub(crate) fn param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Returns `true` for parameter validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidParameter(_) | Self::InvalidDimensions(_))
    }
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;
