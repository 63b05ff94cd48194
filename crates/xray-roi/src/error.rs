//! Error types for ROI analysis.

use thiserror::Error;

/// Errors raised by ROI extraction and analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    /// Region or metric parameter cannot be used (zero area, non-finite
    /// coordinates, non-positive thickness).
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Two analyses were taken on images of different sizes.
    #[error("analyses taken on different images: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First image width
        a_width: u32,
        /// First image height
        a_height: u32,
        /// Second image width
        b_width: u32,
        /// Second image height
        b_height: u32,
    },

    /// Buffer-level failure.
    #[error(transparent)]
    Core(#[from] xray_core::Error),
}

impl RoiError {
    pub(crate) fn region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }
}

/// Result type for ROI analysis.
pub type RoiResult<T> = Result<T, RoiError>;
