//! # xray-core
//!
//! Core types for X-ray/CT image processing.
//!
//! This crate provides the foundational types shared by every engine:
//!
//! - [`PixelBuffer`] - Owned RGBA8 raster, the input and output of every operation
//! - [`Channel`] - Selects one scalar intensity per pixel
//! - [`clamp_u8`] - Saturating cast applied at every channel write
//! - [`Error`] - Buffer construction and bounds errors
//!
//! ## Crate Structure
//!
//! ```text
//! xray-core (this crate)
//!    ^
//!    |
//!    +-- xray-math (statistics)
//!    +-- xray-ops (filters, tone, geometry, FFT)
//!    +-- xray-roi (ROI analysis, quality metrics)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/deserialize [`Channel`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod channel;
pub mod error;
pub mod pixel;

pub use buffer::PixelBuffer;
pub use channel::Channel;
pub use error::{Error, Result};
pub use pixel::{
    clamp_u8, gray_mean, gray_rounded, gray_truncated, luma_rec601, round_half_up, CHANNELS,
};

/// Prelude module for convenient imports.
///
/// ```
/// use xray_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::PixelBuffer;
    pub use crate::channel::Channel;
    pub use crate::error::{Error, Result};
    pub use crate::pixel::clamp_u8;
}
