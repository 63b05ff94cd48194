//! # xray-ops
//!
//! Image processing operations for X-ray/CT inspection.
//!
//! Every operation takes a [`PixelBuffer`](xray_core::PixelBuffer) and its
//! parameters and returns a freshly allocated buffer; inputs are never
//! modified.
//!
//! # Modules
//!
//! - [`filter`] - Convolution, blur, median, edge detection, sharpening,
//!   morphology
//! - [`tone`] - Brightness/contrast, gamma, threshold, histogram
//!   stretch/equalize, inversion, window/level
//! - [`transform`] - Rotation, mirroring, cropping, binning, resizing
//! - [`hdr`] - Merging bracketed exposures
//! - [`fft`] - Fourier transforms and frequency masks (feature `fft`)
//! - [`op`] / [`pipeline`] - Typed operation requests and YAML recipes
//! - [`parallel`] - Background worker pool (feature `parallel`)
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::{filter, tone, transform};
//!
//! let src = PixelBuffer::filled(64, 64, [120, 120, 120, 255]);
//!
//! let smooth = filter::median(&src, 3).unwrap();
//! let windowed = tone::window_level(&smooth, 120.0, 100.0).unwrap();
//! let turned = transform::rotate(&windowed, transform::Rotation::Deg90).unwrap();
//! assert_eq!(turned.dimensions(), (64, 64));
//! ```
//!
//! # Edge Handling
//!
//! Neighborhood filters clamp coordinates to the nearest border pixel.
//! Sobel and Laplacian leave their one-pixel border at zero.
//!
//! # Feature Flags
//!
//! - `parallel` (default) - Row-parallel execution with Rayon and [`Executor`]
//! - `fft` (default) - Frequency-domain operations with RustFFT

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cancel;
mod error;
mod rows;

pub mod filter;
pub mod hdr;
pub mod op;
pub mod pipeline;
pub mod tone;
pub mod transform;

#[cfg(feature = "fft")]
pub mod fft;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use cancel::CancelToken;
pub use error::{OpsError, OpsResult};
pub use filter::Kernel;
pub use op::Operation;
pub use pipeline::Pipeline;
pub use transform::{Mirror, ResizeFilter, Rotation};

#[cfg(feature = "fft")]
pub use fft::{FftResult, FrequencyFilter};

#[cfg(feature = "parallel")]
pub use parallel::{Executor, Job};
