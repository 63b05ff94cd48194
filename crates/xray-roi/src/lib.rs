//! # xray-roi
//!
//! Region-of-interest analysis for X-ray/CT images.
//!
//! A [`Region`] selects pixels, a [`Channel`](xray_core::Channel) selects one
//! intensity per pixel, and the resulting samples feed descriptive
//! statistics and image quality metrics.
//!
//! # Modules
//!
//! - [`region`] - Rectangle, circle, ellipse and polygon geometry, masks
//! - [`extract`] - Ordered sample extraction with clipping
//! - [`analysis`] - Full ROI analysis and comparison
//! - [`metrics`] - SNR, CNR, transmission, attenuation, quality grade
//! - [`profile`] - Intensity along a line
//! - [`histogram`] - Per-channel percentage histograms
//! - [`crosshair`] - Crosshair lines through a region center
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_roi::{analyze_roi, AnalysisOptions, Region};
//!
//! let img = PixelBuffer::from_fn(32, 32, |x, _| {
//!     let v = if x < 16 { 60 } else { 180 };
//!     [v, v, v, 255]
//! });
//! let opts = AnalysisOptions {
//!     reference_intensity: Some(240.0),
//!     ..Default::default()
//! };
//! let a = analyze_roi(&img, &Region::circle(8.0, 16.0, 5.0), &opts).unwrap();
//! assert_eq!(a.statistics.mean, 60.0);
//! assert_eq!(a.metrics.unwrap().transmission, Some(25.0));
//! ```
//!
//! # Degenerate Inputs
//!
//! Regions that reach past the image are clipped, so `pixel_count` can be
//! smaller than `area`. Empty sample sets and zero deviations produce the
//! sentinel values listed in [`metrics`], never errors.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;

pub mod analysis;
pub mod crosshair;
pub mod extract;
pub mod histogram;
pub mod metrics;
pub mod profile;
pub mod region;

pub use analysis::{analyze_roi, compare_rois, AnalysisOptions, RoiAnalysis, RoiComparison};
pub use error::{RoiError, RoiResult};
pub use extract::{extract, extract_circle, extract_ellipse, extract_rectangle};
pub use histogram::{channel_histogram, histogram_fold, HistogramFold};
pub use metrics::{QualityIndex, QualityMetrics};
pub use profile::{extract_line_profile, Line, ProfilePoint};
pub use region::{polygon_centroid, roi_mask, Bounds, Point, Region, Shape};
