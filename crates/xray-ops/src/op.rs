//! Typed operation requests.
//!
//! [`Operation`] names one buffer-to-buffer operation together with its
//! parameters. It is what the UI layer builds from slider values and what a
//! [`Pipeline`](crate::Pipeline) recipe is made of. Parameters are validated
//! when the operation is applied, before any pixel is touched.
//!
//! In YAML the operation is selected by an `op` key, and omitted parameters
//! take the defaults listed on each params struct:
//!
//! ```yaml
//! - op: gaussian
//!   sigma: 1.5
//! - op: median          # kernel_size defaults to 3
//! - op: window_level
//!   center: 128
//!   width: 64
//! - op: rotate
//!   angle: 90
//! - op: resize
//!   width: 512
//!   height: 512
//!   filter: bilinear
//! ```
//!
//! Multi-input operations such as
//! [`merge_exposures`](crate::hdr::merge_exposures) are not steps.

use serde::{Deserialize, Serialize};
use tracing::trace;
use xray_core::PixelBuffer;

#[cfg(feature = "fft")]
use xray_core::Channel;

#[cfg(feature = "fft")]
use crate::fft::{self, FrequencyFilter};
use crate::filter::{self, Kernel};
use crate::tone::{self, LevelRange, Window};
use crate::transform::{self, Mirror, ResizeFilter, Rotation};
use crate::{CancelToken, OpsResult};

fn one() -> f64 {
    1.0
}

fn byte_max() -> f64 {
    255.0
}

/// Gaussian blur parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianParams {
    /// Standard deviation in pixels (default 1).
    pub sigma: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

/// Parameters of the mean, median and variance filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodParams {
    /// Odd side length of the neighborhood, at least 3 (default 3).
    pub kernel_size: usize,
}

impl Default for NeighborhoodParams {
    fn default() -> Self {
        Self { kernel_size: 3 }
    }
}

/// Unsharp mask parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpParams {
    /// Sharpening strength (default 1).
    pub amount: f64,
    /// Blur sigma of the mask (default 1).
    pub sigma: f64,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            amount: 1.0,
            sigma: 1.0,
        }
    }
}

/// Brightness or contrast amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustParams {
    /// Amount in `[-100, 100]` (default 0, no change).
    pub value: f64,
}

/// Binary threshold parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Luma level; strictly brighter pixels become white (default 128).
    pub level: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { level: 128.0 }
    }
}

/// Erosion and dilation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    /// Odd side length of the square element (default 3).
    pub kernel_size: usize,
    /// Number of passes (default 1).
    pub iterations: u32,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            iterations: 1,
        }
    }
}

/// Gamma correction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GammaParams {
    /// Exponent; below 1 brightens, above 1 darkens.
    pub gamma: f64,
    /// Multiplier (default 1).
    #[serde(default = "one")]
    pub c: f64,
}

/// Histogram stretch output range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeParams {
    /// Lowest output value (default 0).
    pub min_out: f64,
    /// Highest output value (default 255).
    pub max_out: f64,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            min_out: 0.0,
            max_out: 255.0,
        }
    }
}

/// Logarithmic inversion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvertLogParams {
    /// Unattenuated reference intensity `I0` (default 255).
    #[serde(default = "byte_max")]
    pub max_intensity: f64,
}

impl Default for InvertLogParams {
    fn default() -> Self {
        Self { max_intensity: 255.0 }
    }
}

/// Rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateParams {
    /// Clockwise angle: 90, 180 or 270.
    pub angle: Rotation,
}

/// Mirror parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorParams {
    /// Flip axis (default horizontal).
    pub axis: Mirror,
}

/// Pixel binning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinParams {
    /// Block side length (default 2).
    pub size: u32,
}

impl Default for BinParams {
    fn default() -> Self {
        Self { size: 2 }
    }
}

/// Crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropParams {
    /// Left column (default 0).
    #[serde(default)]
    pub x: u32,
    /// Top row (default 0).
    #[serde(default)]
    pub y: u32,
    /// Width of the kept area.
    pub width: u32,
    /// Height of the kept area.
    pub height: u32,
}

/// Resize target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeParams {
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Resampling filter (default nearest).
    #[serde(default)]
    pub filter: ResizeFilter,
}

/// Frequency-domain filter parameters.
#[cfg(feature = "fft")]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyFilterParams {
    /// Channel transformed (default gray).
    #[serde(default)]
    pub channel: Channel,
    /// Radial mask.
    pub filter: FrequencyFilter,
}

/// One buffer-to-buffer operation with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Custom kernel convolution.
    Convolve(Kernel),
    /// Gaussian blur.
    Gaussian(GaussianParams),
    /// Box blur.
    Mean(NeighborhoodParams),
    /// Per-channel median.
    Median(NeighborhoodParams),
    /// Sobel gradient magnitude.
    Sobel,
    /// Absolute Laplacian.
    Laplacian,
    /// Unsharp mask.
    Unsharp(UnsharpParams),
    /// Local standard deviation.
    Variance(NeighborhoodParams),
    /// Grayscale erosion.
    Erode(MorphologyParams),
    /// Grayscale dilation.
    Dilate(MorphologyParams),
    /// Additive brightness.
    Brightness(AdjustParams),
    /// Contrast around mid-gray.
    Contrast(AdjustParams),
    /// Rec.601 luma broadcast to RGB.
    Grayscale,
    /// Binary luma threshold.
    Threshold(ThresholdParams),
    /// Gamma correction.
    Gamma(GammaParams),
    /// Per-channel histogram stretch.
    Normalize(NormalizeParams),
    /// Gray histogram equalization.
    Equalize,
    /// `255 - v` negative.
    Invert,
    /// Logarithmic negative.
    InvertLog(InvertLogParams),
    /// Window/level.
    WindowLevel(Window),
    /// Per-channel window by min/max level.
    WindowRange(LevelRange),
    /// Quarter-turn rotation.
    Rotate(RotateParams),
    /// Flip.
    Mirror(MirrorParams),
    /// Block-average downsampling.
    Bin(BinParams),
    /// Rectangular cut-out.
    Crop(CropParams),
    /// Resampling to a new size.
    Resize(ResizeParams),
    /// Radial mask in the frequency domain.
    #[cfg(feature = "fft")]
    FrequencyFilter(FrequencyFilterParams),
}

impl Operation {
    /// Stable snake_case name, the value of the `op` key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convolve(_) => "convolve",
            Self::Gaussian(_) => "gaussian",
            Self::Mean(_) => "mean",
            Self::Median(_) => "median",
            Self::Sobel => "sobel",
            Self::Laplacian => "laplacian",
            Self::Unsharp(_) => "unsharp",
            Self::Variance(_) => "variance",
            Self::Erode(_) => "erode",
            Self::Dilate(_) => "dilate",
            Self::Brightness(_) => "brightness",
            Self::Contrast(_) => "contrast",
            Self::Grayscale => "grayscale",
            Self::Threshold(_) => "threshold",
            Self::Gamma(_) => "gamma",
            Self::Normalize(_) => "normalize",
            Self::Equalize => "equalize",
            Self::Invert => "invert",
            Self::InvertLog(_) => "invert_log",
            Self::WindowLevel(_) => "window_level",
            Self::WindowRange(_) => "window_range",
            Self::Rotate(_) => "rotate",
            Self::Mirror(_) => "mirror",
            Self::Bin(_) => "bin",
            Self::Crop(_) => "crop",
            Self::Resize(_) => "resize",
            #[cfg(feature = "fft")]
            Self::FrequencyFilter(_) => "frequency_filter",
        }
    }

    /// Applies the operation to `src`, returning a new buffer.
    ///
    /// ```rust
    /// use xray_core::PixelBuffer;
    /// use xray_ops::{Operation, op::BinParams};
    ///
    /// let src = PixelBuffer::filled(8, 6, [10, 20, 30, 255]);
    /// let out = Operation::Bin(BinParams { size: 2 }).apply(&src).unwrap();
    /// assert_eq!(out.dimensions(), (4, 3));
    /// ```
    pub fn apply(&self, src: &PixelBuffer) -> OpsResult<PixelBuffer> {
        self.apply_cancellable(src, &CancelToken::new())
    }

    /// Applies the operation, polling `cancel` between rows.
    pub fn apply_cancellable(&self, src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
        trace!(op = self.name(), width = src.width(), height = src.height(), "apply");
        match self {
            Self::Convolve(k) => filter::convolve_with(src, k, cancel),
            Self::Gaussian(p) => filter::gaussian_with(src, p.sigma, cancel),
            Self::Mean(p) => filter::mean_with(src, p.kernel_size, cancel),
            Self::Median(p) => filter::median_with(src, p.kernel_size, cancel),
            Self::Sobel => filter::sobel_with(src, cancel),
            Self::Laplacian => filter::laplacian_with(src, cancel),
            Self::Unsharp(p) => filter::unsharp_mask_with(src, p.amount, p.sigma, cancel),
            Self::Variance(p) => filter::variance_with(src, p.kernel_size, cancel),
            Self::Erode(p) => filter::erode_with(src, p.kernel_size, p.iterations, cancel),
            Self::Dilate(p) => filter::dilate_with(src, p.kernel_size, p.iterations, cancel),
            Self::Brightness(p) => tone::brightness_with(src, p.value, cancel),
            Self::Contrast(p) => tone::contrast_with(src, p.value, cancel),
            Self::Grayscale => tone::grayscale_with(src, cancel),
            Self::Threshold(p) => tone::threshold_with(src, p.level, cancel),
            Self::Gamma(p) => tone::gamma_with(src, p.gamma, p.c, cancel),
            Self::Normalize(p) => tone::normalize_with(src, p.min_out, p.max_out, cancel),
            Self::Equalize => tone::equalize_with(src, cancel),
            Self::Invert => tone::invert_with(src, cancel),
            Self::InvertLog(p) => tone::invert_log_with(src, p.max_intensity, cancel),
            Self::WindowLevel(w) => tone::window_level_with(src, *w, cancel),
            Self::WindowRange(r) => tone::window_range_with(src, *r, cancel),
            Self::Rotate(p) => transform::rotate_with(src, p.angle, cancel),
            Self::Mirror(p) => transform::mirror_with(src, p.axis, cancel),
            Self::Bin(p) => transform::bin_with(src, p.size, cancel),
            Self::Crop(p) => transform::crop_with(src, p.x, p.y, p.width, p.height, cancel),
            Self::Resize(p) => transform::resize_with(src, p.width, p.height, p.filter, cancel),
            #[cfg(feature = "fft")]
            Self::FrequencyFilter(p) => fft::filter_image_with(src, p.channel, &p.filter, cancel),
        }
    }
}
