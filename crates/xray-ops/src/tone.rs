//! Intensity and contrast transforms.
//!
//! Per-pixel remappings: brightness and contrast, gamma, thresholding,
//! histogram stretch and equalization, inversion and the two window forms
//! (center/width on the gray intensity, min/max levels per channel). None
//! of these read a neighborhood, so each is a single row-parallel pass.
//! Alpha is always copied from the source.
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::tone;
//!
//! let src = PixelBuffer::filled(4, 4, [40, 80, 120, 255]);
//! let inv = tone::invert(&src).unwrap();
//! assert_eq!(inv.pixel(0, 0).unwrap(), [215, 175, 135, 255]);
//! assert_eq!(tone::invert(&inv).unwrap(), src);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use xray_core::{clamp_u8, gray_mean, gray_rounded, luma_rec601, round_half_up, PixelBuffer};

use crate::rows::map_pixels;
use crate::{CancelToken, OpsError, OpsResult};

/// Offset added before the logarithm so that black does not hit `log(0)`.
const LOG_EPSILON: f64 = 0.001;

/// Divisor that maps `-ln(0.001) ≈ 6.9` onto the full byte range.
const LOG_RANGE: f64 = 7.0;

/// Largest magnitude accepted by [`brightness`] and [`contrast`].
pub const ADJUST_LIMIT: f64 = 100.0;

fn validate_adjustment(name: &str, value: f64) -> OpsResult<()> {
    if !(value.is_finite() && value.abs() <= ADJUST_LIMIT) {
        return Err(OpsError::param(format!(
            "{name} must be within [-{ADJUST_LIMIT}, {ADJUST_LIMIT}], got {value}"
        )));
    }
    Ok(())
}

fn apply_lut(src: &PixelBuffer, lut: &[u8], cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    map_pixels(src, cancel, |p| {
        [lut[p[0] as usize], lut[p[1] as usize], lut[p[2] as usize], p[3]]
    })
}

/// Adds `value / 100 · 128` to each RGB channel, saturated.
///
/// # Errors
///
/// Fails unless `value` lies in `[-100, 100]`.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::brightness;
///
/// let src = PixelBuffer::filled(1, 1, [10, 100, 250, 40]);
/// let out = brightness(&src, 50.0).unwrap();
/// assert_eq!(out.pixel(0, 0).unwrap(), [74, 164, 255, 40]);
/// ```
pub fn brightness(src: &PixelBuffer, value: f64) -> OpsResult<PixelBuffer> {
    brightness_with(src, value, &CancelToken::new())
}

pub(crate) fn brightness_with(
    src: &PixelBuffer,
    value: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    validate_adjustment("brightness", value)?;
    let delta = value / ADJUST_LIMIT * 128.0;
    trace!(value, delta, "brightness");

    let lut: Vec<u8> = (0..=255u8).map(|v| clamp_u8(v as f64 + delta)).collect();
    apply_lut(src, &lut, cancel)
}

/// Contrast around mid-gray, `f · (v - 128) + 128` with
/// `f = 259 (value + 255) / (255 (259 - value))`.
///
/// Zero leaves the image unchanged; `-100` flattens it towards 128.
///
/// # Errors
///
/// Fails unless `value` lies in `[-100, 100]`.
pub fn contrast(src: &PixelBuffer, value: f64) -> OpsResult<PixelBuffer> {
    contrast_with(src, value, &CancelToken::new())
}

pub(crate) fn contrast_with(
    src: &PixelBuffer,
    value: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    validate_adjustment("contrast", value)?;
    let factor = 259.0 * (value + 255.0) / (255.0 * (259.0 - value));
    trace!(value, factor, "contrast");

    let lut: Vec<u8> = (0..=255u8)
        .map(|v| clamp_u8(factor * (v as f64 - 128.0) + 128.0))
        .collect();
    apply_lut(src, &lut, cancel)
}

/// Rec.601 luma written to R, G and B.
pub fn grayscale(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    grayscale_with(src, &CancelToken::new())
}

pub(crate) fn grayscale_with(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "grayscale");
    map_pixels(src, cancel, |p| {
        let v = luma_rec601(p);
        [v, v, v, p[3]]
    })
}

/// Binary threshold of the Rec.601 luma: strictly above `level` becomes
/// white, everything else black.
///
/// # Errors
///
/// Fails if `level` is not finite.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::threshold;
///
/// let src = PixelBuffer::from_fn(3, 1, |x, _| {
///     let v = [127, 128, 129][x as usize];
///     [v, v, v, 255]
/// });
/// let out = threshold(&src, 128.0).unwrap();
/// let row: Vec<u8> = out.pixels().map(|p| p[0]).collect();
/// assert_eq!(row, vec![0, 0, 255]);
/// ```
pub fn threshold(src: &PixelBuffer, level: f64) -> OpsResult<PixelBuffer> {
    threshold_with(src, level, &CancelToken::new())
}

pub(crate) fn threshold_with(
    src: &PixelBuffer,
    level: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !level.is_finite() {
        return Err(OpsError::param(format!("threshold must be finite, got {level}")));
    }
    trace!(level, "threshold");
    map_pixels(src, cancel, |p| {
        let v = if luma_rec601(p) as f64 > level { 255 } else { 0 };
        [v, v, v, p[3]]
    })
}

/// Gamma correction, `c · (v/255)^γ · 255` per RGB channel.
///
/// # Errors
///
/// Fails if `gamma <= 0` or either parameter is not finite.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::gamma;
///
/// let src = PixelBuffer::filled(1, 1, [64, 128, 255, 9]);
/// let out = gamma(&src, 0.5, 1.0).unwrap();
/// assert_eq!(out.pixel(0, 0).unwrap(), [128, 181, 255, 9]);
/// ```
pub fn gamma(src: &PixelBuffer, gamma: f64, c: f64) -> OpsResult<PixelBuffer> {
    gamma_with(src, gamma, c, &CancelToken::new())
}

pub(crate) fn gamma_with(
    src: &PixelBuffer,
    gamma: f64,
    c: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(OpsError::param(format!("gamma must be > 0, got {gamma}")));
    }
    if !c.is_finite() {
        return Err(OpsError::param(format!("gamma multiplier must be finite, got {c}")));
    }
    trace!(gamma, c, "gamma");

    let lut: Vec<u8> = (0..=255u8)
        .map(|v| clamp_u8(c * (v as f64 / 255.0).powf(gamma) * 255.0))
        .collect();
    apply_lut(src, &lut, cancel)
}

/// Per-channel min/max stretch into `[min_out, max_out]`.
///
/// Each of R, G, B is stretched independently using its own observed range.
/// A constant channel maps entirely to `min_out`.
///
/// # Errors
///
/// Fails unless `0 <= min_out <= max_out <= 255`.
pub fn normalize(src: &PixelBuffer, min_out: f64, max_out: f64) -> OpsResult<PixelBuffer> {
    normalize_with(src, min_out, max_out, &CancelToken::new())
}

pub(crate) fn normalize_with(
    src: &PixelBuffer,
    min_out: f64,
    max_out: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !(0.0..=255.0).contains(&min_out) || !(0.0..=255.0).contains(&max_out) || min_out > max_out {
        return Err(OpsError::param(format!(
            "output range must satisfy 0 <= min <= max <= 255, got [{min_out}, {max_out}]"
        )));
    }
    trace!(min_out, max_out, "normalize");

    let mut lo = [255u8; 3];
    let mut hi = [0u8; 3];
    for p in src.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(p[c]);
            hi[c] = hi[c].max(p[c]);
        }
    }

    let span = max_out - min_out;
    let mut luts = [[0u8; 256]; 3];
    for c in 0..3 {
        if hi[c] == lo[c] {
            debug!(channel = c, value = lo[c], "constant channel, mapping to min_out");
        }
        for (v, out) in luts[c].iter_mut().enumerate() {
            *out = if hi[c] == lo[c] {
                clamp_u8(min_out)
            } else {
                let t = (v as f64 - lo[c] as f64) / (hi[c] - lo[c]) as f64;
                clamp_u8(t * span + min_out)
            };
        }
    }

    map_pixels(src, cancel, |p| {
        [
            luts[0][p[0] as usize],
            luts[1][p[1] as usize],
            luts[2][p[2] as usize],
            p[3],
        ]
    })
}

/// Histogram equalization of the rounded gray image.
///
/// The result is monochrome: the equalized gray value is written to R, G
/// and B. A constant image equalizes to black.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::equalize;
///
/// let src = PixelBuffer::from_fn(4, 1, |x, _| {
///     let v = [10, 10, 20, 30][x as usize];
///     [v, v, v, 255]
/// });
/// let out = equalize(&src).unwrap();
/// let row: Vec<u8> = out.pixels().map(|p| p[0]).collect();
/// assert_eq!(row, vec![0, 0, 128, 255]);
/// ```
pub fn equalize(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    equalize_with(src, &CancelToken::new())
}

pub(crate) fn equalize_with(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "equalize");

    let mut hist = [0u64; 256];
    for p in src.pixels() {
        hist[gray_rounded(p) as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut acc = 0;
    for (i, h) in hist.iter().enumerate() {
        acc += h;
        cdf[i] = acc;
    }

    let total = src.pixel_count() as u64;
    let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
    let denom = total.saturating_sub(cdf_min);

    let mut lut = [0u8; 256];
    if denom == 0 {
        debug!(total, "single gray level, equalizing to zero");
    } else {
        for (i, out) in lut.iter_mut().enumerate() {
            let t = cdf[i].saturating_sub(cdf_min) as f64 / denom as f64;
            *out = clamp_u8(round_half_up(t * 255.0));
        }
    }

    map_pixels(src, cancel, |p| {
        let v = lut[gray_rounded(p) as usize];
        [v, v, v, p[3]]
    })
}

/// Simple negative, `255 - v` per RGB channel.
pub fn invert(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    invert_with(src, &CancelToken::new())
}

pub(crate) fn invert_with(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "invert");
    map_pixels(src, cancel, |p| [255 - p[0], 255 - p[1], 255 - p[2], p[3]])
}

/// Logarithmic negative, `-ln(v/I0 + 0.001) / 7 · 255` per RGB channel.
///
/// Models transmitted intensity against the unattenuated reference `I0`
/// (`max_intensity`): dark, strongly absorbing regions become bright.
///
/// # Errors
///
/// Fails unless `max_intensity` is positive and finite.
pub fn invert_log(src: &PixelBuffer, max_intensity: f64) -> OpsResult<PixelBuffer> {
    invert_log_with(src, max_intensity, &CancelToken::new())
}

pub(crate) fn invert_log_with(
    src: &PixelBuffer,
    max_intensity: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !(max_intensity.is_finite() && max_intensity > 0.0) {
        return Err(OpsError::param(format!(
            "max intensity must be > 0, got {max_intensity}"
        )));
    }
    trace!(max_intensity, "invert_log");

    let lut: Vec<u8> = (0..=255u8)
        .map(|v| {
            let ratio = v as f64 / max_intensity;
            clamp_u8(-(ratio + LOG_EPSILON).ln() / LOG_RANGE * 255.0)
        })
        .collect();
    apply_lut(src, &lut, cancel)
}

/// Window/level parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Intensity at the middle of the window (level).
    pub center: f64,
    /// Span of intensities mapped onto `[0, 255]`.
    pub width: f64,
}

impl Window {
    /// Lower window bound.
    pub fn min(&self) -> f64 {
        self.center - self.width / 2.0
    }

    /// Upper window bound.
    pub fn max(&self) -> f64 {
        self.center + self.width / 2.0
    }

    /// Maps a gray intensity through the window.
    pub fn map(&self, gray: f64) -> f64 {
        let (lo, hi) = (self.min(), self.max());
        if gray <= lo {
            0.0
        } else if gray >= hi {
            255.0
        } else {
            (gray - lo) / self.width * 255.0
        }
    }
}

/// Window/level of the RGB-mean intensity, written to R, G and B.
///
/// Intensities at or below `center - width/2` become 0, at or above
/// `center + width/2` become 255, linear in between. A zero width is a
/// hard threshold at `center`.
///
/// # Errors
///
/// Fails if `width` is negative or either value is not finite.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::window_level;
///
/// let src = PixelBuffer::from_fn(3, 1, |x, _| {
///     let v = [50, 100, 150][x as usize];
///     [v, v, v, 255]
/// });
/// let out = window_level(&src, 100.0, 100.0).unwrap();
/// let row: Vec<u8> = out.pixels().map(|p| p[0]).collect();
/// assert_eq!(row, vec![0, 128, 255]);
/// ```
pub fn window_level(src: &PixelBuffer, center: f64, width: f64) -> OpsResult<PixelBuffer> {
    window_level_with(src, Window { center, width }, &CancelToken::new())
}

pub(crate) fn window_level_with(
    src: &PixelBuffer,
    window: Window,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !(window.center.is_finite() && window.width.is_finite()) || window.width < 0.0 {
        return Err(OpsError::param(format!(
            "window must have finite center and width >= 0, got {:?}",
            window
        )));
    }
    trace!(center = window.center, width = window.width, "window_level");

    map_pixels(src, cancel, |p| {
        let v = clamp_u8(window.map(gray_mean(p)));
        [v, v, v, p[3]]
    })
}

/// Sample depth the window levels are expressed in.
///
/// Serialized as the bit count:
///
/// ```rust
/// use xray_ops::tone::BitDepth;
///
/// assert_eq!(BitDepth::try_from(16).unwrap().max_value(), 65535.0);
/// assert!(BitDepth::try_from(12).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitDepth {
    /// Levels in `[0, 255]`.
    #[default]
    Eight,
    /// Levels in `[0, 65535]`.
    Sixteen,
}

impl BitDepth {
    /// Largest representable level.
    pub fn max_value(self) -> f64 {
        match self {
            Self::Eight => 255.0,
            Self::Sixteen => 65535.0,
        }
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = OpsError;

    fn try_from(bits: u8) -> OpsResult<Self> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(OpsError::param(format!("bit depth must be 8 or 16, got {other}"))),
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(d: BitDepth) -> u8 {
        match d {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

/// Window given by its lowest and highest level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRange {
    /// Level mapped to black.
    pub min_level: f64,
    /// Level mapped to white.
    pub max_level: f64,
    /// Depth the levels are expressed in (default 8).
    #[serde(default)]
    pub bit_depth: BitDepth,
}

impl LevelRange {
    fn validate(&self) -> OpsResult<()> {
        let top = self.bit_depth.max_value();
        let (lo, hi) = (self.min_level, self.max_level);
        if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || hi > top || lo >= hi {
            return Err(OpsError::param(format!(
                "levels must satisfy 0 <= min < max <= {top}, got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    /// Maps one sample: at or below `min_level` is 0, at or above
    /// `max_level` is 255, linear and rounded half-up in between.
    pub fn map(&self, v: f64) -> u8 {
        if v <= self.min_level {
            0
        } else if v >= self.max_level {
            255
        } else {
            let t = (v - self.min_level) / (self.max_level - self.min_level);
            clamp_u8(round_half_up(t * 255.0))
        }
    }
}

/// Window by explicit levels, applied to R, G and B independently.
///
/// Unlike [`window_level`] the channels are not merged into gray, so color
/// survives. Levels may be given in 16-bit units; byte samples are compared
/// against them directly.
///
/// # Errors
///
/// Fails unless `0 <= min_level < max_level <= bit_depth.max_value()`.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::tone::{window_range, BitDepth, LevelRange};
///
/// let src = PixelBuffer::filled(1, 1, [50, 100, 150, 77]);
/// let range = LevelRange { min_level: 50.0, max_level: 150.0, bit_depth: BitDepth::Eight };
/// assert_eq!(window_range(&src, range).unwrap().pixel(0, 0).unwrap(), [0, 128, 255, 77]);
/// ```
pub fn window_range(src: &PixelBuffer, range: LevelRange) -> OpsResult<PixelBuffer> {
    window_range_with(src, range, &CancelToken::new())
}

pub(crate) fn window_range_with(
    src: &PixelBuffer,
    range: LevelRange,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    range.validate()?;
    trace!(min = range.min_level, max = range.max_level, bits = u8::from(range.bit_depth), "window_range");

    let lut: Vec<u8> = (0..=255u8).map(|v| range.map(v as f64)).collect();
    apply_lut(src, &lut, cancel)
}
