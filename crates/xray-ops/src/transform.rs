//! Geometric transformation operations.
//!
//! Provides lossless rotation, mirroring and cropping, plus pixel binning
//! and resampling.
//!
//! # Operations
//!
//! - [`rotate`] - Quarter-turn rotations, see [`Rotation`]
//! - [`mirror`] - Horizontal or vertical flip, see [`Mirror`]
//! - [`crop`] - Rectangular cut-out
//! - [`bin`] - Block-average downsampling
//! - [`resize`] - Resampling to any size, see [`ResizeFilter`]
//!
//! Rotation and mirroring only move pixels, so they are exact and
//! invertible: four quarter turns or two flips return the input.
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::transform::{rotate, mirror, Mirror, Rotation};
//!
//! let src = PixelBuffer::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
//!
//! let r = rotate(&src, Rotation::Deg90).unwrap();
//! assert_eq!(r.dimensions(), (2, 3));
//!
//! let m = mirror(&src, Mirror::Horizontal).unwrap();
//! assert_eq!(m.pixel(0, 0).unwrap(), [2, 0, 0, 255]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;
use xray_core::{clamp_u8, PixelBuffer, CHANNELS};

use crate::rows::{build_buffer, fill_buffer};
use crate::{CancelToken, OpsError, OpsResult};

/// Clockwise quarter-turn rotation.
///
/// Serialized as the angle in degrees. Only 90, 180 and 270 are accepted:
///
/// ```rust
/// use xray_ops::transform::Rotation;
///
/// assert_eq!(Rotation::try_from(270).unwrap(), Rotation::Deg270);
/// assert!(Rotation::try_from(45).is_err());
/// assert_eq!(i32::from(Rotation::Deg90), 90);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    /// 90° clockwise. Width and height swap.
    Deg90,
    /// 180°.
    Deg180,
    /// 270° clockwise (90° counter-clockwise). Width and height swap.
    Deg270,
}

impl Rotation {
    /// Returns `true` if the rotation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg180,
            Self::Deg270 => Self::Deg90,
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = OpsError;

    fn try_from(degrees: i32) -> OpsResult<Self> {
        match degrees {
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(OpsError::param(format!(
                "rotation must be 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(r: Rotation) -> i32 {
        match r {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    /// Flip left-right.
    #[default]
    Horizontal,
    /// Flip top-bottom.
    Vertical,
}

#[inline]
fn copy_px(src: &PixelBuffer, sx: u32, sy: u32, row: &mut [u8], dx: usize) {
    let o = dx * CHANNELS;
    row[o..o + CHANNELS].copy_from_slice(&src.pixel_unchecked(sx, sy));
}

/// Rotates the buffer clockwise.
///
/// Forward mapping for a source pixel `(x, y)` in a `w x h` buffer:
///
/// | rotation | destination       | output size |
/// |----------|-------------------|-------------|
/// | 90°      | `(h-1-y, x)`      | `h x w`     |
/// | 180°     | `(w-1-x, h-1-y)`  | `w x h`     |
/// | 270°     | `(y, w-1-x)`      | `h x w`     |
pub fn rotate(src: &PixelBuffer, rotation: Rotation) -> OpsResult<PixelBuffer> {
    rotate_with(src, rotation, &CancelToken::new())
}

pub(crate) fn rotate_with(
    src: &PixelBuffer,
    rotation: Rotation,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let (w, h) = src.dimensions();
    trace!(width = w, height = h, degrees = i32::from(rotation), "rotate");

    let (ow, oh) = if rotation.swaps_axes() { (h, w) } else { (w, h) };

    // gather: each destination pixel pulls from its source
    build_buffer(ow, oh, cancel, |dy, row| {
        let dy = dy as u32;
        for dx in 0..ow {
            let (sx, sy) = match rotation {
                Rotation::Deg90 => (dy, h - 1 - dx),
                Rotation::Deg180 => (w - 1 - dx, h - 1 - dy),
                Rotation::Deg270 => (w - 1 - dy, dx),
            };
            copy_px(src, sx, sy, row, dx as usize);
        }
    })
}

/// Mirrors the buffer along the given axis.
pub fn mirror(src: &PixelBuffer, axis: Mirror) -> OpsResult<PixelBuffer> {
    mirror_with(src, axis, &CancelToken::new())
}

pub(crate) fn mirror_with(
    src: &PixelBuffer,
    axis: Mirror,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let (w, h) = src.dimensions();
    trace!(width = w, height = h, ?axis, "mirror");

    fill_buffer(src, cancel, |y, row| {
        let y = y as u32;
        for x in 0..w {
            let (sx, sy) = match axis {
                Mirror::Horizontal => (w - 1 - x, y),
                Mirror::Vertical => (x, h - 1 - y),
            };
            copy_px(src, sx, sy, row, x as usize);
        }
    })
}

/// Pixel binning: averages `size x size` blocks into one pixel.
///
/// The output is `floor(w/size) x floor(h/size)`; trailing rows and columns
/// that do not fill a whole block are dropped. Alpha is set to 255.
///
/// # Errors
///
/// Fails if `size` is zero.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::transform::bin;
///
/// let src = PixelBuffer::from_fn(5, 4, |x, _| [(x * 10) as u8, 0, 0, 0]);
/// let out = bin(&src, 2).unwrap();
/// assert_eq!(out.dimensions(), (2, 2));
/// assert_eq!(out.pixel(1, 0).unwrap(), [25, 0, 0, 255]);
/// ```
pub fn bin(src: &PixelBuffer, size: u32) -> OpsResult<PixelBuffer> {
    bin_with(src, size, &CancelToken::new())
}

pub(crate) fn bin_with(src: &PixelBuffer, size: u32, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    if size == 0 {
        return Err(OpsError::param("bin size must be >= 1"));
    }
    let (w, h) = src.dimensions();
    let (ow, oh) = (w / size, h / size);
    trace!(width = w, height = h, size, out_width = ow, out_height = oh, "bin");

    build_buffer(ow, oh, cancel, |oy, row| {
        let oy = oy as u32;
        for ox in 0..ow {
            let mut sums = [0u64; 3];
            let mut count = 0u64;
            for by in 0..size {
                for bx in 0..size {
                    let (sx, sy) = (ox * size + bx, oy * size + by);
                    if sx < w && sy < h {
                        let px = src.pixel_unchecked(sx, sy);
                        sums[0] += px[0] as u64;
                        sums[1] += px[1] as u64;
                        sums[2] += px[2] as u64;
                        count += 1;
                    }
                }
            }

            let o = ox as usize * CHANNELS;
            for c in 0..3 {
                row[o + c] = clamp_u8(sums[c] as f64 / count.max(1) as f64);
            }
            row[o + 3] = 255;
        }
    })
}

/// Crops the `width x height` rectangle whose top-left corner is `(x, y)`.
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] if the rectangle is empty or does not
/// lie entirely inside the buffer.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::transform::crop;
///
/// let src = PixelBuffer::from_fn(6, 4, |x, y| [x as u8, y as u8, 0, 255]);
/// let out = crop(&src, 2, 1, 3, 2).unwrap();
/// assert_eq!(out.dimensions(), (3, 2));
/// assert_eq!(out.pixel(0, 0).unwrap(), [2, 1, 0, 255]);
/// assert!(crop(&src, 4, 0, 3, 1).is_err());
/// ```
pub fn crop(src: &PixelBuffer, x: u32, y: u32, width: u32, height: u32) -> OpsResult<PixelBuffer> {
    crop_with(src, x, y, width, height, &CancelToken::new())
}

pub(crate) fn crop_with(
    src: &PixelBuffer,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let (w, h) = src.dimensions();
    let fits = |origin: u32, len: u32, limit: u32| origin.checked_add(len).is_some_and(|end| end <= limit);
    if width == 0 || height == 0 || !fits(x, width, w) || !fits(y, height, h) {
        return Err(OpsError::InvalidDimensions(format!(
            "crop region {width}x{height} at ({x},{y}) exceeds {w}x{h}"
        )));
    }
    trace!(x, y, width, height, "crop");

    let row_len = src.row_len();
    let (start, len) = (x as usize * CHANNELS, width as usize * CHANNELS);
    let data = src.data();
    build_buffer(width, height, cancel, |dy, row| {
        let base = (y as usize + dy) * row_len + start;
        row.copy_from_slice(&data[base..base + len]);
    })
}

/// Resampling filter for [`resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Nearest neighbor, no interpolation.
    #[default]
    Nearest,
    /// Bilinear interpolation between the four closest pixels.
    Bilinear,
}

/// Largest side accepted by [`resize`].
pub const MAX_RESIZE_SIDE: u32 = 1 << 15;

/// Resamples the buffer to `width x height`. All four channels are
/// resampled, alpha included.
///
/// Destination pixel centers are mapped back onto source pixel centers, so
/// an integer upscale with [`ResizeFilter::Nearest`] replicates pixels.
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] if the source is empty or the target has
/// a zero side or a side above [`MAX_RESIZE_SIDE`].
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::transform::{resize, ResizeFilter};
///
/// let src = PixelBuffer::from_fn(2, 1, |x, _| [x as u8 * 100, 0, 0, 255]);
/// let out = resize(&src, 4, 2, ResizeFilter::Nearest).unwrap();
/// let row: Vec<u8> = out.pixels().take(4).map(|p| p[0]).collect();
/// assert_eq!(row, vec![0, 0, 100, 100]);
/// ```
pub fn resize(src: &PixelBuffer, width: u32, height: u32, filter: ResizeFilter) -> OpsResult<PixelBuffer> {
    resize_with(src, width, height, filter, &CancelToken::new())
}

pub(crate) fn resize_with(
    src: &PixelBuffer,
    width: u32,
    height: u32,
    filter: ResizeFilter,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if src.is_empty() {
        return Err(OpsError::InvalidDimensions("cannot resize an empty buffer".into()));
    }
    let side_ok = |v: u32| (1..=MAX_RESIZE_SIDE).contains(&v);
    if !side_ok(width) || !side_ok(height) {
        return Err(OpsError::InvalidDimensions(format!(
            "target size {width}x{height} must have sides within 1..={MAX_RESIZE_SIDE}"
        )));
    }
    let (w, h) = src.dimensions();
    trace!(width = w, height = h, out_width = width, out_height = height, ?filter, "resize");

    let sx = w as f64 / width as f64;
    let sy = h as f64 / height as f64;

    build_buffer(width, height, cancel, |dy, row| {
        let cy = (dy as f64 + 0.5) * sy;
        for dx in 0..width as usize {
            let cx = (dx as f64 + 0.5) * sx;
            let px = match filter {
                ResizeFilter::Nearest => {
                    let x = (cx.floor() as u32).min(w - 1);
                    let y = (cy.floor() as u32).min(h - 1);
                    src.pixel_unchecked(x, y)
                }
                ResizeFilter::Bilinear => bilinear(src, cx - 0.5, cy - 0.5),
            };
            let o = dx * CHANNELS;
            row[o..o + CHANNELS].copy_from_slice(&px);
        }
    })
}

/// Bilinear sample at fractional source coordinates, edge-clamped.
fn bilinear(src: &PixelBuffer, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = src.dimensions();
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let p00 = src.pixel_unchecked(x0, y0);
    let p10 = src.pixel_unchecked(x1, y0);
    let p01 = src.pixel_unchecked(x0, y1);
    let p11 = src.pixel_unchecked(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..CHANNELS {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = clamp_u8(top * (1.0 - fy) + bottom * fy);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| [x as u8, y as u8, (x * y) as u8, 200])
    }

    #[test]
    fn test_rotate_90_mapping() {
        let src = labeled(3, 2);
        let out = rotate(&src, Rotation::Deg90).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                // (x, y) lands at (h-1-y, x)
                assert_eq!(out.pixel(1 - y, x).unwrap(), src.pixel(x, y).unwrap());
            }
        }
    }

    #[test]
    fn test_rotate_270_mapping() {
        let src = labeled(3, 2);
        let out = rotate(&src, Rotation::Deg270).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.pixel(y, 2 - x).unwrap(), src.pixel(x, y).unwrap());
            }
        }
    }

    #[test]
    fn test_rotate_180_mapping() {
        let src = labeled(4, 3);
        let out = rotate(&src, Rotation::Deg180).unwrap();
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.pixel(0, 0).unwrap(), src.pixel(3, 2).unwrap());
        assert_eq!(out.pixel(3, 0).unwrap(), src.pixel(0, 2).unwrap());
    }

    #[test]
    fn test_rotate_inverse() {
        let src = labeled(5, 3);
        for r in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let back = rotate(&rotate(&src, r).unwrap(), r.inverse()).unwrap();
            assert_eq!(back, src);
        }
    }

    #[test]
    fn test_rotation_serde() {
        let r: Rotation = serde_yaml::from_str("180").unwrap();
        assert_eq!(r, Rotation::Deg180);
        assert!(serde_yaml::from_str::<Rotation>("45").is_err());
        assert_eq!(serde_yaml::to_string(&Rotation::Deg270).unwrap().trim(), "270");
    }

    #[test]
    fn test_mirror() {
        let src = labeled(3, 2);
        let h = mirror(&src, Mirror::Horizontal).unwrap();
        assert_eq!(h.pixel(0, 1).unwrap(), src.pixel(2, 1).unwrap());
        let v = mirror(&src, Mirror::Vertical).unwrap();
        assert_eq!(v.pixel(2, 0).unwrap(), src.pixel(2, 1).unwrap());
    }

    #[test]
    fn test_empty_buffers() {
        let src = PixelBuffer::new(0, 3);
        let out = rotate(&src, Rotation::Deg90).unwrap();
        assert_eq!(out.dimensions(), (3, 0));
        assert!(mirror(&src, Mirror::Vertical).unwrap().is_empty());
    }

    #[test]
    fn test_bin_blocks() {
        let src = PixelBuffer::from_fn(4, 4, |x, y| [(x + 4 * y) as u8, 10, 0, 7]);
        let out = bin(&src, 2).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        // block (0,0) holds 0, 1, 4, 5
        assert_eq!(out.pixel(0, 0).unwrap(), [2, 10, 0, 255]);
        // block (1,1) holds 10, 11, 14, 15 -> 12.5 rounds to even
        assert_eq!(out.pixel(1, 1).unwrap(), [12, 10, 0, 255]);
    }

    #[test]
    fn test_bin_edge_cases() {
        let src = labeled(3, 3);
        assert!(bin(&src, 0).is_err());
        let same = bin(&src, 1).unwrap();
        assert!(same.pixels().zip(src.pixels()).all(|(a, b)| a[..3] == b[..3] && a[3] == 255));
        assert_eq!(bin(&src, 4).unwrap().dimensions(), (0, 0));
    }

    #[test]
    fn test_crop() {
        let src = labeled(5, 4);
        let out = crop(&src, 1, 2, 4, 2).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y).unwrap(), src.pixel(x + 1, y + 2).unwrap());
            }
        }
        assert_eq!(crop(&src, 0, 0, 5, 4).unwrap(), src);
    }

    #[test]
    fn test_crop_rejects_outside() {
        let src = labeled(5, 4);
        for (x, y, w, h) in [(0, 0, 0, 1), (0, 0, 6, 1), (4, 3, 2, 1), (1, 1, u32::MAX, 1), (u32::MAX, 0, 1, 1)] {
            let err = crop(&src, x, y, w, h).unwrap_err();
            assert!(matches!(err, OpsError::InvalidDimensions(_)), "{x},{y} {w}x{h}");
        }
    }

    #[test]
    fn test_resize_nearest() {
        let src = labeled(4, 4);
        let down = resize(&src, 2, 2, ResizeFilter::Nearest).unwrap();
        // pixel centers 0.5 * 2 = 1 and 1.5 * 2 = 3
        assert_eq!(down.pixel(0, 0).unwrap(), src.pixel(1, 1).unwrap());
        assert_eq!(down.pixel(1, 1).unwrap(), src.pixel(3, 3).unwrap());
        assert_eq!(resize(&src, 4, 4, ResizeFilter::Nearest).unwrap(), src);
    }

    #[test]
    fn test_resize_bilinear() {
        let src = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0, 0] } else { [200, 100, 40, 255] });
        let out = resize(&src, 4, 1, ResizeFilter::Bilinear).unwrap();
        let reds: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        // source x = -0.25, 0.25, 0.75, 1.25 clamped to [0, 1]
        assert_eq!(reds, vec![0, 50, 150, 200]);
        assert_eq!(out.pixel(1, 0).unwrap()[3], 64);

        let flat = PixelBuffer::filled(3, 3, [9, 8, 7, 6]);
        let up = resize(&flat, 7, 5, ResizeFilter::Bilinear).unwrap();
        assert!(up.pixels().all(|p| p == [9, 8, 7, 6]));
    }

    #[test]
    fn test_resize_validation() {
        let src = labeled(3, 3);
        assert!(resize(&src, 0, 3, ResizeFilter::Nearest).is_err());
        assert!(resize(&src, 3, MAX_RESIZE_SIDE + 1, ResizeFilter::Bilinear).is_err());
        assert!(resize(&PixelBuffer::new(0, 2), 3, 3, ResizeFilter::Nearest).is_err());
    }

    #[test]
    fn test_resize_filter_serde() {
        let f: ResizeFilter = serde_yaml::from_str("bilinear").unwrap();
        assert_eq!(f, ResizeFilter::Bilinear);
    }
}
