//! Frequency-domain operations.
//!
//! 1D and separable 2D discrete Fourier transforms (via `rustfft`),
//! radial frequency masks and spectrum visualization.
//!
//! # Operations
//!
//! - [`fft1d`] / [`ifft1d`] - Complex DFT of a real signal and its inverse
//! - [`fft2d`] / [`ifft2d`] - Row pass then column pass over one channel
//! - [`apply_frequency_filter`] - Scales each coefficient by a radial response
//! - [`fft_shift`] - Quadrant swap that centers the DC term
//! - [`fft_to_image`] - Log-compressed magnitude as a gray buffer
//! - [`filter_image`] / [`spectrum_image`] - Buffer-to-buffer conveniences
//!
//! # Scaling
//!
//! Forward transforms are unnormalized; inverse transforms divide by the
//! number of samples, so `ifft(fft(x)) == x` up to rounding.
//!
//! # Radius Convention
//!
//! Filter radii are measured from `(w/2, h/2)` of the **unshifted**
//! coefficient layout, where the DC term sits at `(0, 0)`.
//!
//! # Example
//!
//! ```rust
//! use xray_ops::fft::{fft1d, ifft1d};
//!
//! let freq = fft1d(&[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(freq.real[0], 10.0);
//!
//! let back = ifft1d(&freq.real, &freq.imaginary).unwrap();
//! for (a, b) in back.iter().zip([1.0, 2.0, 3.0, 4.0]) {
//!     assert!((a - b).abs() < 1e-12);
//! }
//! ```

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use xray_core::{clamp_u8, Channel, PixelBuffer, CHANNELS};

use crate::rows::{for_each_row, transpose};
use crate::{CancelToken, OpsError, OpsResult};

/// Complex spectrum with derived magnitude and phase.
///
/// All four planes are row-major with `width * height` entries. A 1D
/// spectrum has `height == 1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FftResult {
    /// Coefficients per row
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Real parts
    pub real: Vec<f64>,
    /// Imaginary parts
    pub imaginary: Vec<f64>,
    /// `sqrt(re² + im²)`
    pub magnitude: Vec<f64>,
    /// `atan2(im, re)`
    pub phase: Vec<f64>,
}

impl FftResult {
    fn from_complex(width: usize, height: usize, data: &[Complex<f64>]) -> Self {
        let mut out = Self {
            width,
            height,
            real: Vec::with_capacity(data.len()),
            imaginary: Vec::with_capacity(data.len()),
            magnitude: Vec::with_capacity(data.len()),
            phase: Vec::with_capacity(data.len()),
        };
        for c in data {
            out.real.push(c.re);
            out.imaginary.push(c.im);
            out.magnitude.push((c.re * c.re + c.im * c.im).sqrt());
            out.phase.push(c.im.atan2(c.re));
        }
        out
    }

    fn to_complex(&self) -> OpsResult<Vec<Complex<f64>>> {
        let n = self.width * self.height;
        if self.real.len() != n || self.imaginary.len() != n {
            return Err(OpsError::InvalidDimensions(format!(
                "spectrum {}x{} needs {} coefficients, got {} real / {} imaginary",
                self.width,
                self.height,
                n,
                self.real.len(),
                self.imaginary.len()
            )));
        }
        Ok(self
            .real
            .iter()
            .zip(&self.imaginary)
            .map(|(&re, &im)| Complex::new(re, im))
            .collect())
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// Returns `true` if the spectrum holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }
}

/// Forward DFT of a real signal.
pub fn fft1d(data: &[f64]) -> FftResult {
    trace!(len = data.len(), "fft1d");
    let mut buf: Vec<Complex<f64>> = data.iter().map(|&v| Complex::new(v, 0.0)).collect();
    if !buf.is_empty() {
        FftPlanner::new().plan_fft_forward(buf.len()).process(&mut buf);
    }
    FftResult::from_complex(buf.len(), 1, &buf)
}

/// Inverse DFT, returning the real part of the reconstructed signal.
///
/// # Errors
///
/// Fails if `real` and `imaginary` differ in length.
pub fn ifft1d(real: &[f64], imaginary: &[f64]) -> OpsResult<Vec<f64>> {
    if real.len() != imaginary.len() {
        return Err(OpsError::InvalidDimensions(format!(
            "real ({}) and imaginary ({}) lengths differ",
            real.len(),
            imaginary.len()
        )));
    }
    trace!(len = real.len(), "ifft1d");
    let n = real.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut buf: Vec<Complex<f64>> = real
        .iter()
        .zip(imaginary)
        .map(|(&re, &im)| Complex::new(re, im))
        .collect();
    FftPlanner::new().plan_fft_inverse(n).process(&mut buf);
    let scale = 1.0 / n as f64;
    Ok(buf.iter().map(|c| c.re * scale).collect())
}

/// Transforms every `len`-long row of `data` in place.
fn fft_rows(
    planner: &mut FftPlanner<f64>,
    data: &mut [Complex<f64>],
    len: usize,
    inverse: bool,
    cancel: &CancelToken,
) -> OpsResult<()> {
    let fft = if inverse {
        planner.plan_fft_inverse(len)
    } else {
        planner.plan_fft_forward(len)
    };
    for_each_row(data, len, cancel, |_, row| fft.process(row))
}

/// Separable 2D transform: rows then columns forward, columns then rows inverse.
///
/// Columns are processed as rows of the transposed plane.
fn fft2d_complex(
    mut data: Vec<Complex<f64>>,
    width: usize,
    height: usize,
    inverse: bool,
    cancel: &CancelToken,
) -> OpsResult<Vec<Complex<f64>>> {
    if data.is_empty() {
        return Ok(data);
    }
    let mut planner = FftPlanner::new();
    if inverse {
        let mut cols = transpose(&data, width, height);
        fft_rows(&mut planner, &mut cols, height, true, cancel)?;
        data = transpose(&cols, height, width);
        fft_rows(&mut planner, &mut data, width, true, cancel)?;
        Ok(data)
    } else {
        fft_rows(&mut planner, &mut data, width, false, cancel)?;
        let mut cols = transpose(&data, width, height);
        fft_rows(&mut planner, &mut cols, height, false, cancel)?;
        Ok(transpose(&cols, height, width))
    }
}

/// 2D DFT of one channel of the buffer.
///
/// `Channel::Gray` uses the exact RGB mean.
///
/// ```rust
/// use xray_core::{Channel, PixelBuffer};
/// use xray_ops::fft::fft2d;
///
/// let src = PixelBuffer::filled(4, 4, [100, 100, 100, 255]);
/// let freq = fft2d(&src, Channel::Gray).unwrap();
/// assert_eq!(freq.real[0], 1600.0);
/// assert!(freq.magnitude[1..].iter().all(|m| m.abs() < 1e-9));
/// ```
pub fn fft2d(src: &PixelBuffer, channel: Channel) -> OpsResult<FftResult> {
    fft2d_with(src, channel, &CancelToken::new())
}

/// [`fft2d`] that polls `cancel` between rows and columns.
pub fn fft2d_with(src: &PixelBuffer, channel: Channel, cancel: &CancelToken) -> OpsResult<FftResult> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    trace!(width = w, height = h, %channel, "fft2d");
    let data: Vec<Complex<f64>> = src
        .pixels()
        .map(|p| Complex::new(channel.intensity(p), 0.0))
        .collect();
    let out = fft2d_complex(data, w, h, false, cancel)?;
    Ok(FftResult::from_complex(w, h, &out))
}

/// Inverse 2D DFT, keeping the real part of the final pass.
///
/// # Errors
///
/// Fails if the planes do not match `width * height`.
pub fn ifft2d(spectrum: &FftResult) -> OpsResult<Vec<f64>> {
    ifft2d_with(spectrum, &CancelToken::new())
}

/// [`ifft2d`] that polls `cancel` between rows and columns.
pub fn ifft2d_with(spectrum: &FftResult, cancel: &CancelToken) -> OpsResult<Vec<f64>> {
    trace!(width = spectrum.width, height = spectrum.height, "ifft2d");
    let data = spectrum.to_complex()?;
    let n = data.len();
    let out = fft2d_complex(data, spectrum.width, spectrum.height, true, cancel)?;
    let scale = 1.0 / n.max(1) as f64;
    Ok(out.iter().map(|c| c.re * scale).collect())
}

/// Radial frequency mask.
///
/// Serialized with a `kind` tag:
///
/// ```rust
/// use xray_ops::fft::FrequencyFilter;
///
/// let f: FrequencyFilter = serde_yaml::from_str("kind: band_pass\nlow: 2\nhigh: 8").unwrap();
/// assert_eq!(f, FrequencyFilter::BandPass { low: 2.0, high: 8.0 });
/// assert_eq!(f.response(5.0, 16, 16), 1.0);
/// assert_eq!(f.response(9.0, 16, 16), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyFilter {
    /// 1 for `radius <= cutoff`, else 0.
    LowPass {
        /// Largest radius kept
        cutoff: f64,
    },
    /// 1 for `radius >= cutoff`, else 0.
    HighPass {
        /// Smallest radius kept
        cutoff: f64,
    },
    /// 1 for `low <= radius <= high`, else 0.
    BandPass {
        /// Inner radius
        low: f64,
        /// Outer radius
        high: f64,
    },
    /// `exp(-radius² / 2σ²)`.
    Gaussian {
        /// Falloff in coefficient units
        sigma: f64,
    },
}

impl FrequencyFilter {
    /// Multiplier for a coefficient at `radius` in a `width x height` spectrum.
    ///
    /// The dimensions are accepted so custom responses can scale with the
    /// spectrum size; the built-in masks ignore them.
    pub fn response(&self, radius: f64, _width: usize, _height: usize) -> f64 {
        let pass = match *self {
            Self::LowPass { cutoff } => radius <= cutoff,
            Self::HighPass { cutoff } => radius >= cutoff,
            Self::BandPass { low, high } => radius >= low && radius <= high,
            Self::Gaussian { sigma } => {
                return (-(radius * radius) / (2.0 * sigma * sigma)).exp();
            }
        };
        if pass { 1.0 } else { 0.0 }
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Cutoffs must be finite and non-negative, `low <= high`, `sigma > 0`.
    pub fn validate(&self) -> OpsResult<()> {
        let ok = match *self {
            Self::LowPass { cutoff } | Self::HighPass { cutoff } => {
                cutoff.is_finite() && cutoff >= 0.0
            }
            Self::BandPass { low, high } => {
                low.is_finite() && high.is_finite() && low >= 0.0 && low <= high
            }
            Self::Gaussian { sigma } => sigma.is_finite() && sigma > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(OpsError::param(format!("invalid frequency filter {self:?}")))
        }
    }
}

/// Scales each coefficient by `response(radius, width, height)`.
///
/// `radius` is the distance of `(x, y)` from `(width/2, height/2)`.
/// Magnitude and phase are recomputed from the scaled parts.
pub fn apply_frequency_filter<F>(spectrum: &FftResult, response: F) -> OpsResult<FftResult>
where
    F: Fn(f64, usize, usize) -> f64,
{
    let (w, h) = (spectrum.width, spectrum.height);
    let mut data = spectrum.to_complex()?;
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    for y in 0..h {
        for x in 0..w {
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let k = response((dx * dx + dy * dy).sqrt(), w, h);
            data[y * w + x] *= k;
        }
    }
    Ok(FftResult::from_complex(w, h, &data))
}

/// Swaps quadrants so the DC term moves to `(floor(w/2), floor(h/2))`.
///
/// ```rust
/// use xray_ops::fft::fft_shift;
///
/// let plane = [1, 2, 3, 4];
/// assert_eq!(fft_shift(&plane, 2, 2), vec![4, 3, 2, 1]);
/// ```
pub fn fft_shift<T: Copy + Default>(data: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = vec![T::default(); data.len()];
    let (hw, hh) = (width / 2, height / 2);
    for y in 0..height {
        for x in 0..width {
            let nx = (x + hw) % width;
            let ny = (y + hh) % height;
            out[ny * width + nx] = data[y * width + x];
        }
    }
    out
}

/// Gray visualization of a magnitude plane.
///
/// Values are compressed with `ln(1 + m)` and scaled so the largest maps to
/// 255. An all-zero plane gives a black image. Alpha is 255.
///
/// # Errors
///
/// Fails if `magnitude.len() != width * height`.
pub fn fft_to_image(magnitude: &[f64], width: u32, height: u32) -> OpsResult<PixelBuffer> {
    let n = width as usize * height as usize;
    if magnitude.len() != n {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} magnitudes for {}x{}, got {}",
            n,
            width,
            height,
            magnitude.len()
        )));
    }
    let log: Vec<f64> = magnitude.iter().map(|m| m.ln_1p()).collect();
    let max = log.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut data = Vec::with_capacity(n * 4);
    if max.is_finite() && max > 0.0 {
        for m in &log {
            let v = clamp_u8(m / max * 255.0);
            data.extend_from_slice(&[v, v, v, 255]);
        }
    } else {
        if n > 0 {
            debug!(width, height, "flat spectrum, rendering black");
        }
        for _ in 0..n {
            data.extend_from_slice(&[0, 0, 0, 255]);
        }
    }
    Ok(PixelBuffer::from_data(width, height, data)?)
}

/// Filters one channel in the frequency domain.
///
/// Runs [`fft2d`], scales by `filter`, runs [`ifft2d`] and writes the
/// saturated result to R, G and B. Alpha is copied from the source.
pub fn filter_image(
    src: &PixelBuffer,
    channel: Channel,
    filter: &FrequencyFilter,
) -> OpsResult<PixelBuffer> {
    filter_image_with(src, channel, filter, &CancelToken::new())
}

pub(crate) fn filter_image_with(
    src: &PixelBuffer,
    channel: Channel,
    filter: &FrequencyFilter,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    filter.validate()?;
    debug!(?filter, %channel, "frequency filter");

    let spectrum = fft2d_with(src, channel, cancel)?;
    let filtered = apply_frequency_filter(&spectrum, |r, w, h| filter.response(r, w, h))?;
    let values = ifft2d_with(&filtered, cancel)?;

    let mut data = src.data().to_vec();
    for (px, &v) in data.chunks_exact_mut(CHANNELS).zip(&values) {
        let v = clamp_u8(v);
        px[..3].fill(v);
    }
    Ok(PixelBuffer::from_data(src.width(), src.height(), data)?)
}

/// Centered log-magnitude spectrum of one channel.
pub fn spectrum_image(src: &PixelBuffer, channel: Channel) -> OpsResult<PixelBuffer> {
    let spectrum = fft2d(src, channel)?;
    let shifted = fft_shift(&spectrum.magnitude, spectrum.width, spectrum.height);
    fft_to_image(&shifted, src.width(), src.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pattern(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| {
            let v = ((x * 37 + y * 91) % 256) as u8;
            [v, v, v, 255]
        })
    }

    #[test]
    fn test_fft1d_known_values() {
        let r = fft1d(&[1.0, 2.0, 3.0, 4.0]);
        let re = [10.0, -2.0, -2.0, -2.0];
        let im = [0.0, 2.0, 0.0, -2.0];
        for i in 0..4 {
            assert_abs_diff_eq!(r.real[i], re[i], epsilon = 1e-12);
            assert_abs_diff_eq!(r.imaginary[i], im[i], epsilon = 1e-12);
            assert_abs_diff_eq!(
                r.magnitude[i],
                (re[i] * re[i] + im[i] * im[i]).sqrt(),
                epsilon = 1e-12
            );
        }
        assert_abs_diff_eq!(r.phase[1], std::f64::consts::FRAC_PI_4 * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fft1d_non_power_of_two() {
        let data = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0];
        let r = fft1d(&data);
        let back = ifft1d(&r.real, &r.imaginary).unwrap();
        for (a, b) in back.iter().zip(data) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fft1d_empty_and_mismatch() {
        assert!(fft1d(&[]).is_empty());
        assert!(ifft1d(&[], &[]).unwrap().is_empty());
        assert!(ifft1d(&[1.0, 2.0], &[0.0]).is_err());
    }

    #[test]
    fn test_fft2d_roundtrip() {
        let src = pattern(6, 5);
        let freq = fft2d(&src, Channel::Red).unwrap();
        assert_eq!((freq.width, freq.height), (6, 5));
        let back = ifft2d(&freq).unwrap();
        for (v, p) in back.iter().zip(src.pixels()) {
            assert_abs_diff_eq!(*v, p[0] as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fft2d_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let r = fft2d_with(&pattern(8, 8), Channel::Gray, &token);
        assert!(matches!(r, Err(OpsError::Cancelled)));
    }

    #[test]
    fn test_ifft2d_rejects_bad_planes() {
        let mut freq = fft2d(&pattern(4, 4), Channel::Gray).unwrap();
        freq.imaginary.pop();
        assert!(ifft2d(&freq).is_err());
    }

    #[test]
    fn test_filter_responses() {
        let lp = FrequencyFilter::LowPass { cutoff: 3.0 };
        assert_eq!(lp.response(3.0, 8, 8), 1.0);
        assert_eq!(lp.response(3.1, 8, 8), 0.0);
        let hp = FrequencyFilter::HighPass { cutoff: 3.0 };
        assert_eq!(hp.response(3.0, 8, 8), 1.0);
        assert_eq!(hp.response(2.9, 8, 8), 0.0);
        let g = FrequencyFilter::Gaussian { sigma: 2.0 };
        assert_eq!(g.response(0.0, 8, 8), 1.0);
        assert_abs_diff_eq!(g.response(2.0, 8, 8), (-0.5f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_filter_validation() {
        assert!(FrequencyFilter::LowPass { cutoff: -1.0 }.validate().is_err());
        assert!(FrequencyFilter::BandPass { low: 5.0, high: 2.0 }.validate().is_err());
        assert!(FrequencyFilter::Gaussian { sigma: 0.0 }.validate().is_err());
        assert!(FrequencyFilter::HighPass { cutoff: 0.0 }.validate().is_ok());
    }

    #[test]
    fn test_apply_filter_recomputes_magnitude() {
        let freq = fft2d(&pattern(4, 4), Channel::Gray).unwrap();
        let half = apply_frequency_filter(&freq, |_, _, _| 0.5).unwrap();
        for i in 0..freq.len() {
            assert_abs_diff_eq!(half.magnitude[i], freq.magnitude[i] * 0.5, epsilon = 1e-9);
            assert_abs_diff_eq!(half.real[i], freq.real[i] * 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_all_pass_filter_is_identity() {
        let src = pattern(8, 6);
        let out = filter_image(&src, Channel::Gray, &FrequencyFilter::HighPass { cutoff: 0.0 }).unwrap();
        assert_eq!(out, src);
        let out = filter_image(&src, Channel::Gray, &FrequencyFilter::LowPass { cutoff: 1e6 }).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_radius_from_unshifted_center() {
        // DC sits at (0,0), sqrt(8) away from the center of a 4x4 plane
        let src = PixelBuffer::filled(4, 4, [80, 80, 80, 255]);
        let out = filter_image(&src, Channel::Gray, &FrequencyFilter::LowPass { cutoff: 1.0 }).unwrap();
        assert!(out.pixels().all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_fft_shift_odd() {
        let plane = [0, 1, 2, 3, 4, 5, 6, 7, 8];
        // 3x3: half = 1, element (0,0) moves to (1,1)
        let s = fft_shift(&plane, 3, 3);
        assert_eq!(s[4], 0);
        assert_eq!(s, vec![8, 6, 7, 2, 0, 1, 5, 3, 4]);
    }

    #[test]
    fn test_fft_to_image() {
        let img = fft_to_image(&[0.0, (1f64).exp_m1(), 0.0, 0.0], 2, 2).unwrap();
        assert_eq!(img.pixel(1, 0).unwrap(), [255, 255, 255, 255]);
        assert_eq!(img.pixel(0, 0).unwrap(), [0, 0, 0, 255]);

        let flat = fft_to_image(&[0.0; 4], 2, 2).unwrap();
        assert!(flat.pixels().all(|p| p == [0, 0, 0, 255]));
        assert!(fft_to_image(&[1.0; 3], 2, 2).is_err());
    }

    #[test]
    fn test_spectrum_image_centers_dc() {
        let src = PixelBuffer::filled(4, 4, [50, 50, 50, 255]);
        let img = spectrum_image(&src, Channel::Gray).unwrap();
        assert_eq!(img.pixel(2, 2).unwrap(), [255, 255, 255, 255]);
        assert_eq!(img.pixel(0, 0).unwrap(), [0, 0, 0, 255]);
    }
}
