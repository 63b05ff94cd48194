//! Spatial filtering and convolution operations.
//!
//! Every neighborhood operation samples with **edge clamping**: a
//! coordinate outside the buffer reads the nearest border pixel instead of
//! zero or a wrapped pixel. Border output values depend on this.
//!
//! # Operations
//!
//! - [`convolve`] - Generic square-kernel convolution on R, G, B
//! - [`gaussian`] - Gaussian blur, kernel size `ceil(3σ)·2+1`
//! - [`mean`] - Uniform box blur
//! - [`median`] - Per-channel neighborhood median
//! - [`sobel`] - Gradient magnitude edge detection
//! - [`laplacian`] - Second-derivative edge detection
//! - [`unsharp_mask`] - Sharpening via `orig + amount·(orig - blur)`
//! - [`variance`] - Local standard deviation of the gray intensity
//! - [`erode`] / [`dilate`] - Grayscale morphology with a square element
//!
//! # Example
//!
//! ```rust
//! use xray_core::PixelBuffer;
//! use xray_ops::filter::{convolve, gaussian, Kernel};
//!
//! let src = PixelBuffer::filled(16, 16, [100, 100, 100, 255]);
//! let blurred = gaussian(&src, 1.0).unwrap();
//! assert_eq!(blurred.pixel(8, 8).unwrap(), [100, 100, 100, 255]);
//!
//! let boxed = convolve(&src, &Kernel::uniform(3).unwrap()).unwrap();
//! assert_eq!(boxed.dimensions(), (16, 16));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use xray_core::{clamp_u8, gray_mean, gray_truncated, PixelBuffer, CHANNELS};
use xray_math::stats;

use crate::rows::fill_buffer;
use crate::{CancelToken, OpsError, OpsResult};

/// Square convolution kernel with an odd side length.
///
/// Weights are stored row-major. Blur kernels are normalized to sum to 1;
/// derivative kernels ([`Kernel::sobel_x`], [`Kernel::laplacian`]) are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKernel", into = "RawKernel")]
pub struct Kernel {
    data: Vec<f64>,
    size: usize,
}

#[derive(Serialize, Deserialize)]
struct RawKernel {
    size: usize,
    weights: Vec<f64>,
}

impl TryFrom<RawKernel> for Kernel {
    type Error = OpsError;

    fn try_from(raw: RawKernel) -> OpsResult<Self> {
        Kernel::new(raw.weights, raw.size)
    }
}

impl From<Kernel> for RawKernel {
    fn from(k: Kernel) -> Self {
        Self {
            size: k.size,
            weights: k.data,
        }
    }
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Fails if `size` is even or zero, or `data.len() != size²`.
    pub fn new(data: Vec<f64>, size: usize) -> OpsResult<Self> {
        if size % 2 == 0 {
            return Err(OpsError::param(format!("kernel size must be odd, got {size}")));
        }
        if size.checked_mul(size) != Some(data.len()) {
            return Err(OpsError::param(format!(
                "kernel data size {} doesn't match {}x{}",
                data.len(),
                size,
                size
            )));
        }
        Ok(Self { data, size })
    }

    /// Uniform averaging kernel, every weight `1/size²`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use xray_ops::filter::Kernel;
    ///
    /// let k = Kernel::uniform(3).unwrap();
    /// assert_eq!(k.size(), 3);
    /// assert!((k.weights().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    /// assert!(Kernel::uniform(4).is_err());
    /// ```
    pub fn uniform(size: usize) -> OpsResult<Self> {
        validate_kernel_size(size)?;
        let w = 1.0 / (size * size) as f64;
        Ok(Self {
            data: vec![w; size * size],
            size,
        })
    }

    /// Normalized Gaussian kernel with side `ceil(3σ)·2 + 1`.
    ///
    /// Weights are `exp(-(dx² + dy²) / 2σ²)` divided by their sum. Sigmas
    /// whose kernel would exceed [`MAX_KERNEL_SIZE`] are rejected.
    ///
    /// ```rust
    /// use xray_ops::filter::Kernel;
    ///
    /// let k = Kernel::gaussian(1.0).unwrap();
    /// assert_eq!(k.size(), 7);
    /// let k = Kernel::gaussian(0.4).unwrap();
    /// assert_eq!(k.size(), 5);
    /// ```
    pub fn gaussian(sigma: f64) -> OpsResult<Self> {
        validate_sigma(sigma)?;
        let radius = (sigma * 3.0).ceil();
        if radius > (MAX_KERNEL_SIZE / 2) as f64 {
            return Err(OpsError::param(format!(
                "sigma {sigma} needs a kernel wider than {MAX_KERNEL_SIZE}"
            )));
        }
        let size = radius as usize * 2 + 1;
        let half = (size / 2) as i64;
        let sigma2 = 2.0 * sigma * sigma;

        let mut data = Vec::with_capacity(size * size);
        for dy in -half..=half {
            for dx in -half..=half {
                let d = (dx * dx + dy * dy) as f64;
                data.push((-d / sigma2).exp());
            }
        }

        let sum: f64 = data.iter().sum();
        for w in &mut data {
            *w /= sum;
        }

        Ok(Self { data, size })
    }

    /// Horizontal Sobel derivative.
    pub fn sobel_x() -> Self {
        Self {
            data: vec![
                -1.0, 0.0, 1.0,
                -2.0, 0.0, 2.0,
                -1.0, 0.0, 1.0,
            ],
            size: 3,
        }
    }

    /// Vertical Sobel derivative.
    pub fn sobel_y() -> Self {
        Self {
            data: vec![
                -1.0, -2.0, -1.0,
                0.0, 0.0, 0.0,
                1.0, 2.0, 1.0,
            ],
            size: 3,
        }
    }

    /// 4-neighbor Laplacian.
    pub fn laplacian() -> Self {
        Self {
            data: vec![
                0.0, 1.0, 0.0,
                1.0, -4.0, 1.0,
                0.0, 1.0, 0.0,
            ],
            size: 3,
        }
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half side length.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Row-major weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.data
    }

    /// Weight at column `kx`, row `ky`.
    #[inline]
    pub fn weight(&self, kx: usize, ky: usize) -> f64 {
        self.data[ky * self.size + kx]
    }
}

/// Largest kernel side accepted by the neighborhood filters.
pub const MAX_KERNEL_SIZE: usize = 1023;

/// Rejects kernel sizes that are even, smaller than 3 or larger than
/// [`MAX_KERNEL_SIZE`].
pub fn validate_kernel_size(size: usize) -> OpsResult<()> {
    if size < 3 || size % 2 == 0 {
        return Err(OpsError::param(format!(
            "kernel size must be odd and >= 3, got {size}"
        )));
    }
    if size > MAX_KERNEL_SIZE {
        return Err(OpsError::param(format!(
            "kernel size {size} exceeds {MAX_KERNEL_SIZE}"
        )));
    }
    Ok(())
}

/// Rejects non-positive or non-finite sigma.
pub fn validate_sigma(sigma: f64) -> OpsResult<()> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(OpsError::param(format!("sigma must be > 0, got {sigma}")));
    }
    Ok(())
}

/// Applies a convolution kernel to R, G and B; alpha is copied.
///
/// Neighborhood reads are edge-clamped and each channel sum is saturated to
/// `[0, 255]`.
///
/// # Example
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::filter::{convolve, Kernel};
///
/// // identity kernel
/// let mut w = vec![0.0; 9];
/// w[4] = 1.0;
/// let k = Kernel::new(w, 3).unwrap();
///
/// let src = PixelBuffer::from_fn(4, 4, |x, y| [x as u8, y as u8, 7, 200]);
/// assert_eq!(convolve(&src, &k).unwrap(), src);
/// ```
pub fn convolve(src: &PixelBuffer, kernel: &Kernel) -> OpsResult<PixelBuffer> {
    convolve_with(src, kernel, &CancelToken::new())
}

pub(crate) fn convolve_with(
    src: &PixelBuffer,
    kernel: &Kernel,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), kernel = kernel.size(), "convolve");

    let r = kernel.radius() as i64;
    let size = kernel.size();
    let width = src.width() as usize;

    fill_buffer(src, cancel, |y, row| {
        for x in 0..width {
            let mut sums = [0.0f64; 3];
            for ky in 0..size {
                for kx in 0..size {
                    let px = src.pixel_clamped(
                        x as i64 + kx as i64 - r,
                        y as i64 + ky as i64 - r,
                    );
                    let w = kernel.weight(kx, ky);
                    sums[0] += px[0] as f64 * w;
                    sums[1] += px[1] as f64 * w;
                    sums[2] += px[2] as f64 * w;
                }
            }

            let o = x * CHANNELS;
            row[o] = clamp_u8(sums[0]);
            row[o + 1] = clamp_u8(sums[1]);
            row[o + 2] = clamp_u8(sums[2]);
            row[o + 3] = src.pixel_unchecked(x as u32, y as u32)[3];
        }
    })
}

/// Gaussian blur.
///
/// # Errors
///
/// Fails if `sigma` is not a positive finite number.
pub fn gaussian(src: &PixelBuffer, sigma: f64) -> OpsResult<PixelBuffer> {
    gaussian_with(src, sigma, &CancelToken::new())
}

pub(crate) fn gaussian_with(
    src: &PixelBuffer,
    sigma: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let kernel = Kernel::gaussian(sigma)?;
    debug!(sigma, kernel = kernel.size(), "Applying gaussian blur");
    convolve_with(src, &kernel, cancel)
}

/// Uniform mean (box) filter.
///
/// # Errors
///
/// Fails unless `kernel_size` is odd and at least 3.
pub fn mean(src: &PixelBuffer, kernel_size: usize) -> OpsResult<PixelBuffer> {
    mean_with(src, kernel_size, &CancelToken::new())
}

pub(crate) fn mean_with(
    src: &PixelBuffer,
    kernel_size: usize,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let kernel = Kernel::uniform(kernel_size)?;
    convolve_with(src, &kernel, cancel)
}

/// Per-channel median over the `kernel_size²` neighborhood.
///
/// Removes impulse noise while keeping edges. Alpha is copied.
///
/// # Example
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::filter::median;
///
/// let mut src = PixelBuffer::filled(3, 3, [50, 50, 50, 255]);
/// src.set_pixel(1, 1, [255, 0, 255, 255]).unwrap();
/// let out = median(&src, 3).unwrap();
/// assert_eq!(out.pixel(1, 1).unwrap(), [50, 50, 50, 255]);
/// ```
pub fn median(src: &PixelBuffer, kernel_size: usize) -> OpsResult<PixelBuffer> {
    median_with(src, kernel_size, &CancelToken::new())
}

pub(crate) fn median_with(
    src: &PixelBuffer,
    kernel_size: usize,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    validate_kernel_size(kernel_size)?;
    trace!(width = src.width(), height = src.height(), kernel_size, "median");

    let radius = (kernel_size / 2) as i64;
    let count = kernel_size * kernel_size;
    let mid = count / 2;
    let width = src.width() as usize;

    fill_buffer(src, cancel, |y, row| {
        let mut values: [Vec<u8>; 3] = [
            Vec::with_capacity(count),
            Vec::with_capacity(count),
            Vec::with_capacity(count),
        ];

        for x in 0..width {
            for v in values.iter_mut() {
                v.clear();
            }
            for ky in -radius..=radius {
                for kx in -radius..=radius {
                    let px = src.pixel_clamped(x as i64 + kx, y as i64 + ky);
                    values[0].push(px[0]);
                    values[1].push(px[1]);
                    values[2].push(px[2]);
                }
            }

            let o = x * CHANNELS;
            for (c, v) in values.iter_mut().enumerate() {
                v.sort_unstable();
                row[o + c] = v[mid];
            }
            row[o + 3] = src.pixel_unchecked(x as u32, y as u32)[3];
        }
    })
}

/// Truncated gray plane used by the derivative detectors.
fn gray_plane(src: &PixelBuffer) -> Vec<u8> {
    src.pixels().map(gray_truncated).collect()
}

/// Shared 3x3 interior pass of the edge detectors.
///
/// Border rows and columns keep all four samples at zero; interior pixels
/// get `value` broadcast to R, G, B with alpha 255.
fn edge_pass<F>(src: &PixelBuffer, cancel: &CancelToken, value: F) -> OpsResult<PixelBuffer>
where
    F: Fn(&dyn Fn(i64, i64) -> f64) -> f64 + Sync + Send,
{
    let (w, h) = (src.width() as usize, src.height() as usize);
    let gray = gray_plane(src);

    fill_buffer(src, cancel, |y, row| {
        if y == 0 || y + 1 >= h {
            return;
        }
        for x in 1..w.saturating_sub(1) {
            let at = |dx: i64, dy: i64| {
                let sx = (x as i64 + dx) as usize;
                let sy = (y as i64 + dy) as usize;
                gray[sy * w + sx] as f64
            };
            let v = clamp_u8(value(&at));
            let o = x * CHANNELS;
            row[o] = v;
            row[o + 1] = v;
            row[o + 2] = v;
            row[o + 3] = 255;
        }
    })
}

fn apply_3x3(kernel: &Kernel, at: &dyn Fn(i64, i64) -> f64) -> f64 {
    let mut sum = 0.0;
    for ky in 0..3 {
        for kx in 0..3 {
            sum += at(kx as i64 - 1, ky as i64 - 1) * kernel.weight(kx, ky);
        }
    }
    sum
}

/// Sobel gradient magnitude `sqrt(gx² + gy²)` of the truncated gray image.
///
/// The one-pixel border is left fully zero (alpha included).
pub fn sobel(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    sobel_with(src, &CancelToken::new())
}

pub(crate) fn sobel_with(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "sobel");
    let kx = Kernel::sobel_x();
    let ky = Kernel::sobel_y();
    edge_pass(src, cancel, |at| {
        let gx = apply_3x3(&kx, at);
        let gy = apply_3x3(&ky, at);
        (gx * gx + gy * gy).sqrt()
    })
}

/// Absolute Laplacian response of the truncated gray image.
///
/// The one-pixel border is left fully zero (alpha included).
pub fn laplacian(src: &PixelBuffer) -> OpsResult<PixelBuffer> {
    laplacian_with(src, &CancelToken::new())
}

pub(crate) fn laplacian_with(src: &PixelBuffer, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    trace!(width = src.width(), height = src.height(), "laplacian");
    let k = Kernel::laplacian();
    edge_pass(src, cancel, |at| apply_3x3(&k, at).abs())
}

/// Unsharp mask: `orig + amount · (orig - gaussian(orig, σ))`, saturated.
///
/// # Errors
///
/// Fails if `sigma` is not positive or `amount` is not finite.
pub fn unsharp_mask(src: &PixelBuffer, amount: f64, sigma: f64) -> OpsResult<PixelBuffer> {
    unsharp_mask_with(src, amount, sigma, &CancelToken::new())
}

pub(crate) fn unsharp_mask_with(
    src: &PixelBuffer,
    amount: f64,
    sigma: f64,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    if !amount.is_finite() {
        return Err(OpsError::param(format!("amount must be finite, got {amount}")));
    }
    let blurred = gaussian_with(src, sigma, cancel)?;
    let row_len = src.row_len();
    let (orig, blur) = (src.data(), blurred.data());

    fill_buffer(src, cancel, |y, row| {
        let base = y * row_len;
        for (i, out) in row.iter_mut().enumerate() {
            let idx = base + i;
            *out = if i % CHANNELS == 3 {
                orig[idx]
            } else {
                let o = orig[idx] as f64;
                clamp_u8(o + amount * (o - blur[idx] as f64))
            };
        }
    })
}

/// Local standard deviation of the RGB-mean intensity.
///
/// Each output pixel is `sqrt(variance)` of the `kernel_size²` neighborhood,
/// broadcast to R, G, B with alpha 255.
pub fn variance(src: &PixelBuffer, kernel_size: usize) -> OpsResult<PixelBuffer> {
    variance_with(src, kernel_size, &CancelToken::new())
}

pub(crate) fn variance_with(
    src: &PixelBuffer,
    kernel_size: usize,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    validate_kernel_size(kernel_size)?;
    trace!(width = src.width(), height = src.height(), kernel_size, "variance");

    let radius = (kernel_size / 2) as i64;
    let width = src.width() as usize;

    fill_buffer(src, cancel, |y, row| {
        let mut values = Vec::with_capacity(kernel_size * kernel_size);
        for x in 0..width {
            values.clear();
            for ky in -radius..=radius {
                for kx in -radius..=radius {
                    values.push(gray_mean(src.pixel_clamped(x as i64 + kx, y as i64 + ky)));
                }
            }
            let var = stats::variance(&values, None);

            let v = clamp_u8(var.sqrt());
            let o = x * CHANNELS;
            row[o] = v;
            row[o + 1] = v;
            row[o + 2] = v;
            row[o + 3] = 255;
        }
    })
}

/// Most passes accepted by [`erode`] and [`dilate`].
pub const MAX_MORPH_ITERATIONS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Morph {
    Erode,
    Dilate,
}

/// Morphological erosion: per-channel minimum over the `kernel_size²`
/// square, repeated `iterations` times. Alpha is copied.
///
/// # Errors
///
/// Fails on an invalid kernel size or unless
/// `1 <= iterations <= MAX_MORPH_ITERATIONS`.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::filter::erode;
///
/// let mut src = PixelBuffer::filled(5, 5, [0, 0, 0, 255]);
/// src.set_pixel(2, 2, [200, 200, 200, 255]).unwrap();
/// // a lone bright pixel disappears
/// assert!(erode(&src, 3, 1).unwrap().pixels().all(|p| p == [0, 0, 0, 255]));
/// ```
pub fn erode(src: &PixelBuffer, kernel_size: usize, iterations: u32) -> OpsResult<PixelBuffer> {
    morphology_with(src, kernel_size, iterations, Morph::Erode, &CancelToken::new())
}

/// Morphological dilation: per-channel maximum over the `kernel_size²`
/// square, repeated `iterations` times. Alpha is copied.
///
/// # Errors
///
/// Same as [`erode`].
pub fn dilate(src: &PixelBuffer, kernel_size: usize, iterations: u32) -> OpsResult<PixelBuffer> {
    morphology_with(src, kernel_size, iterations, Morph::Dilate, &CancelToken::new())
}

pub(crate) fn erode_with(
    src: &PixelBuffer,
    kernel_size: usize,
    iterations: u32,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    morphology_with(src, kernel_size, iterations, Morph::Erode, cancel)
}

pub(crate) fn dilate_with(
    src: &PixelBuffer,
    kernel_size: usize,
    iterations: u32,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    morphology_with(src, kernel_size, iterations, Morph::Dilate, cancel)
}

fn morphology_with(
    src: &PixelBuffer,
    kernel_size: usize,
    iterations: u32,
    morph: Morph,
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    validate_kernel_size(kernel_size)?;
    if !(1..=MAX_MORPH_ITERATIONS).contains(&iterations) {
        return Err(OpsError::param(format!(
            "iterations must be within 1..={MAX_MORPH_ITERATIONS}, got {iterations}"
        )));
    }
    debug!(?morph, kernel_size, iterations, "Applying morphology");

    let radius = (kernel_size / 2) as i64;
    let mut out = morph_pass(src, radius, morph, cancel)?;
    for _ in 1..iterations {
        out = morph_pass(&out, radius, morph, cancel)?;
    }
    Ok(out)
}

fn morph_pass(src: &PixelBuffer, radius: i64, morph: Morph, cancel: &CancelToken) -> OpsResult<PixelBuffer> {
    let width = src.width() as usize;
    fill_buffer(src, cancel, |y, row| {
        for x in 0..width {
            let mut acc = match morph {
                Morph::Erode => [u8::MAX; 3],
                Morph::Dilate => [u8::MIN; 3],
            };
            for ky in -radius..=radius {
                for kx in -radius..=radius {
                    let px = src.pixel_clamped(x as i64 + kx, y as i64 + ky);
                    for c in 0..3 {
                        acc[c] = match morph {
                            Morph::Erode => acc[c].min(px[c]),
                            Morph::Dilate => acc[c].max(px[c]),
                        };
                    }
                }
            }
            let o = x * CHANNELS;
            row[o..o + 3].copy_from_slice(&acc);
            row[o + 3] = src.pixel_unchecked(x as u32, y as u32)[3];
        }
    })
}
