//! Exposure fusion of bracketed captures.
//!
//! Several shots of the same scene taken with different exposure times are
//! merged into one buffer. Each sample is divided by its exposure time to
//! estimate radiance, and the estimates are averaged with a hat weight that
//! trusts mid-gray pixels most and clipped pixels least:
//!
//! ```text
//! w = 1 - |gray - 128| / 128        gray = (R + G + B) / 3
//! out = min(255, Σ(v / t · w) / Σw · t₀)
//! ```
//!
//! The result is re-exposed at the first capture's time `t₀`.

use tracing::{debug, trace};
use xray_core::{clamp_u8, gray_mean, PixelBuffer, CHANNELS};

use crate::rows::build_buffer;
use crate::{CancelToken, OpsError, OpsResult};

/// Hat weight of a pixel, 1 at mid-gray and 0 at black.
#[inline]
pub fn exposure_weight(px: [u8; 4]) -> f64 {
    1.0 - (gray_mean(px) - 128.0).abs() / 128.0
}

/// Merges bracketed exposures into one buffer.
///
/// Pixels whose weights sum to zero in every capture (pure black
/// everywhere) stay fully transparent black; all others get alpha 255.
///
/// # Errors
///
/// Fails if no images are given, the image and time counts differ, a time
/// is not positive and finite, or the images differ in size.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_ops::hdr::merge_exposures;
///
/// let short = PixelBuffer::filled(2, 2, [64, 64, 64, 255]);
/// let long = PixelBuffer::filled(2, 2, [128, 128, 128, 255]);
/// let out = merge_exposures(&[short, long], &[1.0, 2.0]).unwrap();
/// assert_eq!(out.pixel(0, 0).unwrap(), [64, 64, 64, 255]);
/// ```
pub fn merge_exposures(images: &[PixelBuffer], exposure_times: &[f64]) -> OpsResult<PixelBuffer> {
    merge_exposures_with(images, exposure_times, &CancelToken::new())
}

pub(crate) fn merge_exposures_with(
    images: &[PixelBuffer],
    exposure_times: &[f64],
    cancel: &CancelToken,
) -> OpsResult<PixelBuffer> {
    let Some(first) = images.first() else {
        return Err(OpsError::param("at least one exposure is required"));
    };
    if images.len() != exposure_times.len() {
        return Err(OpsError::param(format!(
            "{} images but {} exposure times",
            images.len(),
            exposure_times.len()
        )));
    }
    if let Some(t) = exposure_times.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
        return Err(OpsError::param(format!("exposure time must be > 0, got {t}")));
    }
    for img in &images[1..] {
        first.ensure_same_size(img)?;
    }

    let (w, h) = first.dimensions();
    let t0 = exposure_times[0];
    debug!(exposures = images.len(), width = w, height = h, "Merging exposures");

    let out = build_buffer(w, h, cancel, |y, row| {
        let y = y as u32;
        for x in 0..w {
            let mut acc = [0.0f64; 3];
            let mut weight = 0.0;
            for (img, &t) in images.iter().zip(exposure_times) {
                let px = img.pixel_unchecked(x, y);
                let wt = exposure_weight(px);
                for c in 0..3 {
                    acc[c] += px[c] as f64 / t * wt;
                }
                weight += wt;
            }
            if weight > 0.0 {
                let o = x as usize * CHANNELS;
                for c in 0..3 {
                    row[o + c] = clamp_u8((acc[c] / weight * t0).min(255.0));
                }
                row[o + 3] = 255;
            }
        }
    })?;
    trace!("exposures merged");
    Ok(out)
}
