//! Pixel-level helpers: saturating byte writes and grayscale reductions.
//!
//! Every operation that writes a channel value goes through [`clamp_u8`],
//! which reproduces the clamped-byte store semantics that display surfaces
//! apply implicitly: clamp into `[0, 255]`, round half to even, NaN becomes 0.
//!
//! # Grayscale Variants
//!
//! Different operations reduce RGB to one intensity in slightly different
//! ways, and the exact variant matters for bit-compatible output:
//!
//! | function          | formula                         | used by                   |
//! |-------------------|---------------------------------|---------------------------|
//! | [`gray_mean`]     | `(R+G+B)/3` as float            | window/level, FFT, variance |
//! | [`gray_truncated`]| `floor((R+G+B)/3)`              | Sobel, Laplacian          |
//! | [`gray_rounded`]  | `round((R+G+B)/3)`              | ROI extraction, equalize  |
//! | [`luma_rec601`]   | `round(.299R+.587G+.114B)`      | histogram fold            |

/// Number of interleaved samples per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Rec.601 luma weights used for the gray histogram.
pub const REC601_LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Saturating cast of a computed channel value into a byte.
///
/// # Example
///
/// ```rust
/// use xray_core::clamp_u8;
///
/// assert_eq!(clamp_u8(-4.0), 0);
/// assert_eq!(clamp_u8(300.0), 255);
/// assert_eq!(clamp_u8(127.5), 128);
/// assert_eq!(clamp_u8(126.5), 126);
/// assert_eq!(clamp_u8(f64::NAN), 0);
/// ```
#[inline]
pub fn clamp_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Rounds half toward positive infinity (`floor(v + 0.5)`).
///
/// Matches the rounding used for lookup tables and line-profile coordinates,
/// which differs from [`f64::round`] for negative halves.
///
/// ```rust
/// use xray_core::round_half_up;
///
/// assert_eq!(round_half_up(2.5), 3.0);
/// assert_eq!(round_half_up(-0.5), 0.0);
/// assert_eq!(round_half_up(-1.5), -1.0);
/// ```
#[inline]
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Exact RGB mean, `(R+G+B)/3`.
#[inline]
pub fn gray_mean(px: [u8; 4]) -> f64 {
    (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0
}

/// RGB mean truncated toward zero.
#[inline]
pub fn gray_truncated(px: [u8; 4]) -> u8 {
    ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8
}

/// RGB mean rounded to the nearest integer.
///
/// A sum divided by three never lands on `.5`, so integer arithmetic is exact.
#[inline]
pub fn gray_rounded(px: [u8; 4]) -> u8 {
    ((px[0] as u16 + px[1] as u16 + px[2] as u16 + 1) / 3) as u8
}

/// Rec.601 luma rounded half-up.
#[inline]
pub fn luma_rec601(px: [u8; 4]) -> u8 {
    let y = REC601_LUMA[0] * px[0] as f64
        + REC601_LUMA[1] * px[1] as f64
        + REC601_LUMA[2] * px[2] as f64;
    (y + 0.5).floor().min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_u8() {
        assert_eq!(clamp_u8(0.4), 0);
        assert_eq!(clamp_u8(0.6), 1);
        assert_eq!(clamp_u8(254.9), 255);
        assert_eq!(clamp_u8(1e9), 255);
        assert_eq!(clamp_u8(f64::INFINITY), 255);
        assert_eq!(clamp_u8(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_gray_variants() {
        let px = [10, 20, 31, 255]; // sum 61
        assert_eq!(gray_truncated(px), 20);
        assert_eq!(gray_rounded(px), 20);
        assert!((gray_mean(px) - 61.0 / 3.0).abs() < 1e-12);

        let px = [10, 20, 32, 255]; // sum 62 -> 20.67
        assert_eq!(gray_truncated(px), 20);
        assert_eq!(gray_rounded(px), 21);

        assert_eq!(gray_rounded([255, 255, 255, 0]), 255);
    }

    #[test]
    fn test_luma() {
        assert_eq!(luma_rec601([255, 255, 255, 255]), 255);
        assert_eq!(luma_rec601([0, 0, 0, 255]), 0);
        assert_eq!(luma_rec601([255, 0, 0, 255]), 76);
    }
}
