//! Per-channel histograms of a whole buffer.

use serde::{Deserialize, Serialize};
use tracing::trace;
use xray_core::{luma_rec601, Channel, PixelBuffer};
use xray_math::stats;

/// Levels per channel.
pub const LEVELS: usize = 256;

/// Histograms of the red, green, blue and luma channels.
///
/// Each bin holds the percentage of pixels at that level, so a channel sums
/// to 100 up to rounding. Gray is Rec.601 luma rounded half-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramFold {
    /// Red percentages
    pub red: Vec<f64>,
    /// Green percentages
    pub green: Vec<f64>,
    /// Blue percentages
    pub blue: Vec<f64>,
    /// Luma percentages
    pub gray: Vec<f64>,
}

impl Default for HistogramFold {
    fn default() -> Self {
        Self {
            red: vec![0.0; LEVELS],
            green: vec![0.0; LEVELS],
            blue: vec![0.0; LEVELS],
            gray: vec![0.0; LEVELS],
        }
    }
}

/// Folds a buffer into per-channel percentage histograms.
///
/// An empty buffer gives all-zero histograms.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_roi::histogram_fold;
///
/// let img = PixelBuffer::from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0, 255] } else { [255; 4] });
/// let h = histogram_fold(&img);
/// assert_eq!(h.red[0], 50.0);
/// assert_eq!(h.gray[255], 50.0);
/// ```
pub fn histogram_fold(buffer: &PixelBuffer) -> HistogramFold {
    let mut fold = HistogramFold::default();
    let total = buffer.pixel_count();
    trace!(width = buffer.width(), height = buffer.height(), "histogram_fold");
    if total == 0 {
        return fold;
    }

    let mut counts = [[0u64; LEVELS]; 4];
    for px in buffer.pixels() {
        counts[0][px[0] as usize] += 1;
        counts[1][px[1] as usize] += 1;
        counts[2][px[2] as usize] += 1;
        counts[3][luma_rec601(px) as usize] += 1;
    }

    let scale = 100.0 / total as f64;
    let bins = [&mut fold.red, &mut fold.green, &mut fold.blue, &mut fold.gray];
    for (dst, src) in bins.into_iter().zip(counts.iter()) {
        for (d, &c) in dst.iter_mut().zip(src) {
            *d = c as f64 * scale;
        }
    }
    fold
}

/// Raw 256-bin counts of one channel over the whole buffer.
///
/// Gray uses the rounded RGB mean, like ROI extraction.
pub fn channel_histogram(buffer: &PixelBuffer, channel: Channel) -> Vec<u64> {
    let samples: Vec<u8> = buffer.pixels().map(|px| channel.sample(px)).collect();
    stats::histogram(&samples, LEVELS, (LEVELS - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fold_sums_to_100() {
        let img = PixelBuffer::from_fn(7, 3, |x, y| [(x * 30) as u8, (y * 90) as u8, 17, 255]);
        let h = histogram_fold(&img);
        for ch in [&h.red, &h.green, &h.blue, &h.gray] {
            assert_eq!(ch.len(), LEVELS);
            assert_relative_eq!(ch.iter().sum::<f64>(), 100.0, epsilon = 1e-9);
        }
        assert_relative_eq!(h.blue[17], 100.0);
    }

    #[test]
    fn test_gray_is_luma() {
        let img = PixelBuffer::filled(2, 2, [255, 0, 0, 255]);
        let h = histogram_fold(&img);
        // 0.299 * 255 = 76.2
        assert_eq!(h.gray[76], 100.0);
    }

    #[test]
    fn test_empty() {
        let h = histogram_fold(&PixelBuffer::new(0, 0));
        assert_eq!(h, HistogramFold::default());
    }

    #[test]
    fn test_channel_histogram() {
        let img = PixelBuffer::from_fn(4, 1, |x, _| [x as u8, 0, 0, 200]);
        let h = channel_histogram(&img, Channel::Red);
        assert_eq!(&h[..5], &[1, 1, 1, 1, 0]);
        assert_eq!(channel_histogram(&img, Channel::Alpha)[200], 4);
        assert_eq!(h.iter().sum::<u64>(), 4);
    }
}
