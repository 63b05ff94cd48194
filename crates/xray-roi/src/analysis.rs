//! Full ROI analysis and comparison.

use serde::{Deserialize, Serialize};
use tracing::trace;
use xray_core::{Channel, PixelBuffer};
use xray_math::stats::{self, StatSummary};

use crate::metrics::{self, MetricInputs, QualityMetrics};
use crate::{extract, Region, RoiError, RoiResult, Shape};

/// Options for [`analyze_roi`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Channel sampled in every region
    pub channel: Channel,
    /// Compute [`QualityMetrics`]
    pub calculate_metrics: bool,
    /// Background region for CNR
    pub background: Option<Region>,
    /// Open-beam region used as `I0`
    pub reference: Option<Region>,
    /// Fixed `I0`
    pub reference_intensity: Option<f64>,
    /// Material thickness for attenuation
    pub thickness: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            channel: Channel::Gray,
            calculate_metrics: true,
            background: None,
            reference: None,
            reference_intensity: None,
            thickness: 1.0,
        }
    }
}

/// Result of [`analyze_roi`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    /// Region shape
    pub shape: Shape,
    /// Analysed region as given
    pub region: Region,
    /// Sampled channel
    pub channel: Channel,
    /// Geometric area, see [`Region::area`]
    pub area: f64,
    /// Number of pixels actually sampled
    pub pixel_count: usize,
    /// Statistics of the samples
    pub statistics: StatSummary,
    /// Quality metrics, if requested
    pub metrics: Option<QualityMetrics>,
    /// Width of the analysed image
    pub image_width: u32,
    /// Height of the analysed image
    pub image_height: u32,
}

/// Extracts `region`, summarizes its samples and optionally computes
/// quality metrics.
///
/// `area` and `pixel_count` are reported separately: the first is
/// geometric, the second counts rasterized pixels left after clipping.
///
/// # Errors
///
/// Fails if any region has zero area, the thickness is not positive or the
/// reference intensity is not finite.
///
/// ```rust
/// use xray_core::PixelBuffer;
/// use xray_roi::{analyze_roi, AnalysisOptions, Region};
///
/// let img = PixelBuffer::filled(10, 10, [128, 128, 128, 255]);
/// let a = analyze_roi(&img, &Region::rectangle(0, 0, 10, 10), &AnalysisOptions::default()).unwrap();
/// assert_eq!(a.statistics.mean, 128.0);
/// assert_eq!(a.statistics.std_dev, 0.0);
/// assert_eq!(a.metrics.unwrap().snr, f64::INFINITY);
/// ```
pub fn analyze_roi(
    buffer: &PixelBuffer,
    region: &Region,
    options: &AnalysisOptions,
) -> RoiResult<RoiAnalysis> {
    trace!(shape = %region.shape(), channel = %options.channel, metrics = options.calculate_metrics, "analyze_roi");
    metrics::validate_thickness(options.thickness)?;
    if let Some(i0) = options.reference_intensity {
        if !i0.is_finite() {
            return Err(RoiError::region(format!("reference intensity must be finite, got {i0}")));
        }
    }

    let samples = extract(buffer, region, options.channel)?;
    let statistics = stats::summarize(&samples);

    let metrics = if options.calculate_metrics {
        let background = options
            .background
            .as_ref()
            .map(|r| extract(buffer, r, options.channel))
            .transpose()?;
        let reference = options
            .reference
            .as_ref()
            .map(|r| extract(buffer, r, options.channel))
            .transpose()?;
        let inputs = MetricInputs {
            samples: &samples[..],
            background: background.as_deref(),
            reference: reference.as_deref(),
            reference_intensity: options.reference_intensity,
            thickness: options.thickness,
        };
        Some(metrics::all_metrics(&inputs)?)
    } else {
        None
    };

    Ok(RoiAnalysis {
        shape: region.shape(),
        region: region.clone(),
        channel: options.channel,
        area: region.area(),
        pixel_count: samples.len(),
        statistics,
        metrics,
        image_width: buffer.width(),
        image_height: buffer.height(),
    })
}

/// Differences and ratios between two analyses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiComparison {
    /// `|mean_a - mean_b|`
    pub mean_difference: f64,
    /// `mean_a / mean_b`
    pub mean_ratio: f64,
    /// `|mean_a - mean_b| / std_dev_b`
    pub contrast_ratio: f64,
    /// `|area_a - area_b|`
    pub area_difference: f64,
    /// `area_a / area_b`
    pub area_ratio: f64,
}

/// Compares two analyses taken on the same image.
///
/// Ratios with a zero denominator are `+inf`.
///
/// # Errors
///
/// [`RoiError::DimensionMismatch`] if the analyses come from images of
/// different sizes.
pub fn compare_rois(a: &RoiAnalysis, b: &RoiAnalysis) -> RoiResult<RoiComparison> {
    if (a.image_width, a.image_height) != (b.image_width, b.image_height) {
        return Err(RoiError::DimensionMismatch {
            a_width: a.image_width,
            a_height: a.image_height,
            b_width: b.image_width,
            b_height: b.image_height,
        });
    }
    let (sa, sb) = (&a.statistics, &b.statistics);
    let mean_difference = (sa.mean - sb.mean).abs();
    Ok(RoiComparison {
        mean_difference,
        mean_ratio: ratio(sa.mean, sb.mean),
        contrast_ratio: ratio(mean_difference, sb.std_dev),
        area_difference: (a.area - b.area).abs(),
        area_ratio: ratio(a.area, b.area),
    })
}

#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { f64::INFINITY } else { num / den }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn halves() -> PixelBuffer {
        // left half 40, right half 200, one noisy column in the middle
        PixelBuffer::from_fn(20, 10, |x, y| {
            let v = match x {
                0..=9 => 40,
                10 => 190 + (y % 2) as u8 * 20,
                _ => 200,
            };
            [v, v, v, 255]
        })
    }

    #[test]
    fn test_metrics_optional() {
        let opts = AnalysisOptions {
            calculate_metrics: false,
            ..Default::default()
        };
        let a = analyze_roi(&halves(), &Region::rectangle(0, 0, 5, 5), &opts).unwrap();
        assert!(a.metrics.is_none());
        assert_eq!(a.pixel_count, 25);
        assert_eq!(a.shape, Shape::Rectangle);
        assert_eq!((a.image_width, a.image_height), (20, 10));
    }

    #[test]
    fn test_background_and_reference() {
        let opts = AnalysisOptions {
            background: Some(Region::rectangle(10, 0, 1, 10)),
            reference: Some(Region::rectangle(12, 0, 8, 10)),
            ..Default::default()
        };
        let a = analyze_roi(&halves(), &Region::rectangle(0, 0, 10, 10), &opts).unwrap();
        let m = a.metrics.unwrap();
        // background: 190/210 alternating, mean 200, sd 10
        assert_relative_eq!(m.cnr.unwrap(), 16.0);
        assert_relative_eq!(m.transmission.unwrap(), 20.0);
        assert_relative_eq!(m.attenuation.unwrap(), 5f64.ln());
        assert_eq!(m.min_transmission, None);
    }

    #[test]
    fn test_invalid_options() {
        let img = halves();
        let roi = Region::rectangle(0, 0, 2, 2);
        let bad = AnalysisOptions {
            thickness: 0.0,
            ..Default::default()
        };
        assert!(analyze_roi(&img, &roi, &bad).is_err());
        let bad = AnalysisOptions {
            reference_intensity: Some(f64::NAN),
            ..Default::default()
        };
        assert!(analyze_roi(&img, &roi, &bad).is_err());
        let bad = AnalysisOptions {
            background: Some(Region::rectangle(0, 0, 0, 1)),
            ..Default::default()
        };
        assert!(analyze_roi(&img, &roi, &bad).is_err());
    }

    #[test]
    fn test_compare() {
        let img = halves();
        let opts = AnalysisOptions::default();
        let dark = analyze_roi(&img, &Region::rectangle(0, 0, 4, 4), &opts).unwrap();
        let bright = analyze_roi(&img, &Region::rectangle(12, 0, 8, 4), &opts).unwrap();
        let c = compare_rois(&bright, &dark).unwrap();
        assert_relative_eq!(c.mean_difference, 160.0);
        assert_relative_eq!(c.mean_ratio, 5.0);
        assert_eq!(c.contrast_ratio, f64::INFINITY);
        assert_relative_eq!(c.area_difference, 16.0);
        assert_relative_eq!(c.area_ratio, 2.0);
    }

    #[test]
    fn test_compare_dimension_mismatch() {
        let opts = AnalysisOptions::default();
        let roi = Region::rectangle(0, 0, 2, 2);
        let a = analyze_roi(&halves(), &roi, &opts).unwrap();
        let b = analyze_roi(&PixelBuffer::new(4, 4), &roi, &opts).unwrap();
        assert!(matches!(
            compare_rois(&a, &b),
            Err(RoiError::DimensionMismatch { b_width: 4, .. })
        ));
    }

    #[test]
    fn test_options_from_yaml() {
        let opts: AnalysisOptions = serde_yaml::from_str(
            "channel: r\nreference_intensity: 255\nbackground:\n  shape: circle\n  center_x: 3\n  center_y: 3\n  radius: 2\n",
        )
        .unwrap();
        assert_eq!(opts.channel, Channel::Red);
        assert!(opts.calculate_metrics);
        assert_eq!(opts.thickness, 1.0);
        assert_eq!(opts.background, Some(Region::circle(3.0, 3.0, 2.0)));
    }

    #[test]
    fn test_polygon_and_ellipse_regions() {
        let img = halves();
        let tri = Region::polygon(vec![
            crate::Point::new(0.0, 0.0),
            crate::Point::new(8.0, 0.0),
            crate::Point::new(0.0, 8.0),
        ]);
        let a = analyze_roi(&img, &tri, &AnalysisOptions::default()).unwrap();
        assert_eq!(a.shape, Shape::Polygon);
        assert_eq!(a.area, 32.0);
        assert_eq!(a.statistics.mean, 40.0);
        assert_eq!(a.region, tri);

        let opts = AnalysisOptions {
            background: Some(Region::ellipse(15.0, 5.0, 3.0, 4.0)),
            ..Default::default()
        };
        let a = analyze_roi(&img, &Region::ellipse(4.0, 5.0, 3.0, 2.0), &opts).unwrap();
        assert_eq!(a.shape, Shape::Ellipse);
        assert_eq!(a.metrics.unwrap().cnr, Some(f64::INFINITY));
    }
}
