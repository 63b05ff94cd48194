//! Image quality metrics.
//!
//! All metrics work on plain sample slices, usually the output of
//! [`extract`](crate::extract). Degenerate inputs produce fixed sentinel
//! values instead of errors:
//!
//! | metric                | condition            | result     |
//! |-----------------------|----------------------|------------|
//! | [`snr`]               | empty samples        | `0`        |
//! | [`snr`]               | zero std deviation   | `+inf`     |
//! | [`cnr`]               | either side empty    | `0`        |
//! | [`cnr`]               | background std is 0  | `+inf`     |
//! | [`transmission`]      | `I0 == 0`            | `0`        |
//! | [`attenuation`]       | `I == 0` or `I0 == 0`| `0`        |
//!
//! # Example
//!
//! ```rust
//! use xray_roi::metrics::{snr, transmission, quality_index, Grade};
//!
//! assert_eq!(snr(&[128u8; 16]), f64::INFINITY);
//! assert_eq!(transmission(50.0, 200.0), 25.0);
//! assert_eq!(quality_index(&[100u8, 102, 98, 100]).grade, Grade::Excellent);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use xray_math::stats::{self, Sample};

use crate::{RoiError, RoiResult};

/// Signal-to-noise ratio, `mean / std_dev`.
pub fn snr<T: Sample>(samples: &[T]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = stats::mean(samples);
    let sd = stats::std_dev(samples, Some(mean));
    if sd == 0.0 {
        return f64::INFINITY;
    }
    mean / sd
}

/// Contrast-to-noise ratio, `|mean_a - mean_b| / std_dev_b`.
///
/// `background` supplies the noise estimate.
pub fn cnr<T: Sample>(signal: &[T], background: &[T]) -> f64 {
    if signal.is_empty() || background.is_empty() {
        return 0.0;
    }
    let mean_b = stats::mean(background);
    let sd_b = stats::std_dev(background, Some(mean_b));
    if sd_b == 0.0 {
        return f64::INFINITY;
    }
    (stats::mean(signal) - mean_b).abs() / sd_b
}

/// Transmission in percent, `I / I0 · 100`.
#[inline]
pub fn transmission(intensity: f64, reference_intensity: f64) -> f64 {
    if reference_intensity == 0.0 {
        return 0.0;
    }
    intensity / reference_intensity * 100.0
}

/// Transmission of the mean of `samples` against the mean of `reference`.
pub fn roi_transmission<T: Sample>(samples: &[T], reference: &[T]) -> f64 {
    if samples.is_empty() || reference.is_empty() {
        return 0.0;
    }
    transmission(stats::mean(samples), stats::mean(reference))
}

/// Transmission of the darkest sample.
pub fn min_transmission<T: Sample>(samples: &[T], reference_intensity: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    transmission(stats::min(samples), reference_intensity)
}

/// Linear attenuation coefficient, `-ln(I / I0) / thickness`.
///
/// # Errors
///
/// [`RoiError::InvalidRegion`] if `thickness` is not positive.
pub fn attenuation(intensity: f64, reference_intensity: f64, thickness: f64) -> RoiResult<f64> {
    validate_thickness(thickness)?;
    if intensity == 0.0 || reference_intensity == 0.0 {
        return Ok(0.0);
    }
    Ok(-(intensity / reference_intensity).ln() / thickness)
}

pub(crate) fn validate_thickness(thickness: f64) -> RoiResult<()> {
    if !(thickness.is_finite() && thickness > 0.0) {
        return Err(RoiError::region(format!("thickness must be > 0, got {thickness}")));
    }
    Ok(())
}

/// Metrics computed for one ROI.
///
/// Optional metrics are `None` when their inputs were not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Signal-to-noise ratio
    pub snr: f64,
    /// Contrast-to-noise ratio against the background samples
    pub cnr: Option<f64>,
    /// Mean transmission in percent
    pub transmission: Option<f64>,
    /// Transmission of the darkest sample, needs a fixed reference intensity
    pub min_transmission: Option<f64>,
    /// Attenuation coefficient
    pub attenuation: Option<f64>,
}

/// Inputs for [`all_metrics`].
#[derive(Debug, Clone, Copy)]
pub struct MetricInputs<'a, T> {
    /// Samples of the analysed ROI
    pub samples: &'a [T],
    /// Background samples for CNR
    pub background: Option<&'a [T]>,
    /// Open-beam samples used as `I0`
    pub reference: Option<&'a [T]>,
    /// Fixed `I0`, preferred over `reference` for attenuation
    pub reference_intensity: Option<f64>,
    /// Material thickness for attenuation
    pub thickness: f64,
}

impl<'a, T> MetricInputs<'a, T> {
    /// Inputs with only the ROI samples and unit thickness.
    pub fn new(samples: &'a [T]) -> Self {
        Self {
            samples,
            background: None,
            reference: None,
            reference_intensity: None,
            thickness: 1.0,
        }
    }
}

/// Computes every metric the inputs allow.
///
/// A reference sample set wins over a fixed reference intensity for
/// transmission. Minimum transmission is only reported against a fixed
/// intensity. Empty or missing background/reference samples leave their
/// metrics at `None`.
///
/// # Errors
///
/// Fails if `thickness` is not positive.
pub fn all_metrics<T: Sample>(inputs: &MetricInputs<'_, T>) -> RoiResult<QualityMetrics> {
    validate_thickness(inputs.thickness)?;
    let samples = inputs.samples;
    if samples.is_empty() {
        debug!("no samples, metrics left at defaults");
        return Ok(QualityMetrics::default());
    }

    let mean = stats::mean(samples);
    let background = inputs.background.filter(|b| !b.is_empty());
    let reference = inputs.reference.filter(|r| !r.is_empty());

    let mut metrics = QualityMetrics {
        snr: snr(samples),
        cnr: background.map(|b| cnr(samples, b)),
        ..QualityMetrics::default()
    };

    if let Some(reference) = reference {
        metrics.transmission = Some(roi_transmission(samples, reference));
    } else if let Some(i0) = inputs.reference_intensity {
        metrics.transmission = Some(transmission(mean, i0));
        metrics.min_transmission = Some(min_transmission(samples, i0));
    }

    let i0 = inputs
        .reference_intensity
        .or_else(|| reference.map(stats::mean));
    if let Some(i0) = i0 {
        metrics.attenuation = Some(attenuation(mean, i0, inputs.thickness)?);
    }

    Ok(metrics)
}

/// Quality grade derived from SNR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// SNR above 20
    Excellent,
    /// SNR above 10
    Good,
    /// SNR above 5
    Fair,
    /// SNR above 2
    Acceptable,
    /// SNR at most 2
    Poor,
    /// No samples
    NotAvailable,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Acceptable => "Acceptable",
            Self::Poor => "Poor",
            Self::NotAvailable => "N/A",
        })
    }
}

/// SNR with its grade and a 0..=5 score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityIndex {
    /// Signal-to-noise ratio
    pub snr: f64,
    /// Grade bucket
    pub grade: Grade,
    /// Score, 5 is best
    pub score: u8,
}

/// Grades a sample set by its SNR.
///
/// Thresholds are strict: `> 20` excellent, `> 10` good, `> 5` fair,
/// `> 2` acceptable. SNR in `(1, 2]` is poor with score 1, anything lower
/// is poor with score 0.
pub fn quality_index<T: Sample>(samples: &[T]) -> QualityIndex {
    if samples.is_empty() {
        return QualityIndex {
            snr: 0.0,
            grade: Grade::NotAvailable,
            score: 0,
        };
    }
    let snr = snr(samples);
    let (grade, score) = match snr {
        s if s > 20.0 => (Grade::Excellent, 5),
        s if s > 10.0 => (Grade::Good, 4),
        s if s > 5.0 => (Grade::Fair, 3),
        s if s > 2.0 => (Grade::Acceptable, 2),
        s if s > 1.0 => (Grade::Poor, 1),
        _ => (Grade::Poor, 0),
    };
    QualityIndex { snr, grade, score }
}
