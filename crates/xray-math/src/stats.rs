//! Descriptive statistics over flat sample sequences.
//!
//! All functions accept any slice of [`Sample`] values (8-bit, 16-bit,
//! float) and compute in `f64`.
//!
//! # Empty Input
//!
//! An empty slice is a valid input, not an error: [`mean`], [`min`],
//! [`max`], [`std_dev`], [`median`] and [`percentile`] all return `0.0`,
//! and [`summarize`] returns an all-zero [`StatSummary`].
//!
//! # Example
//!
//! ```rust
//! use xray_math::stats;
//!
//! let s = stats::summarize(&[10u8, 20, 30, 40, 50]);
//! assert_eq!(s.mean, 30.0);
//! assert_eq!(s.median, 30.0);
//! assert!((s.std_dev - 14.142).abs() < 1e-3);
//! ```

use crate::{MathError, MathResult};

/// A scalar that statistics can be computed over.
pub trait Sample: Copy {
    /// Widens the sample to `f64`.
    fn to_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_sample!(u8, u16, u32, i16, i32, f32, f64);

/// Bundle of the basic statistics of one sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median (mean of the two central values for even counts)
    pub median: f64,
    /// Minimum sample
    pub min: f64,
    /// Maximum sample
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Population variance, `std_dev²`
    pub variance: f64,
    /// Number of samples
    pub count: usize,
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean<T: Sample>(data: &[T]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().map(|v| v.to_f64()).sum();
    sum / data.len() as f64
}

/// Smallest sample, `0.0` for an empty slice.
pub fn min<T: Sample>(data: &[T]) -> f64 {
    data.iter()
        .map(|v| v.to_f64())
        .reduce(|a, b| if b < a { b } else { a })
        .unwrap_or(0.0)
}

/// Largest sample, `0.0` for an empty slice.
pub fn max<T: Sample>(data: &[T]) -> f64 {
    data.iter()
        .map(|v| v.to_f64())
        .reduce(|a, b| if b > a { b } else { a })
        .unwrap_or(0.0)
}

/// Population variance around `mean`, computed if not supplied.
pub fn variance<T: Sample>(data: &[T], mean_hint: Option<f64>) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let avg = mean_hint.unwrap_or_else(|| mean(data));
    let sq: f64 = data
        .iter()
        .map(|v| {
            let d = v.to_f64() - avg;
            d * d
        })
        .sum();
    sq / data.len() as f64
}

/// Population standard deviation.
///
/// Pass a precomputed mean to skip the extra pass.
///
/// ```rust
/// use xray_math::stats::{mean, std_dev};
///
/// let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// let m = mean(&data);
/// assert_eq!(std_dev(&data, Some(m)), 2.0);
/// assert_eq!(std_dev(&data, None), 2.0);
/// ```
pub fn std_dev<T: Sample>(data: &[T], mean_hint: Option<f64>) -> f64 {
    variance(data, mean_hint).sqrt()
}

fn sorted<T: Sample>(data: &[T]) -> Vec<f64> {
    let mut v: Vec<f64> = data.iter().map(|s| s.to_f64()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Median of the samples.
///
/// For an even count the two central values are averaged.
pub fn median<T: Sample>(data: &[T]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let v = sorted(data);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Nearest-rank percentile, `p` in `[0, 100]`.
///
/// The rank is `ceil(p/100 * n) - 1`, clamped to `[0, n-1]`. A `p` outside
/// `[0, 100]` (or NaN) returns `0.0`; use [`checked_percentile`] to get an
/// error instead.
///
/// ```rust
/// use xray_math::stats::percentile;
///
/// let data = [15u8, 20, 35, 40, 50];
/// assert_eq!(percentile(&data, 40.0), 20.0);
/// assert_eq!(percentile(&data, 100.0), 50.0);
/// assert_eq!(percentile(&data, 0.0), 15.0);
/// assert_eq!(percentile(&data, 101.0), 0.0);
/// ```
pub fn percentile<T: Sample>(data: &[T], p: f64) -> f64 {
    checked_percentile(data, p).unwrap_or(0.0)
}

/// Nearest-rank percentile that rejects `p` outside `[0, 100]`.
///
/// # Errors
///
/// Returns [`MathError::InvalidPercentile`] for out-of-range or NaN `p`.
pub fn checked_percentile<T: Sample>(data: &[T], p: f64) -> MathResult<f64> {
    if !(0.0..=100.0).contains(&p) {
        return Err(MathError::InvalidPercentile(p));
    }
    if data.is_empty() {
        return Ok(0.0);
    }
    let v = sorted(data);
    let rank = (p / 100.0 * v.len() as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, v.len() as i64 - 1) as usize;
    Ok(v[idx])
}

/// Bucket counts over `[0, max_value]`.
///
/// The bucket of a sample is `floor(v / max_value * (bins - 1))`, clamped
/// into `[0, bins-1]`, so values above `max_value` land in the last bucket
/// and negative values in the first.
///
/// ```rust
/// use xray_math::stats::histogram;
///
/// let h = histogram(&[0u8, 128, 255, 255], 256, 255.0);
/// assert_eq!(h[0], 1);
/// assert_eq!(h[128], 1);
/// assert_eq!(h[255], 2);
///
/// // out-of-range values are clamped into the edge buckets
/// let h = histogram(&[300.0, -5.0], 4, 255.0);
/// assert_eq!(h, vec![1, 0, 0, 1]);
/// ```
pub fn histogram<T: Sample>(data: &[T], bins: usize, max_value: f64) -> Vec<u64> {
    let mut hist = vec![0u64; bins];
    if bins == 0 {
        return hist;
    }
    let last = (bins - 1) as f64;
    for v in data {
        // multiply first so integer levels land exactly on their bucket
        let pos = (v.to_f64() * last / max_value).floor();
        // NaN casts to 0
        let idx = pos.clamp(0.0, last) as usize;
        hist[idx] += 1;
    }
    hist
}

/// Rescales samples linearly into `[0, 1]`.
///
/// `min`/`max` default to the observed extremes. A zero range maps every
/// sample to `0.0`.
pub fn normalize<T: Sample>(data: &[T], min_hint: Option<f64>, max_hint: Option<f64>) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let lo = min_hint.unwrap_or_else(|| min(data));
    let hi = max_hint.unwrap_or_else(|| max(data));
    let range = hi - lo;
    if range == 0.0 {
        return vec![0.0; data.len()];
    }
    data.iter().map(|v| (v.to_f64() - lo) / range).collect()
}

/// Computes mean, median, min, max, standard deviation, variance and count.
pub fn summarize<T: Sample>(data: &[T]) -> StatSummary {
    if data.is_empty() {
        return StatSummary::default();
    }
    let mean = mean(data);
    let std_dev = std_dev(data, Some(mean));
    StatSummary {
        mean,
        median: median(data),
        min: min(data),
        max: max(data),
        std_dev,
        variance: std_dev * std_dev,
        count: data.len(),
    }
}
