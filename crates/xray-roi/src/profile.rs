//! Intensity profiles along a line.

use serde::{Deserialize, Serialize};
use tracing::trace;
use xray_core::{round_half_up, Channel, PixelBuffer};

use crate::{RoiError, RoiResult};

/// Segment from `(x1, y1)` to `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start column
    pub x1: f64,
    /// Start row
    pub y1: f64,
    /// End column
    pub x2: f64,
    /// End row
    pub y2: f64,
}

impl Line {
    /// Creates a line.
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// One sample of a line profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Pixel column
    pub x: u32,
    /// Pixel row
    pub y: u32,
    /// Step index along the line
    pub distance: f64,
    /// Channel sample
    pub value: u8,
}

/// Samples `channel` along `line` in unit steps.
///
/// The line is split into `ceil(length)` steps and both endpoints are
/// included. Each step position is rounded half-up to a pixel; steps that
/// land outside the image are dropped, so `distance` may skip values. A
/// zero-length line yields its start pixel.
///
/// Endpoints far outside the image are fine: the segment is clipped to the
/// image first, so the work done is proportional to the visible part.
///
/// # Errors
///
/// [`RoiError::InvalidRegion`] if an endpoint is not finite or the length
/// overflows `f64`.
///
/// ```rust
/// use xray_core::{Channel, PixelBuffer};
/// use xray_roi::profile::{extract_line_profile, Line};
///
/// let img = PixelBuffer::from_fn(5, 1, |x, _| [x as u8 * 10, 0, 0, 255]);
/// let p = extract_line_profile(&img, &Line::new(0.0, 0.0, 4.0, 0.0), Channel::Red).unwrap();
/// let values: Vec<u8> = p.iter().map(|s| s.value).collect();
/// assert_eq!(values, vec![0, 10, 20, 30, 40]);
/// ```
pub fn extract_line_profile(
    buffer: &PixelBuffer,
    line: &Line,
    channel: Channel,
) -> RoiResult<Vec<ProfilePoint>> {
    if ![line.x1, line.y1, line.x2, line.y2].iter().all(|v| v.is_finite()) {
        return Err(RoiError::region("line endpoints must be finite"));
    }
    let (dx, dy) = (line.x2 - line.x1, line.y2 - line.y1);
    let steps = line.length().ceil();
    if !steps.is_finite() {
        return Err(RoiError::region("line length overflows"));
    }
    trace!(?line, steps, %channel, "extract_line_profile");

    // visit only the steps that can round onto a pixel
    let Some((t0, t1)) = clip_to_image(line, buffer.width(), buffer.height()) else {
        return Ok(Vec::new());
    };
    let (first, last) = if steps == 0.0 {
        (0.0, 0.0)
    } else {
        (
            (t0 * steps).floor().max(0.0),
            (t1 * steps).ceil().min(steps),
        )
    };
    let count = (last - first) as u64 + 1;

    let mut profile = Vec::with_capacity(count.min(MAX_PREALLOC) as usize);
    for k in 0..count {
        let i = first + k as f64;
        let t = if steps == 0.0 { 0.0 } else { i / steps };
        let x = round_half_up(line.x1 + dx * t) as i64;
        let y = round_half_up(line.y1 + dy * t) as i64;
        if !buffer.contains(x, y) {
            continue;
        }
        let (x, y) = (x as u32, y as u32);
        profile.push(ProfilePoint {
            x,
            y,
            distance: i,
            value: channel.sample(buffer.pixel_unchecked(x, y)),
        });
    }
    Ok(profile)
}

const MAX_PREALLOC: u64 = 1 << 16;

/// Parameter range `[t0, t1]` of `line` that rounds into the image.
///
/// Pixels own the half-open cell `[p - 0.5, p + 0.5)`, so the segment is
/// clipped against `[-0.5, width - 0.5]` on x and the same on y. `None`
/// when the segment misses the image entirely.
fn clip_to_image(line: &Line, width: u32, height: u32) -> Option<(f64, f64)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let axes = [
        (line.x1, line.x2 - line.x1, width as f64),
        (line.y1, line.y2 - line.y1, height as f64),
    ];
    for (start, delta, extent) in axes {
        let (lo, hi) = (-0.5, extent - 0.5);
        if delta == 0.0 {
            if start < lo || start > hi {
                return None;
            }
            continue;
        }
        let (a, b) = ((lo - start) / delta, (hi - start) / delta);
        let (enter, exit) = if a < b { (a, b) } else { (b, a) };
        t0 = t0.max(enter);
        t1 = t1.min(exit);
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> PixelBuffer {
        PixelBuffer::from_fn(6, 6, |x, y| [(x * 10) as u8, (y * 10) as u8, 0, 255])
    }

    #[test]
    fn test_diagonal() {
        let p = extract_line_profile(&ramp(), &Line::new(0.0, 0.0, 3.0, 3.0), Channel::Green).unwrap();
        // length 4.24 -> 5 steps, 6 samples
        assert_eq!(p.len(), 6);
        assert_eq!((p[0].x, p[0].y), (0, 0));
        assert_eq!((p[5].x, p[5].y), (3, 3));
        assert_eq!(p[5].distance, 5.0);
        assert_eq!(p[5].value, 30);
    }

    #[test]
    fn test_rounds_half_up() {
        let p = extract_line_profile(&ramp(), &Line::new(0.5, 0.0, 0.5, 1.0), Channel::Red).unwrap();
        assert!(p.iter().all(|s| s.x == 1));
    }

    #[test]
    fn test_zero_length() {
        let p = extract_line_profile(&ramp(), &Line::new(2.0, 3.0, 2.0, 3.0), Channel::Red).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!((p[0].x, p[0].y, p[0].value), (2, 3, 20));
    }

    #[test]
    fn test_out_of_bounds_skipped() {
        let p = extract_line_profile(&ramp(), &Line::new(-2.0, 1.0, 2.0, 1.0), Channel::Red).unwrap();
        let d: Vec<f64> = p.iter().map(|s| s.distance).collect();
        assert_eq!(d, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_non_finite_rejected() {
        let line = Line::new(0.0, f64::NAN, 1.0, 1.0);
        assert!(extract_line_profile(&ramp(), &line, Channel::Gray).is_err());
    }

    #[test]
    fn test_huge_endpoints_clipped() {
        let img = PixelBuffer::from_fn(4, 4, |x, _| [x as u8, 0, 0, 255]);
        let p = extract_line_profile(&img, &Line::new(0.0, 0.0, 1e19, 0.0), Channel::Red).unwrap();
        let xs: Vec<u32> = p.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
        assert!(p.iter().all(|s| s.y == 0));

        let p = extract_line_profile(&img, &Line::new(-1e15, 2.0, 1e15, 2.0), Channel::Red).unwrap();
        assert!((3..=5).contains(&p.len()));
        assert!(p.iter().all(|s| s.y == 2 && s.x < 4));

        // misses the image on both axes
        let p = extract_line_profile(&img, &Line::new(-1e12, -5.0, -10.0, 1e12), Channel::Red).unwrap();
        assert!(p.is_empty());

        let line = Line::new(-f64::MAX, 0.0, f64::MAX, 0.0);
        assert!(extract_line_profile(&img, &line, Channel::Red).is_err());
    }

    #[test]
    fn test_clipping_keeps_distances() {
        // same samples as the unclipped walk, including the step indices
        let img = ramp();
        let line = Line::new(-30.0, 2.0, 5.0, 2.0);
        let p = extract_line_profile(&img, &line, Channel::Red).unwrap();
        let got: Vec<(u32, f64)> = p.iter().map(|s| (s.x, s.distance)).collect();
        let expected: Vec<(u32, f64)> = (0..6).map(|x| (x, (x + 30) as f64)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_empty_image() {
        let p = extract_line_profile(&PixelBuffer::new(0, 0), &Line::new(0.0, 0.0, 3.0, 0.0), Channel::Red).unwrap();
        assert!(p.is_empty());
    }
}
