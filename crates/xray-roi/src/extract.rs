//! Sample extraction.
//!
//! Turns a region and a channel into the ordered sequence of samples every
//! statistic is computed from. Rectangles are read row-major; the other
//! shapes are read row-major over their bounding window, keeping the pixels
//! [`Region::contains`] accepts. Pixels outside the image are skipped, so
//! the sample count can be lower than the region's area.

use tracing::trace;
use xray_core::{Channel, PixelBuffer};

use crate::{Region, RoiResult};

/// Samples of `channel` inside `region`.
///
/// Gray samples are the RGB mean rounded to the nearest level.
///
/// # Errors
///
/// Fails if the region has zero area (see [`Region::validate`]).
///
/// ```rust
/// use xray_core::{Channel, PixelBuffer};
/// use xray_roi::{extract, Region};
///
/// let img = PixelBuffer::from_fn(4, 4, |x, y| [(x + 10 * y) as u8, 0, 0, 255]);
/// let s = extract(&img, &Region::rectangle(1, 1, 2, 2), Channel::Red).unwrap();
/// assert_eq!(s, vec![11, 12, 21, 22]);
///
/// // clipped at the image border
/// let s = extract(&img, &Region::rectangle(3, 3, 5, 5), Channel::Red).unwrap();
/// assert_eq!(s, vec![33]);
/// ```
pub fn extract(buffer: &PixelBuffer, region: &Region, channel: Channel) -> RoiResult<Vec<u8>> {
    region.validate()?;
    let (x0, x1, y0, y1) = region.pixel_window(buffer.width(), buffer.height());
    trace!(shape = %region.shape(), %channel, x0, x1, y0, y1, "extract");

    let mut samples = Vec::with_capacity((x1.saturating_sub(x0) as usize) * (y1.saturating_sub(y0) as usize));
    for y in y0..y1 {
        for x in x0..x1 {
            if region.contains(x as i64, y as i64) {
                samples.push(channel.sample(buffer.pixel_unchecked(x, y)));
            }
        }
    }
    Ok(samples)
}

/// Rectangle shorthand for [`extract`].
pub fn extract_rectangle(
    buffer: &PixelBuffer,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    channel: Channel,
) -> RoiResult<Vec<u8>> {
    extract(buffer, &Region::rectangle(x, y, width, height), channel)
}

/// Circle shorthand for [`extract`].
pub fn extract_circle(
    buffer: &PixelBuffer,
    center_x: f64,
    center_y: f64,
    radius: f64,
    channel: Channel,
) -> RoiResult<Vec<u8>> {
    extract(buffer, &Region::circle(center_x, center_y, radius), channel)
}

/// Ellipse shorthand for [`extract`].
pub fn extract_ellipse(
    buffer: &PixelBuffer,
    center_x: f64,
    center_y: f64,
    radius_x: f64,
    radius_y: f64,
    channel: Channel,
) -> RoiResult<Vec<u8>> {
    extract(buffer, &Region::ellipse(center_x, center_y, radius_x, radius_y), channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{roi_mask, Point};

    fn image() -> PixelBuffer {
        PixelBuffer::from_fn(9, 7, |x, y| [(x * 20) as u8, (y * 30) as u8, 7, (x + y) as u8])
    }

    #[test]
    fn test_gray_is_rounded_mean() {
        let img = PixelBuffer::filled(2, 2, [10, 20, 32, 255]);
        let s = extract_rectangle(&img, 0, 0, 2, 2, Channel::Gray).unwrap();
        assert_eq!(s, vec![21; 4]);
    }

    #[test]
    fn test_alpha_channel() {
        let s = extract_rectangle(&image(), 2, 3, 2, 1, Channel::Alpha).unwrap();
        assert_eq!(s, vec![5, 6]);
    }

    #[test]
    fn test_circle_row_major() {
        let s = extract_circle(&image(), 4.0, 3.0, 1.0, Channel::Red).unwrap();
        // (4,2) (3,3) (4,3) (5,3) (4,4)
        assert_eq!(s, vec![80, 60, 80, 100, 80]);
    }

    #[test]
    fn test_circle_matches_mask() {
        let img = image();
        for (cx, cy, r) in [(4.0, 3.0, 2.0), (0.0, 0.0, 3.0), (8.5, 6.5, 2.2), (4.3, 2.7, 1.5)] {
            let region = Region::circle(cx, cy, r);
            let s = extract(&img, &region, Channel::Red).unwrap();
            let mask = roi_mask(img.width(), img.height(), &region);
            assert_eq!(s.len(), mask.iter().filter(|&&m| m == 1).count());
        }
    }

    #[test]
    fn test_outside_image_is_empty() {
        let s = extract_rectangle(&image(), -10, -10, 3, 3, Channel::Gray).unwrap();
        assert!(s.is_empty());
        let s = extract_circle(&image(), 100.0, 100.0, 5.0, Channel::Gray).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_zero_area_rejected() {
        assert!(extract_rectangle(&image(), 0, 0, 0, 3, Channel::Gray).is_err());
        assert!(extract_circle(&image(), 1.0, 1.0, 0.0, Channel::Gray).is_err());
    }

    #[test]
    fn test_ellipse_row_major() {
        let s = extract_ellipse(&image(), 4.0, 3.0, 2.0, 1.0, Channel::Red).unwrap();
        // row 2: x=4; row 3: x=2..=6; row 4: x=4
        assert_eq!(s, vec![80, 40, 60, 80, 100, 120, 80]);
    }

    #[test]
    fn test_polygon_matches_mask() {
        let img = image();
        let region = Region::polygon(vec![
            Point::new(1.0, 1.0),
            Point::new(7.5, 2.0),
            Point::new(5.0, 6.5),
            Point::new(-3.0, 5.0),
        ]);
        let s = extract(&img, &region, Channel::Green).unwrap();
        let mask = roi_mask(img.width(), img.height(), &region);
        assert_eq!(s.len(), mask.iter().filter(|&&m| m == 1).count());
        assert!(!s.is_empty());

        let tiny = Region::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(extract(&img, &tiny, Channel::Green).is_err());
    }
}
