//! ROI geometry.
//!
//! A [`Region`] is an axis-aligned rectangle in integer pixel coordinates,
//! a circle or ellipse with a real-valued center and radii, or a polygon
//! given by its vertices. Regions may extend past the image; extraction
//! clips them.
//!
//! # Example
//!
//! ```rust
//! use xray_roi::{roi_mask, Region};
//!
//! let r = Region::rectangle(2, 2, 4, 2);
//! assert_eq!(r.area(), 8.0);
//! assert_eq!(r.center().x, 4.0);
//!
//! let mask = roi_mask(8, 8, &Region::circle(4.0, 4.0, 1.0));
//! assert_eq!(mask.iter().filter(|&&m| m == 1).count(), 5);
//! ```

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{RoiError, RoiResult};

/// Point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Shape of a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Axis-aligned rectangle
    Rectangle,
    /// Circle
    Circle,
    /// Axis-aligned ellipse
    Ellipse,
    /// Simple polygon
    Polygon,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
        })
    }
}

/// Region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Region {
    /// Pixels `x..x+width`, `y..y+height`.
    Rectangle {
        /// Left column
        x: i32,
        /// Top row
        y: i32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Pixels whose distance from the center is at most `radius`.
    Circle {
        /// Center column
        center_x: f64,
        /// Center row
        center_y: f64,
        /// Radius in pixels
        radius: f64,
    },
    /// Pixels with `(dx/radius_x)² + (dy/radius_y)² <= 1`.
    Ellipse {
        /// Center column
        center_x: f64,
        /// Center row
        center_y: f64,
        /// Horizontal semi-axis
        radius_x: f64,
        /// Vertical semi-axis
        radius_y: f64,
    },
    /// Pixels inside the closed outline through `points`, by the even-odd
    /// rule.
    Polygon {
        /// Vertices in drawing order; the last connects back to the first
        points: Vec<Point>,
    },
}

/// Axis-aligned extent of a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge
    pub min_x: f64,
    /// Right edge
    pub max_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl Region {
    /// Rectangle constructor.
    pub const fn rectangle(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::Rectangle { x, y, width, height }
    }

    /// Circle constructor.
    pub const fn circle(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self::Circle {
            center_x,
            center_y,
            radius,
        }
    }

    /// Ellipse constructor.
    pub const fn ellipse(center_x: f64, center_y: f64, radius_x: f64, radius_y: f64) -> Self {
        Self::Ellipse {
            center_x,
            center_y,
            radius_x,
            radius_y,
        }
    }

    /// Polygon constructor.
    pub fn polygon(points: impl Into<Vec<Point>>) -> Self {
        Self::Polygon {
            points: points.into(),
        }
    }

    /// Shape tag.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Rectangle { .. } => Shape::Rectangle,
            Self::Circle { .. } => Shape::Circle,
            Self::Ellipse { .. } => Shape::Ellipse,
            Self::Polygon { .. } => Shape::Polygon,
        }
    }

    /// Rejects regions that cannot contain a pixel.
    ///
    /// # Errors
    ///
    /// [`RoiError::InvalidRegion`] for a zero-sized rectangle, a circle or
    /// ellipse whose radii are not positive or whose center is not finite,
    /// or a polygon with fewer than three finite vertices or zero area.
    pub fn validate(&self) -> RoiResult<()> {
        match self {
            Self::Rectangle { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(RoiError::region(format!(
                        "rectangle {width}x{height} has zero area"
                    )));
                }
            }
            Self::Circle {
                center_x,
                center_y,
                radius,
            } => {
                if !(center_x.is_finite() && center_y.is_finite()) {
                    return Err(RoiError::region("circle center must be finite"));
                }
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(RoiError::region(format!("circle radius must be > 0, got {radius}")));
                }
            }
            Self::Ellipse {
                center_x,
                center_y,
                radius_x,
                radius_y,
            } => {
                if !(center_x.is_finite() && center_y.is_finite()) {
                    return Err(RoiError::region("ellipse center must be finite"));
                }
                for r in [radius_x, radius_y] {
                    if !(r.is_finite() && *r > 0.0) {
                        return Err(RoiError::region(format!("ellipse radii must be > 0, got {r}")));
                    }
                }
            }
            Self::Polygon { points } => {
                if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
                    return Err(RoiError::region("polygon vertices must be finite"));
                }
                polygon_centroid(points)?;
            }
        }
        Ok(())
    }

    /// Exact geometric area: `w·h`, `π·r²`, `π·rx·ry` or the shoelace area.
    ///
    /// This is not the number of sampled pixels, which depends on
    /// rasterization and clipping.
    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle { width, height, .. } => *width as f64 * *height as f64,
            Self::Circle { radius, .. } => PI * radius * radius,
            Self::Ellipse {
                radius_x, radius_y, ..
            } => PI * radius_x * radius_y,
            Self::Polygon { points } => signed_area(points).abs(),
        }
    }

    /// Geometric center; the area centroid for polygons.
    ///
    /// A degenerate polygon, which [`validate`](Self::validate) rejects,
    /// falls back to the mean of its vertices.
    pub fn center(&self) -> Point {
        match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => Point::new(
                *x as f64 + *width as f64 / 2.0,
                *y as f64 + *height as f64 / 2.0,
            ),
            Self::Circle {
                center_x, center_y, ..
            }
            | Self::Ellipse {
                center_x, center_y, ..
            } => Point::new(*center_x, *center_y),
            Self::Polygon { points } => {
                polygon_centroid(points).unwrap_or_else(|_| vertex_mean(points))
            }
        }
    }

    /// Extent of the region grown by `margin` on every side.
    pub fn bounds(&self, margin: f64) -> Bounds {
        match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => Bounds {
                min_x: *x as f64 - margin,
                max_x: *x as f64 + *width as f64 + margin,
                min_y: *y as f64 - margin,
                max_y: *y as f64 + *height as f64 + margin,
            },
            Self::Circle {
                center_x,
                center_y,
                radius,
            } => Bounds {
                min_x: center_x - radius - margin,
                max_x: center_x + radius + margin,
                min_y: center_y - radius - margin,
                max_y: center_y + radius + margin,
            },
            Self::Ellipse {
                center_x,
                center_y,
                radius_x,
                radius_y,
            } => Bounds {
                min_x: center_x - radius_x - margin,
                max_x: center_x + radius_x + margin,
                min_y: center_y - radius_y - margin,
                max_y: center_y + radius_y + margin,
            },
            Self::Polygon { points } => {
                let mut b = Bounds {
                    min_x: f64::INFINITY,
                    max_x: f64::NEG_INFINITY,
                    min_y: f64::INFINITY,
                    max_y: f64::NEG_INFINITY,
                };
                for p in points {
                    b.min_x = b.min_x.min(p.x);
                    b.max_x = b.max_x.max(p.x);
                    b.min_y = b.min_y.min(p.y);
                    b.max_y = b.max_y.max(p.y);
                }
                Bounds {
                    min_x: b.min_x - margin,
                    max_x: b.max_x + margin,
                    min_y: b.min_y - margin,
                    max_y: b.max_y + margin,
                }
            }
        }
    }

    /// Returns `true` if pixel `(px, py)` belongs to the region.
    #[inline]
    pub fn contains(&self, px: i64, py: i64) -> bool {
        match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let (x, y) = (*x as i64, *y as i64);
                px >= x && px < x + *width as i64 && py >= y && py < y + *height as i64
            }
            Self::Circle {
                center_x,
                center_y,
                radius,
            } => {
                let dx = px as f64 - center_x;
                let dy = py as f64 - center_y;
                (dx * dx + dy * dy).sqrt() <= *radius
            }
            Self::Ellipse {
                center_x,
                center_y,
                radius_x,
                radius_y,
            } => {
                let nx = (px as f64 - center_x) / radius_x;
                let ny = (py as f64 - center_y) / radius_y;
                nx * nx + ny * ny <= 1.0
            }
            Self::Polygon { points } => point_in_polygon(points, px as f64, py as f64),
        }
    }

    /// Pixel rows and columns that can hold region pixels inside a
    /// `width x height` image, as half-open ranges `(x0, x1, y0, y1)`.
    ///
    /// Round shapes and polygons span `floor(min)..floor(max) + 1`. The
    /// right and bottom extremes are inclusive: for a circle the pixel at
    /// exactly `cx + r` is scanned, which an exclusive `ceil(cx + r)` end
    /// would skip. Extraction therefore keeps exactly the pixels
    /// [`roi_mask`] marks.
    pub(crate) fn pixel_window(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clamp = |v: f64, hi: u32| v.clamp(0.0, hi as f64) as u32;
        let span = |b: Bounds| {
            (
                clamp(b.min_x.floor(), width),
                clamp(b.max_x.floor() + 1.0, width),
                clamp(b.min_y.floor(), height),
                clamp(b.max_y.floor() + 1.0, height),
            )
        };
        match self {
            Self::Rectangle {
                x,
                y,
                width: w,
                height: h,
            } => {
                let x0 = (*x as i64).clamp(0, width as i64);
                let x1 = (*x as i64 + *w as i64).clamp(0, width as i64);
                let y0 = (*y as i64).clamp(0, height as i64);
                let y1 = (*y as i64 + *h as i64).clamp(0, height as i64);
                (x0 as u32, x1 as u32, y0 as u32, y1 as u32)
            }
            Self::Circle { .. } | Self::Ellipse { .. } | Self::Polygon { .. } => span(self.bounds(0.0)),
        }
    }
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

fn vertex_mean(points: &[Point]) -> Point {
    let n = points.len().max(1) as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Area centroid of a closed polygon.
///
/// # Errors
///
/// [`RoiError::InvalidRegion`] for fewer than three vertices or an area
/// below `1e-10`.
///
/// ```rust
/// use xray_roi::region::{polygon_centroid, Point};
///
/// let tri = [Point::new(0.0, 0.0), Point::new(6.0, 0.0), Point::new(0.0, 3.0)];
/// assert_eq!(polygon_centroid(&tri).unwrap(), Point::new(2.0, 1.0));
/// ```
pub fn polygon_centroid(points: &[Point]) -> RoiResult<Point> {
    if points.len() < 3 {
        return Err(RoiError::region(format!(
            "polygon needs at least 3 points, got {}",
            points.len()
        )));
    }
    let n = points.len();
    let (mut area, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        let cross = a.x * b.y - b.x * a.y;
        area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    area /= 2.0;
    if area.abs() < DEGENERATE_AREA {
        return Err(RoiError::region("degenerate polygon: area is zero"));
    }
    Ok(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

const DEGENERATE_AREA: f64 = 1e-10;

/// Even-odd crossing test.
fn point_in_polygon(points: &[Point], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = points.len().wrapping_sub(1);
    for (i, a) in points.iter().enumerate() {
        let b = points[j];
        if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Binary mask of a region over a `width x height` image, row-major,
/// `1` inside and `0` outside.
///
/// The ones are exactly the pixels that extraction samples.
pub fn roi_mask(width: u32, height: u32, region: &Region) -> Vec<u8> {
    let mut mask = vec![0u8; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            if region.contains(x as i64, y as i64) {
                mask[y as usize * width as usize + x as usize] = 1;
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validate() {
        assert!(Region::rectangle(0, 0, 0, 5).validate().is_err());
        assert!(Region::rectangle(-3, 2, 1, 1).validate().is_ok());
        assert!(Region::circle(1.0, 1.0, 0.0).validate().is_err());
        assert!(Region::circle(f64::NAN, 1.0, 2.0).validate().is_err());
        assert!(Region::circle(1.0, 1.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_area_and_center() {
        let c = Region::circle(3.0, 4.0, 2.0);
        assert_relative_eq!(c.area(), 4.0 * PI);
        assert_eq!(c.center(), Point::new(3.0, 4.0));

        let r = Region::rectangle(-2, 1, 5, 3);
        assert_eq!(r.area(), 15.0);
        assert_eq!(r.center(), Point::new(0.5, 2.5));
        assert_eq!(r.shape(), Shape::Rectangle);
    }

    #[test]
    fn test_bounds_with_margin() {
        let b = Region::circle(10.0, 10.0, 3.0).bounds(1.0);
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (6.0, 14.0, 6.0, 14.0));
        let b = Region::rectangle(2, 3, 4, 5).bounds(0.0);
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (2.0, 6.0, 3.0, 8.0));
    }

    #[test]
    fn test_pixel_window_clips() {
        let r = Region::rectangle(-2, 3, 5, 10);
        assert_eq!(r.pixel_window(4, 6), (0, 3, 3, 6));
        let c = Region::circle(0.5, 0.5, 2.0);
        assert_eq!(c.pixel_window(10, 10), (0, 3, 0, 3));
        let far = Region::rectangle(50, 50, 2, 2);
        let (x0, x1, y0, y1) = far.pixel_window(10, 10);
        assert!(x0 >= x1 && y0 >= y1);
    }

    #[test]
    fn test_circle_keeps_right_and_bottom_edge() {
        let c = Region::circle(5.0, 5.0, 2.0);
        assert_eq!(c.pixel_window(20, 20), (3, 8, 3, 8));
        let mask = roi_mask(20, 20, &c);
        assert_eq!(mask[5 * 20 + 7], 1);
        assert_eq!(mask[7 * 20 + 5], 1);
        assert_eq!(mask[5 * 20 + 8], 0);
    }

    #[test]
    fn test_mask_rectangle_clipped() {
        let m = roi_mask(4, 3, &Region::rectangle(2, 1, 5, 5));
        assert_eq!(m, vec![0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1]);
    }

    #[test]
    fn test_serde_tagged() {
        let r: Region = serde_yaml::from_str("shape: circle\ncenter_x: 5\ncenter_y: 6\nradius: 2.5").unwrap();
        assert_eq!(r, Region::circle(5.0, 6.0, 2.5));
        let r: Region = serde_yaml::from_str("shape: rectangle\nx: -1\ny: 0\nwidth: 3\nheight: 2").unwrap();
        assert_eq!(r, Region::rectangle(-1, 0, 3, 2));
    }

    fn square(x0: f64, y0: f64, side: f64) -> Region {
        Region::polygon(vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    #[test]
    fn test_ellipse_geometry() {
        let e = Region::ellipse(5.0, 4.0, 3.0, 1.0);
        assert!(e.validate().is_ok());
        assert_relative_eq!(e.area(), 3.0 * PI);
        assert_eq!(e.center(), Point::new(5.0, 4.0));
        assert_eq!(e.shape(), Shape::Ellipse);
        let b = e.bounds(0.5);
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (1.5, 8.5, 2.5, 5.5));

        assert!(e.contains(8, 4));
        assert!(e.contains(2, 4));
        assert!(e.contains(5, 5));
        assert!(!e.contains(5, 6));
        assert!(!e.contains(7, 5));

        assert!(Region::ellipse(0.0, 0.0, 1.0, 0.0).validate().is_err());
        assert!(Region::ellipse(0.0, f64::NAN, 1.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_ellipse_matches_circle() {
        let (c, e) = (Region::circle(4.25, 3.5, 2.3), Region::ellipse(4.25, 3.5, 2.3, 2.3));
        assert_eq!(roi_mask(10, 8, &c), roi_mask(10, 8, &e));
        assert_eq!(c.pixel_window(10, 8), e.pixel_window(10, 8));
    }

    #[test]
    fn test_polygon_geometry() {
        let sq = square(1.0, 2.0, 4.0);
        assert!(sq.validate().is_ok());
        assert_relative_eq!(sq.area(), 16.0);
        assert_eq!(sq.center(), Point::new(3.0, 4.0));
        let b = sq.bounds(1.0);
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (0.0, 6.0, 1.0, 7.0));
        assert_eq!(sq.pixel_window(20, 20), (1, 6, 2, 7));

        // winding order only flips the sign of the shoelace sum
        let Region::Polygon { mut points } = sq.clone() else { unreachable!() };
        points.reverse();
        let rev = Region::polygon(points);
        assert_relative_eq!(rev.area(), 16.0);
        assert_eq!(rev.center(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_polygon_contains() {
        // L shape: 4x4 square missing its top-right 2x2 quarter
        let l = Region::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(4.0, 2.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]);
        assert!(l.contains(1, 1));
        assert!(l.contains(3, 3));
        assert!(!l.contains(3, 1));
        assert!(!l.contains(5, 3));
        let inside = roi_mask(6, 6, &l).iter().filter(|&&m| m == 1).count();
        // half-open edges: columns 0..2 on rows 0..2, columns 0..4 on rows 2..4
        assert_eq!(inside, 4 + 8);
    }

    #[test]
    fn test_polygon_validation() {
        let two = Region::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(two.validate().is_err());
        let line = Region::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
        assert!(line.validate().is_err());
        assert_eq!(line.center(), Point::new(1.0, 1.0));
        let bad = Region::polygon(vec![Point::new(0.0, 0.0), Point::new(f64::INFINITY, 0.0), Point::new(0.0, 1.0)]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_new_shapes_serde() {
        let r: Region = serde_yaml::from_str("shape: ellipse\ncenter_x: 5\ncenter_y: 6\nradius_x: 3\nradius_y: 1").unwrap();
        assert_eq!(r, Region::ellipse(5.0, 6.0, 3.0, 1.0));
        let r: Region = serde_yaml::from_str(
            "shape: polygon\npoints:\n  - {x: 0, y: 0}\n  - {x: 4, y: 0}\n  - {x: 0, y: 3}\n",
        )
        .unwrap();
        assert_eq!(r.shape(), Shape::Polygon);
        assert_relative_eq!(r.area(), 6.0);
    }
}
