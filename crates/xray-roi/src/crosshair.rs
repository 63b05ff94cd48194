//! Crosshair geometry through the center of a region.
//!
//! Only coordinates are computed here; drawing is left to the caller. The
//! center is the area centroid for polygons.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Region, RoiResult};

/// Line segment in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start column
    pub x1: f64,
    /// Start row
    pub y1: f64,
    /// End column
    pub x2: f64,
    /// End row
    pub y2: f64,
}

/// Horizontal and vertical lines crossing at the region center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crosshair {
    /// Line at the center row
    pub horizontal: Segment,
    /// Line at the center column
    pub vertical: Segment,
}

/// How far the crosshair reaches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosshairOptions {
    /// Span the whole canvas instead of the region extent
    pub extend_beyond_roi: bool,
    /// Extra length past the region extent on each side
    pub margin: f64,
}

/// Checks that a crosshair can be placed on `region`.
///
/// Every problem found is reported, in order; an empty list means the
/// region is usable.
///
/// ```rust
/// use xray_roi::crosshair::crosshair_problems;
/// use xray_roi::{Point, Region};
///
/// assert!(crosshair_problems(&Region::circle(5.0, 5.0, 2.0)).is_empty());
/// let line = Region::polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
/// assert_eq!(crosshair_problems(&line).len(), 1);
/// ```
pub fn crosshair_problems(region: &Region) -> Vec<String> {
    match region.validate() {
        Ok(()) => Vec::new(),
        Err(e) => vec![e.to_string()],
    }
}

/// Crosshair through the center of `region`.
///
/// With `extend_beyond_roi` the lines span `0..canvas_width` and
/// `0..canvas_height` and `margin` is ignored.
///
/// # Errors
///
/// [`RoiError::InvalidRegion`](crate::RoiError::InvalidRegion) if the
/// region fails [`Region::validate`], such as a degenerate polygon without
/// a centroid.
///
/// ```rust
/// use xray_roi::crosshair::{crosshair_bounds, CrosshairOptions};
/// use xray_roi::Region;
///
/// let c = crosshair_bounds(&Region::rectangle(10, 20, 40, 10), 100, 100, &CrosshairOptions::default()).unwrap();
/// assert_eq!((c.horizontal.x1, c.horizontal.x2, c.horizontal.y1), (10.0, 50.0, 25.0));
/// ```
pub fn crosshair_bounds(
    region: &Region,
    canvas_width: u32,
    canvas_height: u32,
    options: &CrosshairOptions,
) -> RoiResult<Crosshair> {
    region.validate()?;
    let c = region.center();
    trace!(shape = %region.shape(), x = c.x, y = c.y, "crosshair_bounds");
    let (min_x, max_x, min_y, max_y) = if options.extend_beyond_roi {
        (0.0, canvas_width as f64, 0.0, canvas_height as f64)
    } else {
        let b = region.bounds(options.margin);
        (b.min_x, b.max_x, b.min_y, b.max_y)
    };
    Ok(Crosshair {
        horizontal: Segment {
            x1: min_x,
            y1: c.y,
            x2: max_x,
            y2: c.y,
        },
        vertical: Segment {
            x1: c.x,
            y1: min_y,
            x2: c.x,
            y2: max_y,
        },
    })
}

/// Side of the region outline a crosshair line meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Left side
    Left,
    /// Right side
    Right,
    /// Top side
    Top,
    /// Bottom side
    Bottom,
    /// No single side; the shape is reported by its center only
    Center,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Center => "center",
        })
    }
}

/// Point where the crosshair meets the region outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// Column
    pub x: f64,
    /// Row
    pub y: f64,
    /// Side that was hit
    pub edge: Edge,
}

/// Crossings of the crosshair with the region outline.
///
/// Rectangles, circles and ellipses give four points in the order left,
/// right, top, bottom. A polygon outline can be crossed any number of
/// times, so it gives its centroid alone, tagged [`Edge::Center`].
///
/// # Errors
///
/// Same as [`crosshair_bounds`].
pub fn crosshair_intersections(region: &Region) -> RoiResult<Vec<Intersection>> {
    region.validate()?;
    let c = region.center();
    if let Region::Polygon { .. } = region {
        return Ok(vec![Intersection { x: c.x, y: c.y, edge: Edge::Center }]);
    }
    let b = region.bounds(0.0);
    Ok(vec![
        Intersection { x: b.min_x, y: c.y, edge: Edge::Left },
        Intersection { x: b.max_x, y: c.y, edge: Edge::Right },
        Intersection { x: c.x, y: b.min_y, edge: Edge::Top },
        Intersection { x: c.x, y: b.max_y, edge: Edge::Bottom },
    ])
}
