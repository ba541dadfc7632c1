//! Stateless geometry helpers shared with every plugin.
//!
//! Plugins receive one `Rc<Utils>` per engine. Nothing here holds state, so
//! the same value can be handed to any number of plugins.

#[cfg(test)]
#[path = "utils_test.rs"]
mod utils_test;

use crate::geom::{Point, Rect};

#[derive(Debug, Clone, Copy, Default)]
pub struct Utils;

impl Utils {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        (b.x - a.x).hypot(b.y - a.y)
    }

    /// Whether `p` lies inside `rect`, edges included.
    #[must_use]
    pub fn point_in_rect(&self, p: Point, rect: Rect) -> bool {
        p.x >= rect.left && p.x <= rect.right() && p.y >= rect.top && p.y <= rect.bottom()
    }

    /// Shortest distance from `p` to the segment `a`–`b`.
    #[must_use]
    pub fn point_to_segment_distance(&self, p: Point, a: Point, b: Point) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f64::EPSILON {
            return self.distance(p, a);
        }
        let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        self.distance(p, Point::new(a.x + t * dx, a.y + t * dy))
    }

    /// Even-odd point-in-polygon test. Fewer than three vertices never contain anything.
    #[must_use]
    pub fn point_in_polygon(&self, p: Point, polygon: &[Point]) -> bool {
        if polygon.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = polygon.len() - 1;
        for (i, vi) in polygon.iter().enumerate() {
            let vj = polygon[j];
            if (vi.y > p.y) != (vj.y > p.y) && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    #[must_use]
    pub fn bounding_box(&self, points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}
