//! Box-shaped operations: rectangles, circles, highlights and erasers.

use super::{Annotation, HexColor};
use crate::coords::PagePoint;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Two corner points (in any order) with stroke styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    /// First corner, usually where the gesture started.
    pub start: PagePoint,
    /// Opposite corner.
    pub end: PagePoint,
    pub color: HexColor,
    /// Stroke width in page units.
    #[serde(default = "default_stroke_width")]
    pub width: f64,
}

fn default_stroke_width() -> f64 {
    1.0
}

impl BoxGeometry {
    pub fn new(start: PagePoint, end: PagePoint) -> Self {
        Self {
            start,
            end,
            color: HexColor::BLACK,
            width: default_stroke_width(),
        }
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Box anchored at `origin` extending `width` by `height`.
    pub fn from_origin(origin: PagePoint, width: f64, height: f64) -> Self {
        Self::new(origin, origin.translate(Vec2::new(width, height)))
    }

    /// Normalized rectangle spanned by the corners.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start.0, self.end.0)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Radius of the circle inscribed in the box.
    pub fn radius(&self) -> f64 {
        let rect = self.rect();
        rect.width().min(rect.height()) / 2.0
    }

    pub(super) fn circle_contains(&self, point: PagePoint, tolerance: f64) -> bool {
        self.center().distance(point.0) <= self.radius() + tolerance
    }
}

impl Annotation for BoxGeometry {
    fn bounds(&self) -> Rect {
        self.rect()
    }

    fn translate(&mut self, delta: Vec2) {
        self.start = self.start.translate(delta);
        self.end = self.end.translate(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_is_normalized() {
        let geometry = BoxGeometry::new(PagePoint::new(110.0, 60.0), PagePoint::new(10.0, 10.0));
        let rect = geometry.rect();
        assert!((rect.x0 - 10.0).abs() < f64::EPSILON);
        assert!((rect.y0 - 10.0).abs() < f64::EPSILON);
        assert!((rect.x1 - 110.0).abs() < f64::EPSILON);
        assert!((rect.y1 - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_radius_uses_smaller_span() {
        let geometry = BoxGeometry::new(PagePoint::new(0.0, 0.0), PagePoint::new(100.0, 40.0));
        assert!((geometry.radius() - 20.0).abs() < f64::EPSILON);
        assert_eq!(geometry.center(), Point::new(50.0, 20.0));
    }

    #[test]
    fn test_translate_preserves_size() {
        let mut geometry =
            BoxGeometry::new(PagePoint::new(10.0, 10.0), PagePoint::new(110.0, 60.0));
        geometry.translate(Vec2::new(15.0, -5.0));
        assert_eq!(geometry.start, PagePoint::new(25.0, 5.0));
        assert_eq!(geometry.end, PagePoint::new(125.0, 55.0));
        assert!((geometry.rect().width() - 100.0).abs() < f64::EPSILON);
        assert!((geometry.rect().height() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_tolerance_extends_radius() {
        let geometry = BoxGeometry::new(PagePoint::new(0.0, 0.0), PagePoint::new(20.0, 20.0));
        assert!(!geometry.circle_contains(PagePoint::new(22.0, 10.0), 0.0));
        assert!(geometry.circle_contains(PagePoint::new(22.0, 10.0), 2.5));
    }
}
