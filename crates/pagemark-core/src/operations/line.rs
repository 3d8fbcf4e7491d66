//! Straight line operations.

use super::{Annotation, HexColor};
use crate::coords::PagePoint;
use kurbo::{Line as KurboLine, ParamCurveNearest, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A straight segment between two page points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: PagePoint,
    pub end: PagePoint,
    pub color: HexColor,
    pub width: f64,
}

impl LineSegment {
    pub fn new(start: PagePoint, end: PagePoint) -> Self {
        Self {
            start,
            end,
            color: HexColor::BLACK,
            width: 1.0,
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

    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start.0, self.end.0)
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Distance from `point` to the segment `a`-`b`.
pub(super) fn segment_distance(a: Point, b: Point, point: Point) -> f64 {
    if a == b {
        return a.distance(point);
    }
    KurboLine::new(a, b).nearest(point, 1e-9).distance_sq.sqrt()
}

impl Annotation for LineSegment {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start.0, self.end.0)
    }

    fn contains(&self, point: PagePoint, tolerance: f64) -> bool {
        segment_distance(self.start.0, self.end.0, point.0) <= tolerance + self.width / 2.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.start = self.start.translate(delta);
        self.end = self.end.translate(delta);
    }
}
