//! Freehand ink strokes.

use super::line::segment_distance;
use super::{Annotation, HexColor};
use crate::coords::PagePoint;
use kurbo::{BezPath, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An ordered polyline of sampled pointer positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreehandStroke {
    pub points: Vec<PagePoint>,
    pub color: HexColor,
    pub width: f64,
}

impl FreehandStroke {
    /// Fewest samples that make a committable stroke.
    pub const MIN_POINTS: usize = 2;

    pub fn from_points(points: Vec<PagePoint>) -> Self {
        Self {
            points,
            color: HexColor::BLACK,
            width: 2.0,
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

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline path through every sample.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.points.iter();
        if let Some(first) = points.next() {
            path.move_to(first.0);
            for point in points {
                path.line_to(point.0);
            }
        }
        path
    }
}

impl Annotation for FreehandStroke {
    fn bounds(&self) -> Rect {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(first.0, first.0), |acc, p| {
            acc.union_pt(p.0)
        })
    }

    /// Hit when the point is within half the stroke width of any segment.
    fn contains(&self, point: PagePoint, tolerance: f64) -> bool {
        let reach = tolerance + self.width / 2.0;
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(point) <= reach,
            points => points
                .windows(2)
                .any(|pair| segment_distance(pair[0].0, pair[1].0, point.0) <= reach),
        }
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point = point.translate(delta);
        }
    }
}
