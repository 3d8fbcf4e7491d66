//! Edit operations: the annotations a user places on document pages.

mod boxed;
mod freehand;
mod image;
mod line;
mod text;

pub use boxed::BoxGeometry;
pub use freehand::FreehandStroke;
pub use image::{ImageFormat, ImagePayload, ImagePlacement};
pub use line::LineSegment;
pub use text::TextRun;

use crate::coords::PagePoint;
use crate::error::EditError;
use kurbo::{Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for operations.
pub type OpId = Uuid;

/// An opaque RGB color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const BLACK: HexColor = HexColor::new(0, 0, 0);
    pub const WHITE: HexColor = HexColor::new(255, 255, 255);
    pub const YELLOW: HexColor = HexColor::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`. Anything without the leading `#` is rejected.
    pub fn parse(input: &str) -> Result<Self, EditError> {
        let invalid = || EditError::InvalidColor(input.to_string());
        let hex = input.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Channels in the 0..=1 range, as PDF color operators expect.
    pub fn to_unit_rgb(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// Convert to a peniko color with the given opacity.
    pub fn with_alpha(self, opacity: f64) -> Color {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for HexColor {
    type Error = EditError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl From<HexColor> for Color {
    fn from(color: HexColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}

/// Geometry shared by every operation kind.
pub trait Annotation {
    /// Axis-aligned bounds in page space.
    fn bounds(&self) -> Rect;

    /// Whether a page-space point falls inside this annotation.
    fn contains(&self, point: PagePoint, tolerance: f64) -> bool {
        // Both edges count as inside, unlike `Rect::contains`.
        let rect = self.bounds().inflate(tolerance, tolerance);
        let p = point.0;
        rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
    }

    /// Move every geometry field by `delta`.
    fn translate(&mut self, delta: Vec2);
}

/// The kind of an operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Text,
    Rectangle,
    Circle,
    Line,
    Image,
    Freehand,
    Eraser,
    Highlight,
}

impl OperationType {
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Text => "text",
            OperationType::Rectangle => "rectangle",
            OperationType::Circle => "circle",
            OperationType::Line => "line",
            OperationType::Image => "image",
            OperationType::Freehand => "freehand",
            OperationType::Eraser => "eraser",
            OperationType::Highlight => "highlight",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-kind payload of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OperationKind {
    Text(TextRun),
    Rectangle(BoxGeometry),
    Circle(BoxGeometry),
    Line(LineSegment),
    Image(ImagePlacement),
    Freehand(FreehandStroke),
    Eraser(BoxGeometry),
    Highlight(BoxGeometry),
}

impl OperationKind {
    pub fn operation_type(&self) -> OperationType {
        match self {
            OperationKind::Text(_) => OperationType::Text,
            OperationKind::Rectangle(_) => OperationType::Rectangle,
            OperationKind::Circle(_) => OperationType::Circle,
            OperationKind::Line(_) => OperationType::Line,
            OperationKind::Image(_) => OperationType::Image,
            OperationKind::Freehand(_) => OperationType::Freehand,
            OperationKind::Eraser(_) => OperationType::Eraser,
            OperationKind::Highlight(_) => OperationType::Highlight,
        }
    }

    fn as_annotation(&self) -> &dyn Annotation {
        match self {
            OperationKind::Text(t) => t,
            OperationKind::Rectangle(b)
            | OperationKind::Circle(b)
            | OperationKind::Eraser(b)
            | OperationKind::Highlight(b) => b,
            OperationKind::Line(l) => l,
            OperationKind::Image(i) => i,
            OperationKind::Freehand(f) => f,
        }
    }

    fn as_annotation_mut(&mut self) -> &mut dyn Annotation {
        match self {
            OperationKind::Text(t) => t,
            OperationKind::Rectangle(b)
            | OperationKind::Circle(b)
            | OperationKind::Eraser(b)
            | OperationKind::Highlight(b) => b,
            OperationKind::Line(l) => l,
            OperationKind::Image(i) => i,
            OperationKind::Freehand(f) => f,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.as_annotation().bounds()
    }

    /// Containment rule for the kind. Circles use the inscribed circle of
    /// their box; everything else defers to its own geometry.
    pub fn contains(&self, point: PagePoint, tolerance: f64) -> bool {
        match self {
            OperationKind::Circle(b) => b.circle_contains(point, tolerance),
            other => other.as_annotation().contains(point, tolerance),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.as_annotation_mut().translate(delta);
    }
}

/// One annotation placed on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOperation {
    id: OpId,
    page: usize,
    #[serde(flatten)]
    kind: OperationKind,
}

impl EditOperation {
    /// Create an operation with a fresh id.
    pub fn new(page: usize, kind: OperationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            kind,
        }
    }

    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn operation_type(&self) -> OperationType {
        self.kind.operation_type()
    }

    pub fn bounds(&self) -> Rect {
        self.kind.bounds()
    }

    pub fn contains(&self, point: PagePoint, tolerance: f64) -> bool {
        self.kind.contains(point, tolerance)
    }

    /// Translate the geometry. Only the document mutates operations.
    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.kind.translate(delta);
    }

    /// Replace the geometry with a snapshot of the same kind.
    pub(crate) fn restore_kind(&mut self, kind: OperationKind) {
        debug_assert_eq!(kind.operation_type(), self.kind.operation_type());
        self.kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect_op(x1: f64, y1: f64, x2: f64, y2: f64) -> EditOperation {
        EditOperation::new(
            0,
            OperationKind::Rectangle(BoxGeometry::new(
                PagePoint::new(x1, y1),
                PagePoint::new(x2, y2),
            )),
        )
    }

    #[test]
    fn test_hex_color_parse_and_display() {
        let color = HexColor::parse("#FF8000").unwrap();
        assert_eq!(color, HexColor::new(255, 128, 0));
        assert_eq!(color.to_string(), "#ff8000");
        assert!(HexColor::parse("#12345").is_err());
        assert!(HexColor::parse("#zzzzzz").is_err());
        assert!(HexColor::parse("ff8000").is_err());
        assert!(HexColor::parse("#0f0").is_err());
        assert!(HexColor::parse("#a€bb").is_err());
        assert!(HexColor::parse("#ééé").is_err());
        assert!(serde_json::from_str::<HexColor>(r#""a€bb""#).is_err());
    }

    #[test]
    fn test_hex_color_unit_rgb() {
        let (r, g, b) = HexColor::WHITE.to_unit_rgb();
        assert!((r - 1.0).abs() < f32::EPSILON);
        assert!((g - 1.0).abs() < f32::EPSILON);
        assert!((b - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rectangle_containment() {
        let op = rect_op(10.0, 10.0, 110.0, 60.0);
        assert!(op.contains(PagePoint::new(50.0, 30.0), 0.0));
        assert!(!op.contains(PagePoint::new(200.0, 200.0), 0.0));
    }

    #[test]
    fn test_box_containment_includes_every_edge() {
        let op = rect_op(10.0, 10.0, 110.0, 60.0);
        assert!(op.contains(PagePoint::new(10.0, 30.0), 0.0));
        assert!(op.contains(PagePoint::new(110.0, 30.0), 0.0));
        assert!(op.contains(PagePoint::new(50.0, 10.0), 0.0));
        assert!(op.contains(PagePoint::new(50.0, 60.0), 0.0));
        assert!(op.contains(PagePoint::new(110.0, 60.0), 0.0));
        assert!(!op.contains(PagePoint::new(110.5, 30.0), 0.0));
        assert!(op.contains(PagePoint::new(112.0, 30.0), 2.0));
    }

    #[test]
    fn test_circle_containment_uses_inscribed_radius() {
        let op = EditOperation::new(
            0,
            OperationKind::Circle(BoxGeometry::new(
                PagePoint::new(0.0, 0.0),
                PagePoint::new(100.0, 100.0),
            )),
        );
        assert!(op.contains(PagePoint::new(50.0, 50.0), 0.0));
        assert!(!op.contains(PagePoint::new(99.0, 99.0), 0.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = rect_op(0.0, 0.0, 1.0, 1.0);
        let b = rect_op(0.0, 0.0, 1.0, 1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_serialized_form_is_tagged_by_type() {
        let op = rect_op(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["page"], 0);
        assert_eq!(json["color"], "#000000");

        let restored: EditOperation = serde_json::from_value(json).unwrap();
        assert_eq!(restored, op);
    }
}
