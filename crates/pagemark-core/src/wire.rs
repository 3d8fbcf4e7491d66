//! The flat JSON edits format consumed by the command-line burn-in.
//!
//! Each entry is an object tagged by `"type"` with loosely-typed fields and
//! generous defaults, e.g.
//!
//! ```json
//! [
//!   {"type": "text", "page": 0, "x": 72, "y": 96, "text": "Approved", "fontSize": 14},
//!   {"type": "rectangle", "page": 0, "x1": 50, "y1": 50, "x2": 150, "y2": 90, "width": 2},
//!   {"type": "freehand", "page": 1, "points": [{"x": 1, "y": 2}, {"x": 3, "y": 4}]}
//! ]
//! ```

use crate::coords::PagePoint;
use crate::error::EditResult;
use crate::operations::{
    BoxGeometry, EditOperation, FreehandStroke, HexColor, ImagePlacement, LineSegment,
    OperationKind, OperationType, TextRun,
};
use serde::{Deserialize, Serialize};

const KNOWN_TYPES: [OperationType; 8] = [
    OperationType::Text,
    OperationType::Rectangle,
    OperationType::Circle,
    OperationType::Line,
    OperationType::Image,
    OperationType::Freehand,
    OperationType::Eraser,
    OperationType::Highlight,
];

/// One entry of an edits file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEdit {
    #[serde(default)]
    pub page: usize,
    #[serde(flatten)]
    pub body: LegacyBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LegacyBody {
    Text(LegacyText),
    Rectangle(LegacyBox),
    Circle(LegacyBox),
    Line(LegacyBox),
    Eraser(LegacyBox),
    Highlight(LegacyHighlight),
    Freehand(LegacyFreehand),
    Image(LegacyImage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyText {
    #[serde(default = "default_origin")]
    pub x: f64,
    #[serde(default = "default_origin")]
    pub y: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_ink")]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBox {
    #[serde(default = "default_origin")]
    pub x1: f64,
    #[serde(default = "default_origin")]
    pub y1: f64,
    #[serde(default = "default_far")]
    pub x2: f64,
    #[serde(default = "default_far")]
    pub y2: f64,
    #[serde(default = "default_ink")]
    pub color: String,
    #[serde(default = "default_box_width")]
    pub width: f64,
}

/// Highlights default to a short yellow band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyHighlight {
    #[serde(default = "default_origin")]
    pub x1: f64,
    #[serde(default = "default_origin")]
    pub y1: f64,
    #[serde(default = "default_far")]
    pub x2: f64,
    #[serde(default = "default_highlight_bottom")]
    pub y2: f64,
    #[serde(default = "default_highlight")]
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyFreehand {
    #[serde(default)]
    pub points: Vec<LegacyPoint>,
    #[serde(default = "default_ink")]
    pub color: String,
    #[serde(default = "default_stroke_width")]
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImage {
    #[serde(default = "default_origin")]
    pub x: f64,
    #[serde(default = "default_origin")]
    pub y: f64,
    #[serde(default = "default_image_size")]
    pub width: f64,
    #[serde(default = "default_image_size")]
    pub height: f64,
    #[serde(default)]
    pub image_data: String,
}

fn default_origin() -> f64 {
    100.0
}

fn default_far() -> f64 {
    200.0
}

fn default_highlight_bottom() -> f64 {
    120.0
}

fn default_font_size() -> f64 {
    12.0
}

fn default_box_width() -> f64 {
    1.0
}

fn default_stroke_width() -> f64 {
    2.0
}

fn default_image_size() -> f64 {
    100.0
}

fn default_ink() -> String {
    HexColor::BLACK.to_string()
}

fn default_highlight() -> String {
    HexColor::YELLOW.to_string()
}

/// Parse a color, falling back to `fallback` for anything unreadable.
fn lenient_color(value: &str, fallback: HexColor) -> HexColor {
    HexColor::parse(value).unwrap_or_else(|_| {
        log::warn!("Unreadable color {:?}, using {}", value, fallback);
        fallback
    })
}

impl LegacyEdit {
    pub fn operation_type(&self) -> OperationType {
        match &self.body {
            LegacyBody::Text(_) => OperationType::Text,
            LegacyBody::Rectangle(_) => OperationType::Rectangle,
            LegacyBody::Circle(_) => OperationType::Circle,
            LegacyBody::Line(_) => OperationType::Line,
            LegacyBody::Eraser(_) => OperationType::Eraser,
            LegacyBody::Highlight(_) => OperationType::Highlight,
            LegacyBody::Freehand(_) => OperationType::Freehand,
            LegacyBody::Image(_) => OperationType::Image,
        }
    }

    /// Convert to an edit operation with a fresh id.
    ///
    /// Returns `None` for entries that carry nothing to draw: blank text,
    /// strokes with fewer than two points and images without data.
    pub fn into_operation(self) -> Option<EditOperation> {
        let boxed = |b: LegacyBox, fallback: HexColor| {
            BoxGeometry::new(PagePoint::new(b.x1, b.y1), PagePoint::new(b.x2, b.y2))
                .with_color(lenient_color(&b.color, fallback))
                .with_width(b.width)
        };
        let kind = match self.body {
            LegacyBody::Text(t) => {
                if t.text.is_empty() {
                    return None;
                }
                OperationKind::Text(
                    TextRun::new(PagePoint::new(t.x, t.y), t.text)
                        .with_font_size(t.font_size)
                        .with_color(lenient_color(&t.color, HexColor::BLACK)),
                )
            }
            LegacyBody::Rectangle(b) => OperationKind::Rectangle(boxed(b, HexColor::BLACK)),
            LegacyBody::Circle(b) => OperationKind::Circle(boxed(b, HexColor::BLACK)),
            LegacyBody::Eraser(b) => {
                OperationKind::Eraser(boxed(b, HexColor::BLACK).with_color(HexColor::WHITE))
            }
            LegacyBody::Line(b) => OperationKind::Line(
                LineSegment::new(PagePoint::new(b.x1, b.y1), PagePoint::new(b.x2, b.y2))
                    .with_color(lenient_color(&b.color, HexColor::BLACK))
                    .with_width(b.width),
            ),
            LegacyBody::Highlight(h) => OperationKind::Highlight(
                BoxGeometry::new(PagePoint::new(h.x1, h.y1), PagePoint::new(h.x2, h.y2))
                    .with_color(lenient_color(&h.color, HexColor::YELLOW)),
            ),
            LegacyBody::Freehand(f) => {
                if f.points.len() < FreehandStroke::MIN_POINTS {
                    return None;
                }
                let points = f.points.iter().map(|p| PagePoint::new(p.x, p.y)).collect();
                OperationKind::Freehand(
                    FreehandStroke::from_points(points)
                        .with_color(lenient_color(&f.color, HexColor::BLACK))
                        .with_width(f.width),
                )
            }
            LegacyBody::Image(i) => {
                if i.image_data.is_empty() {
                    return None;
                }
                OperationKind::Image(ImagePlacement::new(
                    PagePoint::new(i.x, i.y),
                    i.width,
                    i.height,
                    i.image_data,
                ))
            }
        };
        Some(EditOperation::new(self.page, kind))
    }

    /// Describe an operation in the edits-file format.
    pub fn from_operation(operation: &EditOperation) -> Self {
        let boxed = |b: &BoxGeometry| LegacyBox {
            x1: b.start.x(),
            y1: b.start.y(),
            x2: b.end.x(),
            y2: b.end.y(),
            color: b.color.to_string(),
            width: b.width,
        };
        let body = match operation.kind() {
            OperationKind::Text(t) => LegacyBody::Text(LegacyText {
                x: t.position.x(),
                y: t.position.y(),
                text: t.content.clone(),
                font_size: t.font_size,
                color: t.color.to_string(),
            }),
            OperationKind::Rectangle(b) => LegacyBody::Rectangle(boxed(b)),
            OperationKind::Circle(b) => LegacyBody::Circle(boxed(b)),
            OperationKind::Eraser(b) => LegacyBody::Eraser(boxed(b)),
            OperationKind::Line(l) => LegacyBody::Line(LegacyBox {
                x1: l.start.x(),
                y1: l.start.y(),
                x2: l.end.x(),
                y2: l.end.y(),
                color: l.color.to_string(),
                width: l.width,
            }),
            OperationKind::Highlight(b) => LegacyBody::Highlight(LegacyHighlight {
                x1: b.start.x(),
                y1: b.start.y(),
                x2: b.end.x(),
                y2: b.end.y(),
                color: b.color.to_string(),
            }),
            OperationKind::Freehand(f) => LegacyBody::Freehand(LegacyFreehand {
                points: f
                    .points
                    .iter()
                    .map(|p| LegacyPoint { x: p.x(), y: p.y() })
                    .collect(),
                color: f.color.to_string(),
                width: f.width,
            }),
            OperationKind::Image(i) => LegacyBody::Image(LegacyImage {
                x: i.position.x(),
                y: i.position.y(),
                width: i.width,
                height: i.height,
                image_data: i.data_uri.clone(),
            }),
        };
        Self {
            page: operation.page(),
            body,
        }
    }
}

/// Parse an edits file.
///
/// Entries whose `"type"` is missing or unrecognized are skipped with a
/// warning. A known entry with malformed fields is an error.
pub fn parse_edits(json: &str) -> EditResult<Vec<LegacyEdit>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut edits = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let kind = entry.get("type").and_then(|t| t.as_str());
        match kind {
            Some(kind) if KNOWN_TYPES.iter().any(|t| t.name() == kind) => {
                edits.push(serde_json::from_value::<LegacyEdit>(entry)?);
            }
            Some(kind) => log::warn!("Skipping edit {}: unknown type {:?}", index, kind),
            None => log::warn!("Skipping edit {}: no type", index),
        }
    }
    Ok(edits)
}

/// Write operations as an edits file.
pub fn edits_to_json(operations: &[EditOperation]) -> EditResult<String> {
    let edits: Vec<LegacyEdit> = operations.iter().map(LegacyEdit::from_operation).collect();
    Ok(serde_json::to_string_pretty(&edits)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields_take_defaults() {
        let edits = parse_edits(r#"[{"type": "rectangle"}, {"type": "highlight", "page": 2}]"#)
            .unwrap();
        assert_eq!(edits.len(), 2);

        let rect = edits[0].clone().into_operation().unwrap();
        assert_eq!(rect.page(), 0);
        assert_eq!(rect.bounds(), Rect::new(100.0, 100.0, 200.0, 200.0));

        let highlight = edits[1].clone().into_operation().unwrap();
        assert_eq!(highlight.page(), 2);
        assert_eq!(highlight.bounds(), Rect::new(100.0, 100.0, 200.0, 120.0));
        let OperationKind::Highlight(geometry) = highlight.kind() else {
            panic!("expected highlight");
        };
        assert_eq!(geometry.color, HexColor::YELLOW);
    }

    #[test]
    fn test_text_fields_are_camel_case() {
        let edits = parse_edits(
            r##"[{"type": "text", "x": 72, "y": 96, "text": "Approved", "fontSize": 14, "color": "#FF0000"}]"##,
        )
        .unwrap();
        let op = edits[0].clone().into_operation().unwrap();
        let OperationKind::Text(run) = op.kind() else {
            panic!("expected text");
        };
        assert_eq!(run.content, "Approved");
        assert_eq!(run.position, PagePoint::new(72.0, 96.0));
        assert!((run.font_size - 14.0).abs() < f64::EPSILON);
        assert_eq!(run.color, HexColor::new(255, 0, 0));
    }

    #[test]
    fn test_unknown_and_untyped_entries_are_skipped() {
        let edits = parse_edits(
            r#"[
                {"type": "stamp"},
                {"page": 0},
                {"type": 7},
                {"type": "line", "page": 1}
            ]"#,
        )
        .unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].operation_type(), OperationType::Line);
        assert_eq!(edits[0].page, 1);
    }

    #[test]
    fn test_malformed_known_entry_is_an_error() {
        assert!(parse_edits(r#"[{"type": "line", "x1": "left"}]"#).is_err());
        assert!(parse_edits(r#"{"type": "line"}"#).is_err());
    }

    #[test]
    fn test_empty_entries_produce_nothing() {
        let edits = parse_edits(
            r#"[
                {"type": "text", "text": ""},
                {"type": "freehand", "points": [{"x": 1, "y": 1}]},
                {"type": "image"}
            ]"#,
        )
        .unwrap();
        assert!(edits.into_iter().all(|e| e.into_operation().is_none()));
    }

    #[test]
    fn test_bad_color_falls_back() {
        let edits = parse_edits(r#"[{"type": "line", "color": "red"}]"#).unwrap();
        let op = edits[0].clone().into_operation().unwrap();
        let OperationKind::Line(line) = op.kind() else {
            panic!("expected line");
        };
        assert_eq!(line.color, HexColor::BLACK);

        for color in ["a€bb", "#a€bb", "ff0000", "#€€"] {
            let json = serde_json::json!([{"type": "line", "color": color}]).to_string();
            let op = parse_edits(&json).unwrap().remove(0).into_operation().unwrap();
            let OperationKind::Line(line) = op.kind() else {
                panic!("expected line");
            };
            assert_eq!(line.color, HexColor::BLACK, "color {:?}", color);
        }
    }

    #[test]
    fn test_written_edits_read_back() {
        let ops = vec![
            EditOperation::new(
                1,
                OperationKind::Freehand(FreehandStroke::from_points(vec![
                    PagePoint::new(1.0, 2.0),
                    PagePoint::new(3.0, 4.0),
                ])),
            ),
            EditOperation::new(
                0,
                OperationKind::Eraser(
                    BoxGeometry::new(PagePoint::new(5.0, 5.0), PagePoint::new(15.0, 25.0))
                        .with_color(HexColor::WHITE),
                ),
            ),
        ];
        let json = edits_to_json(&ops).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["type"], "freehand");
        assert_eq!(value[1]["x2"], 15.0);

        let restored: Vec<_> = parse_edits(&json)
            .unwrap()
            .into_iter()
            .filter_map(LegacyEdit::into_operation)
            .collect();
        assert_eq!(restored.len(), 2);
        for (before, after) in ops.iter().zip(&restored) {
            assert_eq!(before.page(), after.page());
            assert_eq!(before.kind(), after.kind());
        }
    }
}
