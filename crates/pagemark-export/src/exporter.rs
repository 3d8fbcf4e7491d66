//! Burns edit operations into a PDF with lopdf.

use crate::error::{ExportError, ExportResult};
use crate::page::{self, PageFrame};
use crate::xobject::EmbeddedImage;
use kurbo::{Affine, BezPath, Circle, PathEl, Point, Rect, Shape};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pagemark_core::operations::{
    BoxGeometry, EditOperation, FreehandStroke, HexColor, ImagePlacement, LineSegment,
    OperationKind, TextRun,
};
use pagemark_core::DocumentExporter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PATH_TOLERANCE: f64 = 0.1;
const FONT_PREFIX: &str = "PmF";
const IMAGE_PREFIX: &str = "PmIm";
/// Annotation flag bit 3: print the annotation with the page.
const ANNOT_FLAG_PRINT: i64 = 4;

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Opacity of highlight annotations.
    pub highlight_opacity: f64,
    /// Standard 14 font used for text runs.
    pub font_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            highlight_opacity: 0.4,
            font_name: "Helvetica".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Paint order on a page. Later groups draw over earlier ones; within a
/// group operations keep their list order.
fn burn_order(kind: &OperationKind) -> u8 {
    match kind {
        OperationKind::Eraser(_) => 0,
        OperationKind::Highlight(_) => 1,
        OperationKind::Rectangle(_) | OperationKind::Circle(_) | OperationKind::Line(_) => 2,
        OperationKind::Freehand(_) => 3,
        OperationKind::Text(_) => 4,
        OperationKind::Image(_) => 5,
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn color_operands(color: HexColor) -> Vec<Object> {
    let (r, g, b) = color.to_unit_rgb();
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}

fn stroke_style(color: HexColor, width: f64) -> [Operation; 2] {
    [
        Operation::new("RG", color_operands(color)),
        Operation::new("w", vec![real(width)]),
    ]
}

fn rect_operands(rect: Rect) -> Vec<Object> {
    vec![
        real(rect.x0),
        real(rect.y0),
        real(rect.width()),
        real(rect.height()),
    ]
}

/// Path construction operators for an already transformed path.
fn path_operations(path: &BezPath) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut last = Point::ZERO;
    let mut subpath_start = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                ops.push(Operation::new("m", vec![real(p.x), real(p.y)]));
                last = p;
                subpath_start = p;
            }
            PathEl::LineTo(p) => {
                ops.push(Operation::new("l", vec![real(p.x), real(p.y)]));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                let c1 = last + (p1 - last) * (2.0 / 3.0);
                let c2 = p2 + (p1 - p2) * (2.0 / 3.0);
                ops.push(Operation::new(
                    "c",
                    vec![
                        real(c1.x),
                        real(c1.y),
                        real(c2.x),
                        real(c2.y),
                        real(p2.x),
                        real(p2.y),
                    ],
                ));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                ops.push(Operation::new(
                    "c",
                    vec![
                        real(p1.x),
                        real(p1.y),
                        real(p2.x),
                        real(p2.y),
                        real(p3.x),
                        real(p3.y),
                    ],
                ));
                last = p3;
            }
            PathEl::ClosePath => {
                ops.push(Operation::new("h", vec![]));
                last = subpath_start;
            }
        }
    }
    ops
}

fn eraser_operations(geometry: &BoxGeometry, to_pdf: Affine) -> Vec<Operation> {
    let rect = to_pdf.transform_rect_bbox(geometry.rect());
    let mut ops = vec![Operation::new("rg", color_operands(HexColor::WHITE))];
    ops.extend(stroke_style(HexColor::WHITE, geometry.width));
    ops.push(Operation::new("re", rect_operands(rect)));
    ops.push(Operation::new("B", vec![]));
    ops
}

fn rectangle_operations(geometry: &BoxGeometry, to_pdf: Affine) -> Vec<Operation> {
    let rect = to_pdf.transform_rect_bbox(geometry.rect());
    let mut ops = Vec::from(stroke_style(geometry.color, geometry.width));
    ops.push(Operation::new("re", rect_operands(rect)));
    ops.push(Operation::new("S", vec![]));
    ops
}

fn circle_operations(geometry: &BoxGeometry, to_pdf: Affine) -> Vec<Operation> {
    let path = to_pdf * Circle::new(geometry.center(), geometry.radius()).to_path(PATH_TOLERANCE);
    let mut ops = Vec::from(stroke_style(geometry.color, geometry.width));
    ops.extend(path_operations(&path));
    ops.push(Operation::new("S", vec![]));
    ops
}

fn line_operations(line: &LineSegment, to_pdf: Affine) -> Vec<Operation> {
    let start = to_pdf * line.start.0;
    let end = to_pdf * line.end.0;
    let mut ops = Vec::from(stroke_style(line.color, line.width));
    ops.push(Operation::new("m", vec![real(start.x), real(start.y)]));
    ops.push(Operation::new("l", vec![real(end.x), real(end.y)]));
    ops.push(Operation::new("S", vec![]));
    ops
}

fn freehand_operations(stroke: &FreehandStroke, to_pdf: Affine) -> Vec<Operation> {
    if stroke.len() < FreehandStroke::MIN_POINTS {
        return Vec::new();
    }
    let mut ops = Vec::from(stroke_style(stroke.color, stroke.width));
    // Round caps and joins keep sampled ink from looking jagged.
    ops.push(Operation::new("J", vec![Object::Integer(1)]));
    ops.push(Operation::new("j", vec![Object::Integer(1)]));
    ops.extend(path_operations(&(to_pdf * stroke.to_path())));
    ops.push(Operation::new("S", vec![]));
    ops
}

/// Encode text for a simple font with WinAnsiEncoding. Characters outside
/// Latin-1 become `?`.
fn encode_text(content: &str) -> Vec<u8> {
    content
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn text_operations(run: &TextRun, font: &str, to_pdf: Affine) -> Vec<Operation> {
    let baseline = to_pdf * run.position.0;
    vec![
        Operation::new("rg", color_operands(run.color)),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), real(run.font_size)],
        ),
        Operation::new("Td", vec![real(baseline.x), real(baseline.y)]),
        Operation::new(
            "Tj",
            vec![Object::String(
                encode_text(&run.content),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn image_operations(placement: &ImagePlacement, name: &str, to_pdf: Affine) -> Vec<Operation> {
    let rect = to_pdf.transform_rect_bbox(placement.as_rect());
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(rect.width()),
                real(0.0),
                real(0.0),
                real(rect.height()),
                real(rect.x0),
                real(rect.y0),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// lopdf-backed [`DocumentExporter`].
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    config: ExportConfig,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Normal appearance for a highlight: the band filled with the multiply
    /// blend mode, so the text underneath stays readable.
    fn highlight_appearance(&self, color: HexColor, rect: Rect) -> ExportResult<Stream> {
        let opacity = real(self.config.highlight_opacity.clamp(0.0, 1.0));
        let content = Content {
            operations: vec![
                Operation::new("gs", vec![Object::Name(b"PmHl".to_vec())]),
                Operation::new("rg", color_operands(color)),
                Operation::new("re", rect_operands(rect)),
                Operation::new("f", vec![]),
            ],
        }
        .encode()
        .map_err(|e| ExportError::Write(e.to_string()))?;
        let bbox = vec![real(rect.x0), real(rect.y0), real(rect.x1), real(rect.y1)];
        Ok(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => bbox,
                "Resources" => dictionary! {
                    "ExtGState" => dictionary! {
                        "PmHl" => dictionary! {
                            "Type" => "ExtGState",
                            "BM" => "Multiply",
                            "ca" => opacity.clone(),
                            "CA" => opacity,
                        },
                    },
                },
            },
            content,
        ))
    }

    fn highlight_annotation(
        &self,
        geometry: &BoxGeometry,
        to_pdf: Affine,
        appearance: ObjectId,
    ) -> Dictionary {
        let rect = to_pdf.transform_rect_bbox(geometry.rect());
        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
        annot.set(
            "Rect",
            Object::Array(vec![
                real(rect.x0),
                real(rect.y0),
                real(rect.x1),
                real(rect.y1),
            ]),
        );
        // Upper-left, upper-right, lower-left, lower-right.
        annot.set(
            "QuadPoints",
            Object::Array(vec![
                real(rect.x0),
                real(rect.y1),
                real(rect.x1),
                real(rect.y1),
                real(rect.x0),
                real(rect.y0),
                real(rect.x1),
                real(rect.y0),
            ]),
        );
        annot.set("C", Object::Array(color_operands(geometry.color)));
        annot.set("CA", real(self.config.highlight_opacity.clamp(0.0, 1.0)));
        annot.set("F", Object::Integer(ANNOT_FLAG_PRINT));
        annot.set("AP", dictionary! { "N" => Object::Reference(appearance) });
        annot
    }

    fn font_dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.config.font_name.as_str(),
            "Encoding" => "WinAnsiEncoding",
        }
    }

    /// Register the shared font object under a fresh name in `resources`.
    fn install_font(
        &self,
        doc: &mut Document,
        resources: &mut Dictionary,
        font_id: &mut Option<ObjectId>,
    ) -> ExportResult<String> {
        let id = match *font_id {
            Some(id) => id,
            None => {
                let id = doc.add_object(self.font_dictionary());
                *font_id = Some(id);
                id
            }
        };
        let name = page::unused_name(doc, resources, "Font", FONT_PREFIX)?;
        page::insert_resource(doc, resources, "Font", &name, Object::Reference(id))?;
        Ok(name)
    }

    fn burn_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        operations: &[&EditOperation],
        font_id: &mut Option<ObjectId>,
    ) -> ExportResult<()> {
        let to_pdf = PageFrame::load(doc, page_id)?.to_pdf();
        let mut resources = page::resources(doc, page_id)?;
        let mut resources_changed = false;
        let mut font_name: Option<String> = None;
        let mut content = Vec::new();

        for op in operations {
            match op.kind() {
                OperationKind::Eraser(b) => content.extend(eraser_operations(b, to_pdf)),
                OperationKind::Highlight(b) => {
                    let rect = to_pdf.transform_rect_bbox(b.rect());
                    let appearance = doc.add_object(self.highlight_appearance(b.color, rect)?);
                    let annot_id =
                        doc.add_object(self.highlight_annotation(b, to_pdf, appearance));
                    page::add_annotation(doc, page_id, annot_id)?;
                }
                OperationKind::Rectangle(b) => content.extend(rectangle_operations(b, to_pdf)),
                OperationKind::Circle(b) => content.extend(circle_operations(b, to_pdf)),
                OperationKind::Line(l) => content.extend(line_operations(l, to_pdf)),
                OperationKind::Freehand(f) => content.extend(freehand_operations(f, to_pdf)),
                OperationKind::Text(t) => {
                    let name = match &font_name {
                        Some(name) => name.clone(),
                        None => {
                            let name = self.install_font(doc, &mut resources, font_id)?;
                            resources_changed = true;
                            font_name = Some(name.clone());
                            name
                        }
                    };
                    content.extend(text_operations(t, &name, to_pdf));
                }
                OperationKind::Image(placement) => {
                    let image = EmbeddedImage::decode(placement)?;
                    let (width, height) = image.dimensions();
                    log::debug!(
                        "Embedding {}x{} image (alpha: {})",
                        width,
                        height,
                        image.has_alpha()
                    );
                    let image_id = image.embed(doc)?;
                    let name = page::unused_name(doc, &resources, "XObject", IMAGE_PREFIX)?;
                    page::insert_resource(
                        doc,
                        &mut resources,
                        "XObject",
                        &name,
                        Object::Reference(image_id),
                    )?;
                    resources_changed = true;
                    content.extend(image_operations(placement, &name, to_pdf));
                }
            }
        }

        if resources_changed {
            doc.get_dictionary_mut(page_id)?
                .set("Resources", Object::Dictionary(resources));
        }
        if !content.is_empty() {
            page::append_overlay(doc, page_id, content)?;
        }
        Ok(())
    }
}

impl DocumentExporter for PdfExporter {
    type Error = ExportError;

    fn export(&self, source: &[u8], operations: &[EditOperation]) -> ExportResult<Vec<u8>> {
        let mut doc =
            Document::load_mem(source).map_err(|e| ExportError::Parse(e.to_string()))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(ExportError::NoPages);
        }
        let page_count = page_ids.len();
        if let Some(op) = operations.iter().find(|op| op.page() >= page_count) {
            return Err(ExportError::InvalidPage {
                page: op.page(),
                page_count,
            });
        }

        let mut ordered: Vec<&EditOperation> = operations.iter().collect();
        ordered.sort_by_key(|op| burn_order(op.kind()));
        let mut by_page: BTreeMap<usize, Vec<&EditOperation>> = BTreeMap::new();
        for op in ordered {
            by_page.entry(op.page()).or_default().push(op);
        }

        let mut font_id = None;
        for (page, ops) in &by_page {
            self.burn_page(&mut doc, page_ids[*page], ops, &mut font_id)?;
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| ExportError::Write(e.to_string()))?;
        log::info!(
            "Burned {} operations into {} of {} pages",
            operations.len(),
            by_page.len(),
            page_count
        );
        Ok(output)
    }
}
