//! Display-list renderer.
//!
//! Records the overlay as a flat list of canvas-space draw commands that a
//! host paints with whatever 2D API it has.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape};
use pagemark_core::OpId;
use pagemark_core::operations::OperationKind;
use peniko::Color;

const PATH_TOLERANCE: f64 = 0.1;

/// Dash pattern of the selection outline, in canvas pixels.
pub const SELECTION_DASH: [f64; 2] = [4.0, 4.0];

/// One canvas-space drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole overlay to transparent.
    Clear,
    FillPath {
        path: BezPath,
        color: Color,
    },
    StrokePath {
        path: BezPath,
        color: Color,
        width: f64,
    },
    /// A text run; `origin` is the left end of the baseline.
    Text {
        origin: Point,
        content: String,
        font_size: f64,
        color: Color,
    },
    /// An image operation's box. The host decodes and paints the payload.
    Image {
        rect: Rect,
        source: Option<OpId>,
    },
    SelectionOutline {
        rect: Rect,
        color: Color,
        dashes: [f64; 2],
    },
}

/// Renderer that records [`DrawCommand`]s.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    initialized: bool,
    commands: Vec<DrawCommand>,
    /// Operations drawn in the last frame, in paint order.
    drawn: Vec<OpId>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn drawn_operations(&self) -> &[OpId] {
        &self.drawn
    }

    fn stroke(&mut self, path: BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::StrokePath { path, color, width });
    }

    fn fill(&mut self, path: BezPath, color: Color) {
        self.commands.push(DrawCommand::FillPath { path, color });
    }

    /// Draw one operation kind. `scale` converts page widths to pixels.
    fn render_kind(
        &mut self,
        kind: &OperationKind,
        source: Option<OpId>,
        transform: Affine,
        scale: f64,
        highlight_opacity: f64,
    ) {
        match kind {
            OperationKind::Rectangle(b) => {
                let path = transform * b.rect().to_path(PATH_TOLERANCE);
                self.stroke(path, b.color.into(), b.width * scale);
            }
            OperationKind::Circle(b) => {
                let path = transform * Circle::new(b.center(), b.radius()).to_path(PATH_TOLERANCE);
                self.stroke(path, b.color.into(), b.width * scale);
            }
            OperationKind::Highlight(b) => {
                let path = transform * b.rect().to_path(PATH_TOLERANCE);
                self.fill(path, b.color.with_alpha(highlight_opacity));
            }
            OperationKind::Eraser(b) => {
                let path = transform * b.rect().to_path(PATH_TOLERANCE);
                self.fill(path.clone(), Color::WHITE);
                self.stroke(path, Color::WHITE, b.width * scale);
            }
            OperationKind::Line(l) => {
                let path = transform * l.as_kurbo().to_path(PATH_TOLERANCE);
                self.stroke(path, l.color.into(), l.width * scale);
            }
            OperationKind::Freehand(f) => {
                if f.len() < 2 {
                    return;
                }
                self.stroke(transform * f.to_path(), f.color.into(), f.width * scale);
            }
            OperationKind::Text(t) => {
                self.commands.push(DrawCommand::Text {
                    origin: transform * t.position.0,
                    content: t.content.clone(),
                    font_size: t.font_size * scale,
                    color: t.color.into(),
                });
            }
            OperationKind::Image(i) => {
                self.commands.push(DrawCommand::Image {
                    rect: transform.transform_rect_bbox(i.as_rect()),
                    source,
                });
            }
        }
    }
}

impl Renderer for SceneRenderer {
    fn init(&mut self) -> RenderResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        if !self.initialized {
            return Err(RendererError::NotInitialized);
        }
        self.commands.clear();
        self.drawn.clear();
        self.commands.push(DrawCommand::Clear);

        let (Some(transform), Some(scale)) = (ctx.viewport.transform(), ctx.viewport.scale())
        else {
            log::debug!("Page {} has no scale yet; overlay left empty", ctx.page);
            return Ok(());
        };

        for op in ctx.document.operations_for_page(ctx.page) {
            self.render_kind(
                op.kind(),
                Some(op.id()),
                transform,
                scale,
                ctx.highlight_opacity,
            );
            self.drawn.push(op.id());
        }

        if let Some(selected) = ctx.document.selected().filter(|op| op.page() == ctx.page) {
            let padding = ctx.selection_padding;
            let rect = transform
                .transform_rect_bbox(selected.bounds())
                .inflate(padding, padding);
            self.commands.push(DrawCommand::SelectionOutline {
                rect,
                color: ctx.selection_color,
                dashes: SELECTION_DASH,
            });
        }

        if let Some(preview) = &ctx.preview {
            self.render_kind(preview, None, transform, scale, ctx.highlight_opacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use pagemark_core::operations::{BoxGeometry, EditOperation, FreehandStroke, TextRun};
    use pagemark_core::{EditDocument, PagePoint, PageViewport};
    use pretty_assertions::assert_eq;

    fn rect_op(page: usize) -> EditOperation {
        EditOperation::new(
            page,
            OperationKind::Rectangle(
                BoxGeometry::new(PagePoint::new(10.0, 10.0), PagePoint::new(110.0, 60.0))
                    .with_width(2.0),
            ),
        )
    }

    fn half_scale() -> PageViewport {
        PageViewport::with_native(Size::new(306.0, 396.0), Size::new(612.0, 792.0))
    }

    fn ready_renderer() -> SceneRenderer {
        let mut renderer = SceneRenderer::new();
        renderer.init().unwrap();
        renderer
    }

    #[test]
    fn test_build_before_init_fails() {
        let mut renderer = SceneRenderer::new();
        let document = EditDocument::new(1);
        let ctx = RenderContext::new(&document, 0, half_scale());
        assert!(matches!(
            renderer.build_scene(&ctx),
            Err(RendererError::NotInitialized)
        ));
        assert!(renderer.commands().is_empty());
    }

    #[test]
    fn test_only_current_page_is_drawn() {
        let mut document = EditDocument::new(2);
        document.add(rect_op(0)).unwrap();
        document.add(rect_op(0)).unwrap();
        let on_page_one = document.add(rect_op(1)).unwrap();

        let mut renderer = ready_renderer();
        renderer
            .build_scene(&RenderContext::new(&document, 1, half_scale()))
            .unwrap();
        assert_eq!(renderer.drawn_operations(), &[on_page_one]);
        assert_eq!(renderer.commands().len(), 2);
        assert_eq!(renderer.commands()[0], DrawCommand::Clear);
    }

    #[test]
    fn test_geometry_is_mapped_to_canvas() {
        let mut document = EditDocument::new(1);
        document.add(rect_op(0)).unwrap();

        let mut renderer = ready_renderer();
        renderer
            .build_scene(&RenderContext::new(&document, 0, half_scale()))
            .unwrap();
        let DrawCommand::StrokePath { path, width, .. } = &renderer.commands()[1] else {
            panic!("expected a stroke");
        };
        assert_eq!(path.bounding_box(), Rect::new(5.0, 5.0, 55.0, 30.0));
        assert!((width - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selected_operation_gets_padded_outline() {
        let mut document = EditDocument::new(1);
        let id = document.add(rect_op(0)).unwrap();
        document.select(id);

        let mut renderer = ready_renderer();
        renderer
            .build_scene(&RenderContext::new(&document, 0, half_scale()))
            .unwrap();
        let outline = renderer.commands().iter().find_map(|c| match c {
            DrawCommand::SelectionOutline { rect, .. } => Some(*rect),
            _ => None,
        });
        assert_eq!(outline, Some(Rect::new(1.0, 1.0, 59.0, 34.0)));
    }

    #[test]
    fn test_unscaled_viewport_only_clears() {
        let mut document = EditDocument::new(1);
        document.add(rect_op(0)).unwrap();

        let mut renderer = ready_renderer();
        let viewport = PageViewport::new(Size::new(300.0, 400.0));
        renderer
            .build_scene(&RenderContext::new(&document, 0, viewport))
            .unwrap();
        assert_eq!(renderer.commands(), &[DrawCommand::Clear]);
    }

    #[test]
    fn test_text_and_preview_are_scaled() {
        let mut document = EditDocument::new(1);
        document
            .add(EditOperation::new(
                0,
                OperationKind::Text(
                    TextRun::new(PagePoint::new(100.0, 200.0), "Hi").with_font_size(20.0),
                ),
            ))
            .unwrap();
        let preview = OperationKind::Freehand(FreehandStroke::from_points(vec![
            PagePoint::new(0.0, 0.0),
            PagePoint::new(10.0, 10.0),
        ]));

        let mut renderer = ready_renderer();
        let ctx = RenderContext::new(&document, 0, half_scale()).with_preview(Some(preview));
        renderer.build_scene(&ctx).unwrap();

        let commands = renderer.commands();
        assert_eq!(commands.len(), 3);
        let DrawCommand::Text {
            origin, font_size, ..
        } = &commands[1]
        else {
            panic!("expected text");
        };
        assert_eq!(*origin, Point::new(50.0, 100.0));
        assert!((font_size - 10.0).abs() < f64::EPSILON);
        assert!(matches!(commands[2], DrawCommand::StrokePath { .. }));
        assert_eq!(renderer.drawn_operations().len(), 1);
    }
}
