//! Interactive editing: tool state, gestures and selection.
//!
//! The host feeds canvas-space pointer events and key presses into an
//! [`Editor`]; the editor maps them into page space, decides whether they
//! create, select, move or delete operations, and raises the document's
//! redraw flag whenever the overlay needs repainting.

use crate::config::EditorConfig;
use crate::coords::{CanvasPoint, PagePoint, PageViewport};
use crate::document::EditDocument;
use crate::error::{EditError, EditResult};
use crate::export::DocumentExporter;
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::operations::{
    BoxGeometry, EditOperation, FreehandStroke, HexColor, ImagePayload, ImagePlacement,
    LineSegment, OpId, OperationKind, TextRun,
};
use crate::tools::{ToolKind, ToolManager, ToolStyle};
use kurbo::{Rect, Size, Vec2};

/// Where the editor is in a gesture.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    /// Nothing armed, nothing in progress.
    #[default]
    Idle,
    /// A placement tool is armed and waiting for a click or press.
    Placing,
    /// A box tool is pressed and may be dragged out to a custom size.
    Sizing {
        tool: ToolKind,
        press: CanvasPoint,
        start: PagePoint,
        current: PagePoint,
        moved: bool,
    },
    /// The selected operation follows the pointer.
    DraggingSelection {
        id: OpId,
        press: CanvasPoint,
        start: PagePoint,
        /// Geometry before the drag; every move is applied to this.
        original: OperationKind,
        moved: bool,
    },
    /// A freehand stroke is being recorded.
    DrawingFreehand { points: Vec<PagePoint> },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Placing => "placing",
            InteractionState::Sizing { .. } => "sizing",
            InteractionState::DraggingSelection { .. } => "dragging-selection",
            InteractionState::DrawingFreehand { .. } => "drawing-freehand",
        }
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            InteractionState::Sizing { .. }
                | InteractionState::DraggingSelection { .. }
                | InteractionState::DrawingFreehand { .. }
        )
    }
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Ignored,
    Created(OpId),
    Selected(OpId),
    Deselected,
    Deleted(OpId),
    SizingStarted,
    SizingUpdated,
    DragStarted(OpId),
    Dragged(OpId),
    DragEnded(OpId),
    StrokeStarted,
    StrokeExtended,
    StrokeCommitted(OpId),
    StrokeDiscarded,
    Cancelled,
}

/// The interactive editing surface for one loaded document.
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    document: EditDocument,
    tools: ToolManager,
    viewport: PageViewport,
    current_page: usize,
    state: InteractionState,
    /// Set when a gesture consumed the press so the trailing click is dropped.
    suppress_next_click: bool,
}

impl Editor {
    pub fn new(config: EditorConfig, document: EditDocument) -> Self {
        let tools = ToolManager::new(ToolStyle::from_config(&config));
        let mut editor = Self {
            config,
            document,
            tools,
            viewport: PageViewport::default(),
            current_page: 0,
            state: InteractionState::Idle,
            suppress_next_click: false,
        };
        editor.viewport.native = editor.document.page_size(0);
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &EditDocument {
        &self.document
    }

    pub fn viewport(&self) -> &PageViewport {
        &self.viewport
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn style(&self) -> ToolStyle {
        self.tools.style
    }

    /// Consume the document's redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        self.document.take_redraw()
    }

    fn rest_state(&self) -> InteractionState {
        if self.tools.current_tool.is_placement() {
            InteractionState::Placing
        } else {
            InteractionState::Idle
        }
    }

    fn enter(&mut self, state: InteractionState) {
        if self.state.name() != state.name() {
            log::debug!("Interaction {} -> {}", self.state.name(), state.name());
        }
        self.state = state;
    }

    // --- Host configuration -------------------------------------------------

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.state.is_gesture() {
            self.cancel();
        }
        self.tools.set_tool(tool);
        let rest = self.rest_state();
        self.enter(rest);
    }

    pub fn set_style(&mut self, style: ToolStyle) {
        self.tools.style = style;
    }

    pub fn set_pending_text(&mut self, text: impl Into<String>) {
        self.tools.set_pending_text(text);
    }

    /// Switch the page shown in the preview.
    pub fn set_page(&mut self, page: usize) -> EditResult<()> {
        if page >= self.document.page_count() {
            return Err(EditError::PageOutOfRange {
                page,
                page_count: self.document.page_count(),
            });
        }
        if self.state.is_gesture() {
            self.cancel();
        }
        self.current_page = page;
        self.viewport.native = self.document.page_size(page);
        self.document.clear_selection();
        self.document.request_redraw();
        Ok(())
    }

    /// Record the on-screen size of the page preview.
    pub fn set_rendered_size(&mut self, size: Size) {
        if self.viewport.rendered != size {
            self.viewport.rendered = size;
            self.document.request_redraw();
        }
    }

    /// Record where the preview's top-left corner sits on the canvas.
    pub fn set_canvas_origin(&mut self, origin: CanvasPoint) {
        if self.viewport.origin != origin {
            self.viewport.origin = origin;
            self.document.request_redraw();
        }
    }

    /// Record a page's native size once its image has loaded. Pages may
    /// arrive in any order.
    pub fn set_native_size(&mut self, page: usize, size: Size) -> EditResult<()> {
        self.document.set_page_size(page, size)?;
        if page == self.current_page {
            self.viewport.native = Some(size);
            self.document.request_redraw();
        }
        Ok(())
    }

    /// Replace the document with a fresh one of `page_count` pages.
    pub fn reset(&mut self, page_count: usize) {
        log::debug!("Resetting editor for {} pages", page_count);
        self.document = EditDocument::new(page_count);
        self.current_page = 0;
        self.viewport.native = None;
        self.suppress_next_click = false;
        self.state = self.rest_state();
    }

    /// Start editing a different document, keeping tool and style.
    pub fn load(&mut self, document: EditDocument) {
        self.reset(0);
        self.document = document;
        self.viewport.native = self.document.page_size(0);
    }

    // --- Pointer input ------------------------------------------------------

    fn map(&self, position: CanvasPoint) -> Option<PagePoint> {
        if !self.viewport.is_ready() {
            log::debug!("Ignoring pointer event before the page scale is known");
            return None;
        }
        self.viewport
            .to_page_with_policy(position, self.config.placement_policy)
    }

    fn beyond_slop(&self, press: CanvasPoint, position: CanvasPoint) -> bool {
        press.distance(position) > self.config.drag_slop
    }

    /// Dispatch a host pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> InteractionOutcome {
        match event {
            PointerEvent::Down { position, button } if button == MouseButton::Left => {
                self.pointer_down(position)
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, button } if button == MouseButton::Left => {
                self.pointer_up(position)
            }
            PointerEvent::Click { position, button } if button == MouseButton::Left => {
                self.click(position)
            }
            _ => InteractionOutcome::Ignored,
        }
    }

    pub fn pointer_down(&mut self, position: CanvasPoint) -> InteractionOutcome {
        if self.state.is_gesture() {
            return InteractionOutcome::Ignored;
        }
        let Some(point) = self.map(position) else {
            return InteractionOutcome::Ignored;
        };

        let drag_target = self
            .document
            .selected()
            .filter(|op| {
                op.page() == self.current_page && op.contains(point, self.config.hit_tolerance)
            })
            .map(|op| (op.id(), op.kind().clone()));
        if let Some((id, original)) = drag_target {
            self.enter(InteractionState::DraggingSelection {
                id,
                press: position,
                start: point,
                original,
                moved: false,
            });
            return InteractionOutcome::DragStarted(id);
        }

        let tool = self.tools.current_tool;
        if tool == ToolKind::Freehand {
            self.enter(InteractionState::DrawingFreehand {
                points: vec![point],
            });
            self.document.request_redraw();
            return InteractionOutcome::StrokeStarted;
        }
        if tool.is_sizable() {
            self.enter(InteractionState::Sizing {
                tool,
                press: position,
                start: point,
                current: point,
                moved: false,
            });
            return InteractionOutcome::SizingStarted;
        }
        InteractionOutcome::Ignored
    }

    pub fn pointer_move(&mut self, position: CanvasPoint) -> InteractionOutcome {
        if !self.state.is_gesture() {
            return InteractionOutcome::Ignored;
        }
        let Some(point) = self.map(position) else {
            return InteractionOutcome::Ignored;
        };
        let slop_exceeded = match &self.state {
            InteractionState::Sizing { press, .. }
            | InteractionState::DraggingSelection { press, .. } => {
                self.beyond_slop(*press, position)
            }
            _ => false,
        };

        match &mut self.state {
            InteractionState::DrawingFreehand { points } => {
                points.push(point);
                self.document.request_redraw();
                InteractionOutcome::StrokeExtended
            }
            InteractionState::Sizing { current, moved, .. } => {
                *current = point;
                *moved |= slop_exceeded;
                self.document.request_redraw();
                InteractionOutcome::SizingUpdated
            }
            InteractionState::DraggingSelection {
                id,
                start,
                original,
                moved,
                ..
            } => {
                *moved |= slop_exceeded;
                if !*moved {
                    return InteractionOutcome::Ignored;
                }
                let id = *id;
                let delta = point.delta_from(*start);
                let original = original.clone();
                self.document.restore(id, original);
                self.document.translate(id, delta);
                InteractionOutcome::Dragged(id)
            }
            InteractionState::Idle | InteractionState::Placing => InteractionOutcome::Ignored,
        }
    }

    pub fn pointer_up(&mut self, position: CanvasPoint) -> InteractionOutcome {
        if !self.state.is_gesture() {
            return InteractionOutcome::Ignored;
        }
        // Apply the release position like a final move.
        if !matches!(self.state, InteractionState::DrawingFreehand { .. }) {
            self.pointer_move(position);
        }
        let rest = self.rest_state();
        let finished = std::mem::replace(&mut self.state, rest);
        log::debug!("Interaction {} -> {}", finished.name(), self.state.name());

        match finished {
            InteractionState::DrawingFreehand { points } => {
                self.suppress_next_click = true;
                self.document.request_redraw();
                if points.len() < FreehandStroke::MIN_POINTS {
                    return InteractionOutcome::StrokeDiscarded;
                }
                let style = self.tools.style;
                let stroke = FreehandStroke::from_points(points)
                    .with_color(style.color)
                    .with_width(style.stroke_width);
                match self.commit(OperationKind::Freehand(stroke)) {
                    Some(id) => InteractionOutcome::StrokeCommitted(id),
                    None => InteractionOutcome::StrokeDiscarded,
                }
            }
            InteractionState::Sizing {
                tool,
                start,
                current,
                moved,
                ..
            } => {
                if !moved {
                    return InteractionOutcome::Ignored;
                }
                self.suppress_next_click = true;
                match self
                    .sized_kind(tool, start, current)
                    .and_then(|kind| self.commit(kind))
                {
                    Some(id) => InteractionOutcome::Created(id),
                    None => InteractionOutcome::Ignored,
                }
            }
            InteractionState::DraggingSelection { id, moved, .. } => {
                if moved {
                    self.suppress_next_click = true;
                    InteractionOutcome::DragEnded(id)
                } else {
                    InteractionOutcome::Ignored
                }
            }
            InteractionState::Idle | InteractionState::Placing => InteractionOutcome::Ignored,
        }
    }

    /// Handle a click: select what is under the pointer, or place a new
    /// operation with the armed tool.
    pub fn click(&mut self, position: CanvasPoint) -> InteractionOutcome {
        if std::mem::take(&mut self.suppress_next_click) {
            return InteractionOutcome::Ignored;
        }
        if self.state.is_gesture() {
            return InteractionOutcome::Ignored;
        }
        let Some(point) = self.map(position) else {
            return InteractionOutcome::Ignored;
        };

        if let Some(id) =
            self.document
                .operation_at(self.current_page, point, self.config.hit_tolerance)
        {
            self.document.select(id);
            return InteractionOutcome::Selected(id);
        }

        let tool = self.tools.current_tool;
        if !tool.is_placement() {
            if self.document.selection().is_some() {
                self.document.clear_selection();
                return InteractionOutcome::Deselected;
            }
            return InteractionOutcome::Ignored;
        }

        let Some(kind) = self.placed_kind(tool, point) else {
            return InteractionOutcome::Ignored;
        };
        match self.commit(kind) {
            Some(id) => InteractionOutcome::Created(id),
            None => InteractionOutcome::Ignored,
        }
    }

    fn commit(&mut self, kind: OperationKind) -> Option<OpId> {
        match self
            .document
            .add(EditOperation::new(self.current_page, kind))
        {
            Ok(id) => {
                self.document.clear_selection();
                Some(id)
            }
            Err(err) => {
                log::warn!("Dropping new operation: {}", err);
                None
            }
        }
    }

    /// Operation a single click places at `point`.
    fn placed_kind(&self, tool: ToolKind, point: PagePoint) -> Option<OperationKind> {
        let style = self.tools.style;
        let config = &self.config;
        let boxed = |size: Size| {
            BoxGeometry::from_origin(point, size.width, size.height)
                .with_width(style.stroke_width)
        };
        let kind = match tool {
            ToolKind::Text => {
                let Some(text) = self.tools.pending_text() else {
                    log::debug!("Text tool clicked with no pending text");
                    return None;
                };
                OperationKind::Text(
                    TextRun::new(point, text)
                        .with_font_size(style.font_size)
                        .with_color(style.color),
                )
            }
            ToolKind::Rectangle => {
                OperationKind::Rectangle(boxed(config.default_box_size).with_color(style.color))
            }
            ToolKind::Circle => {
                let d = config.default_circle_size;
                OperationKind::Circle(boxed(Size::new(d, d)).with_color(style.color))
            }
            ToolKind::Line => OperationKind::Line(
                LineSegment::new(
                    point,
                    point.translate(Vec2::new(config.default_line_length, 0.0)),
                )
                .with_color(style.color)
                .with_width(style.stroke_width),
            ),
            ToolKind::Highlight => OperationKind::Highlight(
                boxed(config.default_box_size).with_color(config.highlight_color),
            ),
            ToolKind::Eraser => {
                OperationKind::Eraser(boxed(config.default_box_size).with_color(HexColor::WHITE))
            }
            ToolKind::Select | ToolKind::Freehand | ToolKind::Image => return None,
        };
        Some(kind)
    }

    /// Operation a press-drag-release spans from `start` to `end`.
    fn sized_kind(&self, tool: ToolKind, start: PagePoint, end: PagePoint) -> Option<OperationKind> {
        let style = self.tools.style;
        let boxed = BoxGeometry::new(start, end).with_width(style.stroke_width);
        let kind = match tool {
            ToolKind::Rectangle => OperationKind::Rectangle(boxed.with_color(style.color)),
            ToolKind::Circle => OperationKind::Circle(boxed.with_color(style.color)),
            ToolKind::Highlight => {
                OperationKind::Highlight(boxed.with_color(self.config.highlight_color))
            }
            ToolKind::Eraser => OperationKind::Eraser(boxed.with_color(HexColor::WHITE)),
            ToolKind::Line => OperationKind::Line(
                LineSegment::new(start, end)
                    .with_color(style.color)
                    .with_width(style.stroke_width),
            ),
            _ => return None,
        };
        Some(kind)
    }

    /// The not-yet-committed geometry of the current gesture, for live drawing.
    pub fn preview(&self) -> Option<OperationKind> {
        let style = self.tools.style;
        match &self.state {
            InteractionState::DrawingFreehand { points } => Some(OperationKind::Freehand(
                FreehandStroke::from_points(points.clone())
                    .with_color(style.color)
                    .with_width(style.stroke_width),
            )),
            InteractionState::Sizing {
                tool,
                start,
                current,
                moved: true,
                ..
            } => self.sized_kind(*tool, *start, *current),
            _ => None,
        }
    }

    // --- Keyboard and commands ---------------------------------------------

    pub fn key(&mut self, event: KeyEvent) -> InteractionOutcome {
        match event {
            KeyEvent::Pressed(Key::Escape) => self.cancel(),
            KeyEvent::Pressed(Key::Delete | Key::Backspace) => match self.delete_selected() {
                Some(id) => InteractionOutcome::Deleted(id),
                None => InteractionOutcome::Ignored,
            },
            _ => InteractionOutcome::Ignored,
        }
    }

    /// Abort the current gesture. A dragged operation returns to where it
    /// started. With no gesture in progress this clears the selection.
    pub fn cancel(&mut self) -> InteractionOutcome {
        let rest = self.rest_state();
        match std::mem::replace(&mut self.state, rest) {
            InteractionState::DraggingSelection { id, original, .. } => {
                self.document.restore(id, original);
            }
            InteractionState::Sizing { .. } | InteractionState::DrawingFreehand { .. } => {
                self.document.request_redraw();
            }
            InteractionState::Idle | InteractionState::Placing => {
                if self.document.selection().is_some() {
                    self.document.clear_selection();
                    return InteractionOutcome::Deselected;
                }
                return InteractionOutcome::Ignored;
            }
        }
        // The release of the aborted press still produces a click.
        self.suppress_next_click = true;
        log::debug!("Gesture cancelled");
        InteractionOutcome::Cancelled
    }

    /// Remove the selected operation.
    pub fn delete_selected(&mut self) -> Option<OpId> {
        if matches!(self.state, InteractionState::DraggingSelection { .. }) {
            self.cancel();
        }
        let removed = self.document.delete_selected()?;
        log::debug!("Deleted {} {}", removed.operation_type(), removed.id());
        Some(removed.id())
    }

    /// Remove every operation on every page.
    pub fn clear(&mut self) -> usize {
        if self.state.is_gesture() {
            self.cancel();
        }
        self.document.clear()
    }

    // --- Direct placement ---------------------------------------------------

    /// Highlight a page-space rectangle, e.g. a text selection from the host.
    pub fn add_highlight(&mut self, page: usize, rect: Rect) -> EditResult<OpId> {
        let geometry = BoxGeometry::new(
            PagePoint::new(rect.x0, rect.y0),
            PagePoint::new(rect.x1, rect.y1),
        )
        .with_color(self.config.highlight_color);
        self.document
            .add(EditOperation::new(page, OperationKind::Highlight(geometry)))
    }

    /// Cover a page-space rectangle with an opaque white box.
    pub fn add_eraser(&mut self, page: usize, rect: Rect) -> EditResult<OpId> {
        let geometry = BoxGeometry::new(
            PagePoint::new(rect.x0, rect.y0),
            PagePoint::new(rect.x1, rect.y1),
        )
        .with_color(HexColor::WHITE);
        self.document
            .add(EditOperation::new(page, OperationKind::Eraser(geometry)))
    }

    /// Place an image. The payload must be valid base64 or a base64 data URI.
    pub fn add_image(
        &mut self,
        page: usize,
        position: PagePoint,
        size: Size,
        data_uri: impl Into<String>,
    ) -> EditResult<OpId> {
        let data_uri = data_uri.into();
        ImagePayload::from_data_uri(&data_uri)?;
        let placement = ImagePlacement::new(position, size.width, size.height, data_uri);
        self.document
            .add(EditOperation::new(page, OperationKind::Image(placement)))
    }

    // --- Export -------------------------------------------------------------

    /// Hand the source bytes and every operation to an exporter. The
    /// operation list is left untouched, so a failed export can be retried.
    pub fn export<E: DocumentExporter>(
        &self,
        exporter: &E,
        source: &[u8],
    ) -> Result<Vec<u8>, E::Error> {
        let operations = self.document.operations();
        log::info!(
            "Exporting {} operations over {} pages",
            operations.len(),
            self.document.page_count()
        );
        exporter.export(source, operations)
    }
}
