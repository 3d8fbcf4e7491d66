//! Renderer trait abstraction.

use kurbo::Size;
use pagemark_core::document::EditDocument;
use pagemark_core::editor::Editor;
use pagemark_core::operations::OperationKind;
use pagemark_core::{OpId, PageViewport};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Renderer used before init()")]
    NotInitialized,
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Page {0} does not exist")]
    InvalidPage(usize),
    #[error("Invalid page image: {0}")]
    InvalidImage(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single overlay frame.
pub struct RenderContext<'a> {
    /// The operations to draw. Rendering never mutates them.
    pub document: &'a EditDocument,
    /// Page currently shown in the preview.
    pub page: usize,
    /// Mapping from page space to the overlay's pixels.
    pub viewport: PageViewport,
    /// Selection outline color.
    pub selection_color: Color,
    /// Gap between a selected operation and its outline, in canvas pixels.
    pub selection_padding: f64,
    pub highlight_opacity: f64,
    /// Gesture geometry that is not yet an operation (live ink, sizing box).
    pub preview: Option<OperationKind>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(document: &'a EditDocument, page: usize, viewport: PageViewport) -> Self {
        Self {
            document,
            page,
            viewport,
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            selection_padding: 4.0,
            highlight_opacity: 0.4,
            preview: None,
        }
    }

    /// Capture everything an editor currently shows.
    pub fn from_editor(editor: &'a Editor) -> Self {
        let config = editor.config();
        Self {
            selection_color: config.selection_color.into(),
            selection_padding: config.selection_padding,
            highlight_opacity: config.highlight_opacity,
            preview: editor.preview(),
            ..Self::new(editor.document(), editor.current_page(), *editor.viewport())
        }
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    pub fn with_selection_padding(mut self, padding: f64) -> Self {
        self.selection_padding = padding;
        self
    }

    pub fn with_highlight_opacity(mut self, opacity: f64) -> Self {
        self.highlight_opacity = opacity;
        self
    }

    pub fn with_preview(mut self, preview: Option<OperationKind>) -> Self {
        self.preview = preview;
        self
    }

    /// Size of the overlay surface in canvas pixels.
    pub fn surface_size(&self) -> Size {
        self.viewport.rendered
    }

    pub fn is_selected(&self, id: OpId) -> bool {
        self.document.is_selected(id)
    }
}

/// Trait for overlay rendering backends.
///
/// Backends hold resources that must be set up once with [`Renderer::init`]
/// before the first frame.
pub trait Renderer: Send + Sync {
    /// Acquire backend resources.
    fn init(&mut self) -> RenderResult<()>;

    fn is_initialized(&self) -> bool;

    /// Build the draw commands for one frame: clear, every operation on the
    /// current page, the selection outline, then any live preview.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;
}
