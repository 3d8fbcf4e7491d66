//! Annotation tools and the style applied to new operations.

use crate::config::EditorConfig;
use crate::operations::{HexColor, OperationType};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Text,
    Rectangle,
    Circle,
    Line,
    Freehand,
    Highlight,
    Eraser,
    Image,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Select,
        ToolKind::Text,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Line,
        ToolKind::Freehand,
        ToolKind::Highlight,
        ToolKind::Eraser,
        ToolKind::Image,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Text => "Text",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Circle => "Circle",
            ToolKind::Line => "Line",
            ToolKind::Freehand => "Freehand",
            ToolKind::Highlight => "Highlight",
            ToolKind::Eraser => "Eraser",
            ToolKind::Image => "Image",
        }
    }

    /// Tools that commit an operation on a single click.
    pub fn is_placement(self) -> bool {
        matches!(
            self,
            ToolKind::Text
                | ToolKind::Rectangle
                | ToolKind::Circle
                | ToolKind::Line
                | ToolKind::Highlight
                | ToolKind::Eraser
        )
    }

    /// Tools that can also be sized by dragging from corner to corner.
    pub fn is_sizable(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Circle
                | ToolKind::Line
                | ToolKind::Highlight
                | ToolKind::Eraser
        )
    }

    /// The operation type this tool creates, if any.
    pub fn creates(self) -> Option<OperationType> {
        match self {
            ToolKind::Select => None,
            ToolKind::Text => Some(OperationType::Text),
            ToolKind::Rectangle => Some(OperationType::Rectangle),
            ToolKind::Circle => Some(OperationType::Circle),
            ToolKind::Line => Some(OperationType::Line),
            ToolKind::Freehand => Some(OperationType::Freehand),
            ToolKind::Highlight => Some(OperationType::Highlight),
            ToolKind::Eraser => Some(OperationType::Eraser),
            ToolKind::Image => Some(OperationType::Image),
        }
    }
}

/// Style parameters supplied by the host for new operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolStyle {
    pub color: HexColor,
    /// Stroke width in page units.
    pub stroke_width: f64,
    /// Font size in page units.
    pub font_size: f64,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolStyle {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            color: config.default_color,
            stroke_width: config.default_stroke_width,
            font_size: config.default_font_size,
        }
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }
}

/// The armed tool, its style and the text waiting to be placed.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    pub current_tool: ToolKind,
    pub style: ToolStyle,
    pending_text: String,
}

impl ToolManager {
    pub fn new(style: ToolStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
    }

    pub fn set_pending_text(&mut self, text: impl Into<String>) {
        self.pending_text = text.into();
    }

    /// Text to place with the next text-tool click, if any is set.
    pub fn pending_text(&self) -> Option<&str> {
        let text = self.pending_text.trim();
        (!text.is_empty()).then_some(self.pending_text.as_str())
    }
}
