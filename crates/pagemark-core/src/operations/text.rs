//! Text operations.

use super::{Annotation, HexColor};
use crate::coords::PagePoint;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A single line of text anchored at its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Left end of the baseline.
    pub position: PagePoint,
    pub content: String,
    pub font_size: f64,
    pub color: HexColor,
}

impl TextRun {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    /// Average glyph advance as a fraction of the font size.
    pub const CHAR_WIDTH_FACTOR: f64 = 0.6;

    pub fn new(position: PagePoint, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            color: HexColor::BLACK,
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = color;
        self
    }

    /// Estimated advance width of the rendered run.
    pub fn estimated_width(&self) -> f64 {
        self.content.chars().count() as f64 * self.font_size * Self::CHAR_WIDTH_FACTOR
    }
}

impl Annotation for TextRun {
    /// One font size tall, sitting on the baseline.
    fn bounds(&self) -> Rect {
        let x = self.position.x();
        let y = self.position.y();
        Rect::new(x, y - self.font_size, x + self.estimated_width(), y)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position = self.position.translate(delta);
    }
}
