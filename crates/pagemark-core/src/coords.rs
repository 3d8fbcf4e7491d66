//! Coordinate mapping between the on-screen preview and page space.
//!
//! Pointer events arrive in canvas (viewport) pixels, while operations are
//! stored in page space so they survive zoom and resize of the preview.
//! The two spaces get distinct newtypes and only [`PageViewport`] converts
//! between them.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A point in page space (the page's native units, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePoint(pub Point);

/// A point in canvas space (pixels of the rendered preview).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPoint(pub Point);

impl PagePoint {
    pub const ORIGIN: PagePoint = PagePoint(Point::ZERO);

    pub fn new(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }

    pub fn x(self) -> f64 {
        self.0.x
    }

    pub fn y(self) -> f64 {
        self.0.y
    }

    /// Offset this point by a page-space delta.
    pub fn translate(self, delta: Vec2) -> Self {
        Self(self.0 + delta)
    }

    /// Vector from `other` to `self`.
    pub fn delta_from(self, other: PagePoint) -> Vec2 {
        self.0 - other.0
    }

    pub fn distance(self, other: PagePoint) -> f64 {
        self.0.distance(other.0)
    }
}

impl CanvasPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }

    pub fn x(self) -> f64 {
        self.0.x
    }

    pub fn y(self) -> f64 {
        self.0.y
    }

    pub fn distance(self, other: CanvasPoint) -> f64 {
        self.0.distance(other.0)
    }
}

/// What to do with pointer positions that fall outside the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// Pull the point back onto the nearest page edge.
    #[default]
    Clamp,
    /// Drop the event entirely.
    Reject,
}

/// The rendered preview of a single page.
///
/// `native` is the page size reported by the rasterizer; it stays `None`
/// until the page image has loaded, and no mapping is possible before then.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageViewport {
    /// Native page size in page-space units.
    pub native: Option<Size>,
    /// On-screen size of the preview in canvas pixels.
    pub rendered: Size,
    /// Canvas position of the page's top-left corner.
    pub origin: CanvasPoint,
}

impl Default for PageViewport {
    fn default() -> Self {
        Self {
            native: None,
            rendered: Size::ZERO,
            origin: CanvasPoint::default(),
        }
    }
}

impl PageViewport {
    /// Create a viewport for a preview whose native size is not yet known.
    pub fn new(rendered: Size) -> Self {
        Self {
            rendered,
            ..Self::default()
        }
    }

    /// Create a viewport with both sizes known.
    pub fn with_native(rendered: Size, native: Size) -> Self {
        Self {
            native: Some(native),
            rendered,
            origin: CanvasPoint::default(),
        }
    }

    /// Ratio of rendered width to native width, if it is usable.
    pub fn scale(&self) -> Option<f64> {
        let native = self.native?;
        if !(native.width > 0.0) || !native.width.is_finite() {
            return None;
        }
        let scale = self.rendered.width / native.width;
        (scale > 0.0 && scale.is_finite()).then_some(scale)
    }

    /// Whether pointer events can be mapped yet.
    pub fn is_ready(&self) -> bool {
        self.scale().is_some()
    }

    /// Page bounds in page space.
    pub fn page_rect(&self) -> Option<Rect> {
        self.native.map(|size| size.to_rect())
    }

    /// Transform from page space to canvas space.
    pub fn transform(&self) -> Option<Affine> {
        let scale = self.scale()?;
        Some(Affine::translate(self.origin.0.to_vec2()) * Affine::scale(scale))
    }

    /// Transform from canvas space to page space.
    pub fn inverse_transform(&self) -> Option<Affine> {
        let scale = self.scale()?;
        Some(Affine::scale(1.0 / scale) * Affine::translate(-self.origin.0.to_vec2()))
    }

    /// Map a canvas point into page space without any bounds handling.
    pub fn to_page(&self, point: CanvasPoint) -> Option<PagePoint> {
        self.inverse_transform().map(|t| PagePoint(t * point.0))
    }

    /// Map a page point into canvas space.
    pub fn to_canvas(&self, point: PagePoint) -> Option<CanvasPoint> {
        self.transform().map(|t| CanvasPoint(t * point.0))
    }

    /// Map a canvas point into page space, applying the placement policy.
    pub fn to_page_with_policy(
        &self,
        point: CanvasPoint,
        policy: PlacementPolicy,
    ) -> Option<PagePoint> {
        let mapped = self.to_page(point)?;
        let Some(bounds) = self.page_rect() else {
            return Some(mapped);
        };
        match policy {
            PlacementPolicy::Clamp => Some(PagePoint(Point::new(
                mapped.x().clamp(bounds.x0, bounds.x1),
                mapped.y().clamp(bounds.y0, bounds.y1),
            ))),
            PlacementPolicy::Reject => bounds.contains(mapped.0).then_some(mapped),
        }
    }

    /// Convert a page-space length into canvas pixels.
    pub fn length_to_canvas(&self, length: f64) -> Option<f64> {
        self.scale().map(|s| length * s)
    }

    /// Convert a canvas-pixel length into page space.
    pub fn length_to_page(&self, length: f64) -> Option<f64> {
        self.scale().map(|s| length / s)
    }

    /// Map a page-space rectangle into canvas space.
    pub fn rect_to_canvas(&self, rect: Rect) -> Option<Rect> {
        let p0 = self.to_canvas(PagePoint(Point::new(rect.x0, rect.y0)))?;
        let p1 = self.to_canvas(PagePoint(Point::new(rect.x1, rect.y1)))?;
        Some(Rect::from_points(p0.0, p1.0))
    }
}
