//! Page images behind the overlay.
//!
//! Rasterization is done by an external engine. Images can show up late and
//! in any order, so the cache holds a slot per page and reports each page's
//! native size as its image is delivered.

use crate::renderer::{RenderResult, RendererError};
use kurbo::Size;

/// A rasterized page in straight RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PageImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> RenderResult<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidImage(format!(
                "empty image {}x{}",
                width, height
            )));
        }
        if rgba.len() != expected {
            return Err(RendererError::InvalidImage(format!(
                "{}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn pixel_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Something that turns document pages into images.
pub trait PageRasterizer {
    /// Load the document and prepare for rendering pages.
    fn init(&mut self) -> RenderResult<()>;

    fn page_count(&self) -> usize;

    fn rasterize(&mut self, page: usize) -> RenderResult<PageImage>;
}

#[derive(Debug, Clone, Default)]
enum PageSlot {
    #[default]
    Pending,
    Ready(PageImage),
}

/// Per-page image slots for one loaded document.
#[derive(Debug, Clone)]
pub struct PageImageCache {
    slots: Vec<PageSlot>,
    /// Image pixels per page-space unit.
    pixels_per_unit: f64,
}

impl PageImageCache {
    /// Cache for `page_count` pages rasterized at one pixel per page unit.
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: vec![PageSlot::Pending; page_count],
            pixels_per_unit: 1.0,
        }
    }

    pub fn with_pixels_per_unit(mut self, pixels_per_unit: f64) -> Self {
        if pixels_per_unit > 0.0 && pixels_per_unit.is_finite() {
            self.pixels_per_unit = pixels_per_unit;
        } else {
            log::warn!("Ignoring invalid pixels-per-unit {}", pixels_per_unit);
        }
        self
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Store the image for `page` and return the page's native size.
    pub fn deliver(&mut self, page: usize, image: PageImage) -> RenderResult<Size> {
        let slot = self
            .slots
            .get_mut(page)
            .ok_or(RendererError::InvalidPage(page))?;
        let pixels = image.pixel_size();
        let native = Size::new(
            pixels.width / self.pixels_per_unit,
            pixels.height / self.pixels_per_unit,
        );
        log::debug!(
            "Page {} image arrived: {}x{} px",
            page,
            image.width,
            image.height
        );
        *slot = PageSlot::Ready(image);
        Ok(native)
    }

    pub fn get(&self, page: usize) -> Option<&PageImage> {
        match self.slots.get(page)? {
            PageSlot::Ready(image) => Some(image),
            PageSlot::Pending => None,
        }
    }

    pub fn is_ready(&self, page: usize) -> bool {
        self.get(page).is_some()
    }

    pub fn native_size(&self, page: usize) -> Option<Size> {
        self.get(page).map(|image| {
            let pixels = image.pixel_size();
            Size::new(
                pixels.width / self.pixels_per_unit,
                pixels.height / self.pixels_per_unit,
            )
        })
    }

    /// Pages still waiting for an image.
    pub fn pending(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, PageSlot::Pending))
            .map(|(page, _)| page)
            .collect()
    }

    /// Rasterize every pending page. Pages that fail stay pending; the
    /// native sizes of the pages that succeed are returned.
    pub fn fill_from(&mut self, rasterizer: &mut dyn PageRasterizer) -> Vec<(usize, Size)> {
        let mut delivered = Vec::new();
        for page in self.pending() {
            let result = rasterizer
                .rasterize(page)
                .and_then(|image| self.deliver(page, image));
            match result {
                Ok(size) => delivered.push((page, size)),
                Err(err) => log::warn!("Page {} failed to rasterize: {}", page, err),
            }
        }
        delivered
    }

    /// Drop every image, e.g. when a new document is loaded.
    pub fn reset(&mut self, page_count: usize) {
        self.slots = vec![PageSlot::Pending; page_count];
    }
}
