//! PageMark Render Library
//!
//! Overlay renderer abstraction, a display-list implementation, and the
//! page-image cache that sits behind the overlay.

pub mod raster;
mod renderer;
pub mod scene;

pub use raster::{PageImage, PageImageCache, PageRasterizer};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use scene::{DrawCommand, SceneRenderer};
