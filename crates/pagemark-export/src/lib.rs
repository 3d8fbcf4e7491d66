//! PageMark Export Library
//!
//! Writes edit operations into a PDF: erasers and vector shapes as page
//! content, highlights as annotations, text in a standard font, and raster
//! images as XObjects.

mod error;
mod exporter;
mod page;
mod xobject;

pub use error::{ExportError, ExportResult};
pub use exporter::{ExportConfig, PdfExporter};
pub use page::{PageFrame, page_sizes};
pub use xobject::validate_image;
pub use pagemark_core::DocumentExporter;
