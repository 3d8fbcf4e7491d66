//! Export errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    #[error("PDF has no pages")]
    NoPages,
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    InvalidPage { page: usize, page_count: usize },
    #[error("Page structure error: {0}")]
    PageStructure(String),
    #[error("Image could not be embedded: {0}")]
    Image(String),
    #[error("Failed to write PDF: {0}")]
    Write(String),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::PageStructure(err.to_string())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
