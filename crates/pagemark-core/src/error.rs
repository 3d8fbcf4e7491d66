//! Errors raised while building or loading edit operations.

use thiserror::Error;

/// Edit model errors.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("Invalid image payload: {0}")]
    InvalidImagePayload(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EditError {
    fn from(err: serde_json::Error) -> Self {
        EditError::Serialization(err.to_string())
    }
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;
