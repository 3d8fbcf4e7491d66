//! The seam between the editor and whatever writes edits into a document.

use crate::operations::EditOperation;

/// Burns a list of operations into a copy of the source document.
///
/// Implementations must be all-or-nothing: either the whole list is applied
/// and the new bytes returned, or an error comes back and nothing is.
pub trait DocumentExporter {
    type Error: std::error::Error;

    fn export(&self, source: &[u8], operations: &[EditOperation]) -> Result<Vec<u8>, Self::Error>;
}
