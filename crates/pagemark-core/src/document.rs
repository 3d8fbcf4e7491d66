//! The edit document: operations, page table and selection.

use crate::coords::PagePoint;
use crate::error::{EditError, EditResult};
use crate::operations::{EditOperation, OpId, OperationKind};
use kurbo::{Size, Vec2};

/// All edits made to one loaded document.
///
/// Operations are kept in insertion order, which doubles as paint order:
/// later operations draw over earlier ones and win hit-tests.
#[derive(Debug, Clone, Default)]
pub struct EditDocument {
    /// Native size of each page, filled in as page images arrive.
    page_sizes: Vec<Option<Size>>,
    operations: Vec<EditOperation>,
    selection: Option<OpId>,
    needs_redraw: bool,
}

impl EditDocument {
    /// Create an empty document with `page_count` pages of unknown size.
    pub fn new(page_count: usize) -> Self {
        Self {
            page_sizes: vec![None; page_count],
            operations: Vec::new(),
            selection: None,
            needs_redraw: true,
        }
    }

    /// Create a document whose page sizes are already known.
    pub fn with_page_sizes(sizes: impl IntoIterator<Item = Size>) -> Self {
        Self {
            page_sizes: sizes.into_iter().map(Some).collect(),
            ..Self::new(0)
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn page_size(&self, page: usize) -> Option<Size> {
        self.page_sizes.get(page).copied().flatten()
    }

    pub fn set_page_size(&mut self, page: usize, size: Size) -> EditResult<()> {
        self.check_page(page)?;
        self.page_sizes[page] = Some(size);
        Ok(())
    }

    fn check_page(&self, page: usize) -> EditResult<()> {
        if page < self.page_count() {
            Ok(())
        } else {
            Err(EditError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
        }
    }

    /// Append an operation. Fails if its page is not in the document.
    pub fn add(&mut self, operation: EditOperation) -> EditResult<OpId> {
        self.check_page(operation.page())?;
        let id = operation.id();
        log::debug!(
            "Added {} {} on page {}",
            operation.operation_type(),
            id,
            operation.page()
        );
        self.operations.push(operation);
        self.needs_redraw = true;
        Ok(id)
    }

    /// Remove an operation, clearing the selection if it pointed at it.
    pub fn remove(&mut self, id: OpId) -> Option<EditOperation> {
        let index = self.operations.iter().position(|op| op.id() == id)?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.needs_redraw = true;
        Some(self.operations.remove(index))
    }

    /// Remove every operation. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.operations.len();
        self.operations.clear();
        self.selection = None;
        self.needs_redraw = true;
        count
    }

    pub fn get(&self, id: OpId) -> Option<&EditOperation> {
        self.operations.iter().find(|op| op.id() == id)
    }

    fn get_mut(&mut self, id: OpId) -> Option<&mut EditOperation> {
        self.operations.iter_mut().find(|op| op.id() == id)
    }

    /// All operations in paint order.
    pub fn operations(&self) -> &[EditOperation] {
        &self.operations
    }

    /// Operations on one page, in paint order.
    pub fn operations_for_page(&self, page: usize) -> impl Iterator<Item = &EditOperation> {
        self.operations.iter().filter(move |op| op.page() == page)
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Operations on `page` containing `point`, topmost first.
    pub fn operations_at(&self, page: usize, point: PagePoint, tolerance: f64) -> Vec<OpId> {
        self.operations
            .iter()
            .rev()
            .filter(|op| op.page() == page && op.contains(point, tolerance))
            .map(|op| op.id())
            .collect()
    }

    /// The topmost operation on `page` containing `point`.
    pub fn operation_at(&self, page: usize, point: PagePoint, tolerance: f64) -> Option<OpId> {
        self.operations
            .iter()
            .rev()
            .find(|op| op.page() == page && op.contains(point, tolerance))
            .map(|op| op.id())
    }

    /// Select an operation, replacing any previous selection.
    pub fn select(&mut self, id: OpId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.selection != Some(id) {
            self.selection = Some(id);
            self.needs_redraw = true;
        }
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.needs_redraw = true;
        }
    }

    pub fn selection(&self) -> Option<OpId> {
        self.selection
    }

    pub fn is_selected(&self, id: OpId) -> bool {
        self.selection == Some(id)
    }

    pub fn selected(&self) -> Option<&EditOperation> {
        self.selection.and_then(|id| self.get(id))
    }

    /// Remove the selected operation, if any.
    pub fn delete_selected(&mut self) -> Option<EditOperation> {
        let id = self.selection?;
        self.remove(id)
    }

    /// Move one operation by a page-space delta.
    pub fn translate(&mut self, id: OpId, delta: Vec2) -> bool {
        let Some(op) = self.get_mut(id) else {
            return false;
        };
        op.translate(delta);
        self.needs_redraw = true;
        true
    }

    /// Put back a geometry snapshot taken before a drag.
    pub(crate) fn restore(&mut self, id: OpId, kind: OperationKind) -> bool {
        let Some(op) = self.get_mut(id) else {
            return false;
        };
        op.restore_kind(kind);
        self.needs_redraw = true;
        true
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}
