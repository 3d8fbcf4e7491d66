//! PageMark Core Library
//!
//! Edit operations placed on document pages, the mapping between the
//! on-screen preview and page space, and the interactive editor that turns
//! pointer input into operations.

pub mod config;
pub mod coords;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod input;
pub mod operations;
pub mod tools;
pub mod wire;

pub use config::EditorConfig;
pub use coords::{CanvasPoint, PagePoint, PageViewport, PlacementPolicy};
pub use document::EditDocument;
pub use editor::{Editor, InteractionOutcome, InteractionState};
pub use error::{EditError, EditResult};
pub use export::DocumentExporter;
pub use input::{Key, KeyEvent, MouseButton, PointerEvent};
pub use operations::{Annotation, EditOperation, HexColor, OpId, OperationKind, OperationType};
pub use tools::{ToolKind, ToolManager, ToolStyle};
pub use wire::{LegacyEdit, edits_to_json, parse_edits};
