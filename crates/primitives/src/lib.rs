//! Contracts consumed from the document engine and the UI layer.
//!
//! The runtime never owns the document. It reads committed [`EditorState`]
//! captures, writes through [`Document::update`] transactions, and observes
//! commits through [`Document::on_update`]. [`MemoryDocument`] is a small
//! in-process engine implementing the same contract, and [`GridViewport`] a
//! headless stand-in for the UI layer's layout queries.

/// Transactional document contract and update events.
pub mod document;
/// Edit errors.
pub mod error;
/// Async future aliases.
pub mod future;
/// Screen-space geometry.
pub mod geometry;
/// Identifier types for nodes and rendered elements.
pub mod ids;
/// Ordered listener tables and subscriptions.
pub mod listeners;
/// In-memory document engine.
pub mod memory;
/// Caret and range selections.
pub mod selection;
/// Immutable editor state captures.
pub mod state;
/// Layout queries answered by the UI layer.
pub mod viewport;

pub use document::{Document, DocumentExt, UpdateEvent, UpdateListener, UpdateTag};
pub use error::{EditError, Result};
pub use future::BoxFutureStatic;
pub use geometry::{Point, Rect, Size};
pub use ids::{ElementId, NodeKey};
pub use listeners::{ChangeNotifier, Listeners, Subscription};
pub use memory::MemoryDocument;
pub use selection::{CharIdx, Position, Selection};
pub use state::{Caret, EditorState, Node, NodeKind};
pub use viewport::{GridViewport, Viewport};
