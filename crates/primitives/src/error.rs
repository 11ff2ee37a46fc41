//! Errors raised by document transactions.

use thiserror::Error;

use crate::ids::NodeKey;

/// Errors that can occur while reading or editing an [`EditorState`](crate::EditorState).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	/// The node key does not exist in the current state.
	#[error("unknown node {0}")]
	UnknownNode(NodeKey),

	/// The node exists but carries no text.
	#[error("node {0} does not hold text")]
	NotText(NodeKey),

	/// A character offset is past the end of the node's text.
	#[error("offset {offset} out of bounds for node {node} (length {len})")]
	OutOfBounds {
		/// Node the offset was applied to.
		node: NodeKey,
		/// Requested character offset.
		offset: usize,
		/// Character length of the node's text.
		len: usize,
	},

	/// A range whose start lies after its end.
	#[error("inverted range {start}..{end}")]
	InvertedRange {
		/// Range start.
		start: usize,
		/// Range end.
		end: usize,
	},

	/// An update was requested while another transaction was still open.
	#[error("an update transaction is already in progress")]
	NestedUpdate,

	/// The transaction body rejected the edit.
	#[error("edit rejected: {0}")]
	Rejected(String),
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, EditError>;
