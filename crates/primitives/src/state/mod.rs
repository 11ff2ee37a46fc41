//! Immutable captures of the document and its selection.
//!
//! An [`EditorState`] is what listeners and read passes see. Engines commit a
//! new capture per transaction; nothing mutates a capture after it is shared.

use indexmap::IndexMap;

use crate::error::{EditError, Result};
use crate::ids::NodeKey;
use crate::selection::{CharIdx, Position, Selection};


/// Content carried by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// A text-bearing node.
	Text(String),
	/// A node without editable text (image, divider, table cell wrapper).
	Element { tag: String },
}

/// A node in the flattened document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
	pub key: NodeKey,
	pub kind: NodeKind,
}

impl Node {
	/// Returns the node's text, if it is text-bearing.
	pub fn text(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Text(text) => Some(text),
			NodeKind::Element { .. } => None,
		}
	}
}

/// Collapsed caret inside a text node, resolved against a state capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret<'a> {
	/// Caret location.
	pub position: Position,
	/// Full text of the anchor node.
	pub node_text: &'a str,
	/// Text of the anchor node up to the caret.
	pub before: &'a str,
}

/// A committed capture of document content and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
	nodes: IndexMap<NodeKey, Node>,
	selection: Option<Selection>,
	next_key: u64,
	revision: u64,
}

impl EditorState {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a state with one text node per paragraph and no selection.
	pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut state = Self::new();
		for text in paragraphs {
			state.push_text(text);
		}
		state
	}

	/// Monotonic commit counter, bumped by the engine on every commit.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Advances the revision. Engines call this once per committed transaction.
	pub fn bump_revision(&mut self) {
		self.revision = self.revision.wrapping_add(1);
	}

	/// Appends a text node and returns its key.
	pub fn push_text(&mut self, text: impl Into<String>) -> NodeKey {
		self.push(NodeKind::Text(text.into()))
	}

	/// Appends a non-text node and returns its key.
	pub fn push_element(&mut self, tag: impl Into<String>) -> NodeKey {
		self.push(NodeKind::Element { tag: tag.into() })
	}

	fn push(&mut self, kind: NodeKind) -> NodeKey {
		self.next_key += 1;
		let key = NodeKey(self.next_key);
		self.nodes.insert(key, Node { key, kind });
		key
	}

	/// Removes a node. A selection touching it is cleared.
	pub fn remove(&mut self, key: NodeKey) -> Result<Node> {
		let node = self.nodes.shift_remove(&key).ok_or(EditError::UnknownNode(key))?;
		if self
			.selection
			.is_some_and(|sel| sel.anchor.node == key || sel.focus.node == key)
		{
			self.selection = None;
		}
		Ok(node)
	}

	/// Looks a node up by key.
	pub fn node(&self, key: NodeKey) -> Option<&Node> {
		self.nodes.get(&key)
	}

	/// Iterates nodes in document order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.values()
	}

	/// Text of a text-bearing node.
	pub fn text(&self, key: NodeKey) -> Result<&str> {
		self.node(key)
			.ok_or(EditError::UnknownNode(key))?
			.text()
			.ok_or(EditError::NotText(key))
	}

	/// Text content of the whole document, one line per text node.
	pub fn text_content(&self) -> String {
		self.nodes().filter_map(Node::text).collect::<Vec<_>>().join("\n")
	}

	pub fn selection(&self) -> Option<Selection> {
		self.selection
	}

	/// Replaces the selection after checking that both ends resolve.
	pub fn set_selection(&mut self, selection: Option<Selection>) -> Result<()> {
		if let Some(sel) = selection {
			self.check_position(sel.anchor)?;
			self.check_position(sel.focus)?;
		}
		self.selection = selection;
		Ok(())
	}

	/// Collapses the selection to a caret.
	pub fn set_caret(&mut self, node: NodeKey, offset: CharIdx) -> Result<()> {
		self.set_selection(Some(Selection::caret(node, offset)))
	}

	fn check_position(&self, pos: Position) -> Result<()> {
		let node = self.node(pos.node).ok_or(EditError::UnknownNode(pos.node))?;
		let len = node.text().map_or(0, |t| t.chars().count());
		if pos.offset > len {
			return Err(EditError::OutOfBounds {
				node: pos.node,
				offset: pos.offset,
				len,
			});
		}
		Ok(())
	}

	/// Resolves the caret when the selection is collapsed inside a text node.
	pub fn caret(&self) -> Option<Caret<'_>> {
		let position = self.selection?.caret_position()?;
		let node_text = self.node(position.node)?.text()?;
		let byte = byte_offset(node_text, position.offset)?;
		Some(Caret {
			position,
			node_text,
			before: &node_text[..byte],
		})
	}

	/// Replaces the characters `start..end` of a text node with `replacement`.
	///
	/// A selection end inside the node is kept stable: ends before `start` do
	/// not move, ends inside the replaced range snap to its new end, and ends
	/// after it shift by the length delta.
	pub fn splice(&mut self, key: NodeKey, start: CharIdx, end: CharIdx, replacement: &str) -> Result<()> {
		if start > end {
			return Err(EditError::InvertedRange { start, end });
		}
		let node = self.nodes.get_mut(&key).ok_or(EditError::UnknownNode(key))?;
		let NodeKind::Text(text) = &mut node.kind else {
			return Err(EditError::NotText(key));
		};
		let len = text.chars().count();
		let out_of_bounds = |offset| EditError::OutOfBounds { node: key, offset, len };
		let start_byte = byte_offset(text, start).ok_or_else(|| out_of_bounds(start))?;
		let end_byte = byte_offset(text, end).ok_or_else(|| out_of_bounds(end))?;
		text.replace_range(start_byte..end_byte, replacement);

		let inserted = replacement.chars().count();
		let remap = |pos: Position| {
			if pos.node != key || pos.offset < start {
				return pos;
			}
			let offset = if pos.offset <= end && pos.offset > start {
				start + inserted
			} else if pos.offset > end {
				pos.offset - (end - start) + inserted
			} else {
				pos.offset
			};
			Position::new(pos.node, offset)
		};
		if let Some(sel) = self.selection {
			self.selection = Some(Selection::new(remap(sel.anchor), remap(sel.focus)));
		}
		Ok(())
	}

	/// Inserts text at a position without moving the selection past it.
	pub fn insert_text(&mut self, at: Position, text: &str) -> Result<()> {
		self.splice(at.node, at.offset, at.offset, text)
	}

	/// Inserts text at the caret and places the caret after it.
	pub fn type_text(&mut self, text: &str) -> Result<()> {
		let Some(pos) = self.selection.and_then(|s| s.caret_position()) else {
			return Err(EditError::Rejected("no collapsed selection".into()));
		};
		self.splice(pos.node, pos.offset, pos.offset, text)?;
		self.set_caret(pos.node, pos.offset + text.chars().count())
	}
}

/// Byte index of the `idx`-th character, or the text length for `idx == len`.
pub(crate) fn byte_offset(text: &str, idx: CharIdx) -> Option<usize> {
	text.char_indices()
		.map(|(b, _)| b)
		.chain(std::iter::once(text.len()))
		.nth(idx)
}
