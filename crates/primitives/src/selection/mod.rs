use crate::ids::NodeKey;


/// A position in a node's text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A caret location: a node and a character offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
	pub node: NodeKey,
	pub offset: CharIdx,
}

impl Position {
	pub const fn new(node: NodeKey, offset: CharIdx) -> Self {
		Self { node, offset }
	}
}

/// A selection defined by anchor and focus positions.
///
/// The anchor is the fixed end and the focus moves while the selection is
/// extended. A selection whose ends coincide is collapsed (a caret).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
	/// The fixed end of the selection.
	pub anchor: Position,
	/// The moving end of the selection.
	pub focus: Position,
}

impl Selection {
	/// Creates a selection from anchor to focus.
	pub const fn new(anchor: Position, focus: Position) -> Self {
		Self { anchor, focus }
	}

	/// Creates a collapsed selection (caret).
	pub const fn caret(node: NodeKey, offset: CharIdx) -> Self {
		let pos = Position::new(node, offset);
		Self::new(pos, pos)
	}

	/// Returns true if anchor equals focus.
	pub fn is_collapsed(&self) -> bool {
		self.anchor == self.focus
	}

	/// Returns the caret position when the selection is collapsed.
	pub fn caret_position(&self) -> Option<Position> {
		self.is_collapsed().then_some(self.anchor)
	}

	/// Returns true if both ends lie in the same node.
	pub fn is_single_node(&self) -> bool {
		self.anchor.node == self.focus.node
	}

	/// Ordered `(start, end)` offsets when both ends share a node.
	pub fn offsets_in_node(&self) -> Option<(CharIdx, CharIdx)> {
		if !self.is_single_node() {
			return None;
		}
		let (a, f) = (self.anchor.offset, self.focus.offset);
		Some((a.min(f), a.max(f)))
	}
}
