use std::fmt;

/// Stable key of a node in the document tree.
///
/// Keys survive edits to the node's content; they are only retired when the
/// node itself is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "n{}", self.0)
	}
}

/// Opaque handle to an element rendered by the UI layer.
///
/// The runtime never dereferences it; the host resolves it back to live
/// geometry through its viewport implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "el{}", self.0)
	}
}
