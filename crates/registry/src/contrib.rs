//! Descriptor-only contributions: node types and UI fragments.

use crate::meta::ExtensionId;

/// How a contributed node participates in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
	Inline,
	Block,
	/// Rendered by the UI layer, carries no editable text.
	Decorator,
}

/// A node type an extension teaches the document engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDescriptor {
	pub name: Box<str>,
	pub role: NodeRole,
}

impl NodeTypeDescriptor {
	pub fn new(name: impl Into<Box<str>>, role: NodeRole) -> Self {
		Self { name: name.into(), role }
	}
}

/// Where presentation code mounts a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentSlot {
	/// Portal anchored to screen coordinates or an element.
	Floating,
	Toolbar,
	Custom(Box<str>),
}

/// A UI fragment an extension asks presentation code to mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
	pub id: Box<str>,
	pub slot: FragmentSlot,
}

impl Fragment {
	pub fn new(id: impl Into<Box<str>>, slot: FragmentSlot) -> Self {
		Self { id: id.into(), slot }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeEntry {
	pub owner: ExtensionId,
	pub descriptor: NodeTypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentEntry {
	pub owner: ExtensionId,
	pub fragment: Fragment,
}
