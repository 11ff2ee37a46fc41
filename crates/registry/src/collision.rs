//! Collision types and precedence rules.
//!
//! Commands, state queries and node types from every extension share one
//! namespace per kind. When two extensions contribute the same key, the
//! active [`DuplicatePolicy`] picks the winner and a [`Collision`] is recorded
//! so hosts can surface it at startup.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
	/// Keep the contribution from the extension listed first.
	FirstWins,
	/// Overwrite with the contribution from the extension listed last.
	#[default]
	LastWins,
	/// Fail composition on the first collision.
	Reject,
}

/// Namespace a colliding key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
	Command,
	StateQuery,
	NodeType,
}

impl std::fmt::Display for KeyKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Command => write!(f, "command"),
			Self::StateQuery => write!(f, "state query"),
			Self::NodeType => write!(f, "node type"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
	/// Existing binding kept; incoming dropped.
	KeptExisting,
	/// Existing binding replaced by incoming.
	ReplacedExisting,
}

/// One key contributed by more than one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub kind: KeyKind,
	pub key: Box<str>,
	/// Extension that held the key before the incoming contribution.
	pub existing: Box<str>,
	/// Extension whose contribution triggered the collision.
	pub incoming: Box<str>,
	pub resolution: Resolution,
}

impl Collision {
	/// Extension id that owns the key after resolution.
	pub fn winner(&self) -> &str {
		match self.resolution {
			Resolution::KeptExisting => &self.existing,
			Resolution::ReplacedExisting => &self.incoming,
		}
	}
}
