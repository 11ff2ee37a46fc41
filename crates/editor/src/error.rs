//! Session and configuration errors.

use std::path::PathBuf;

use quill_primitives::EditError;
use quill_registry::{ExtensionError, RegistryError};
use thiserror::Error;

/// Errors surfaced by [`Session`](crate::Session) and the interaction components.
///
/// Runtime content conditions (failing state queries, lost carets, detached
/// menu anchors) never reach this type; they degrade to an inactive feature.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error(transparent)]
	Registry(#[from] RegistryError),

	/// A lifecycle hook failed while mounting.
	#[error(transparent)]
	Extension(#[from] ExtensionError),

	#[error(transparent)]
	Edit(#[from] EditError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	/// `reorder` was given ids that are not a permutation of the mounted set.
	#[error("reorder must list every mounted extension exactly once (got {given:?}, mounted {mounted:?})")]
	InvalidOrder { given: Vec<String>, mounted: Vec<String> },

	/// No scanner entry with this id.
	#[error("unknown entry `{0}`")]
	UnknownEntry(String),

	/// No item with this id in the open menu.
	#[error("no open menu item `{0}`")]
	UnknownMenuItem(String),

	/// Menu item exists but is disabled.
	#[error("menu item `{0}` is disabled")]
	DisabledMenuItem(String),

	/// The component is not attached to a live session.
	#[error("{0} is not attached to a session")]
	Detached(&'static str),
}

/// Errors raised while loading a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	/// A value parsed but is out of range.
	#[error("invalid `{field}`: {reason}")]
	Invalid { field: &'static str, reason: String },
}

impl ConfigError {
	pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
		Self::Invalid {
			field,
			reason: reason.into(),
		}
	}
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
