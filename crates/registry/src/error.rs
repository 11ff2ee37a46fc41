//! Registry and extension error types.

use thiserror::Error;

use crate::collision::KeyKind;

/// Errors raised while composing extensions or dispatching their commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// Two extensions in one composed set share an id.
	#[error("duplicate extension id `{0}`")]
	DuplicateExtension(String),

	/// A contributed key collided under [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject).
	#[error("{kind} `{key}` contributed by `{incoming}` is already provided by `{existing}`")]
	KeyCollision {
		kind: KeyKind,
		key: String,
		existing: String,
		incoming: String,
	},

	/// No extension contributes the requested command.
	#[error("unknown command `{0}`")]
	UnknownCommand(String),

	/// A command handler returned an error.
	#[error("command `{name}` failed: {message}")]
	CommandFailed { name: String, message: String },

	/// No extension with this id is part of the set.
	#[error("unknown extension `{0}`")]
	UnknownExtension(String),
}

/// Error returned by an extension's lifecycle hook.
///
/// The runtime never swallows it: mounting fails and the error reaches the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
	/// The hook could not attach to the session.
	#[error("extension `{id}` failed to register: {reason}")]
	Registration { id: String, reason: String },

	/// The extension rejected its configuration.
	#[error("extension `{id}` rejected its config: {reason}")]
	InvalidConfig { id: String, reason: String },
}

impl ExtensionError {
	pub fn registration(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
		Self::Registration {
			id: id.into(),
			reason: reason.to_string(),
		}
	}

	pub fn invalid_config(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
		Self::InvalidConfig {
			id: id.into(),
			reason: reason.to_string(),
		}
	}
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
