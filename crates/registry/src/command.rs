//! Named commands contributed by extensions and the merged dispatch map.

use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use quill_primitives::BoxFutureStatic;
use serde_json::Value;

use crate::error::{RegistryError, Result};
use crate::meta::ExtensionId;

/// Arguments passed to a command handler.
pub type CommandArgs = Value;
/// Value produced by a command handler.
pub type CommandOutput = Value;
/// Outcome of a command handler.
pub type CommandResult = anyhow::Result<CommandOutput>;
/// Type-erased command handler; synchronous handlers resolve immediately.
pub type CommandHandler = Arc<dyn Fn(CommandArgs) -> BoxFutureStatic<CommandResult> + Send + Sync>;

/// A command contributed by an extension.
#[derive(Clone)]
pub struct CommandDef {
	pub name: Box<str>,
	pub handler: CommandHandler,
}

impl CommandDef {
	/// Wraps a synchronous handler.
	pub fn new<F>(name: impl Into<Box<str>>, handler: F) -> Self
	where
		F: Fn(CommandArgs) -> CommandResult + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			handler: Arc::new(move |args| -> BoxFutureStatic<CommandResult> {
				let out = handler(args);
				Box::pin(std::future::ready(out))
			}),
		}
	}

	/// Wraps an asynchronous handler (upload-then-insert flows and the like).
	pub fn new_async<F, Fut>(name: impl Into<Box<str>>, handler: F) -> Self
	where
		F: Fn(CommandArgs) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = CommandResult> + Send + 'static,
	{
		Self {
			name: name.into(),
			handler: Arc::new(move |args| -> BoxFutureStatic<CommandResult> { Box::pin(handler(args)) }),
		}
	}
}

impl std::fmt::Debug for CommandDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CommandDef").field("name", &self.name).finish_non_exhaustive()
	}
}

/// A command together with the extension that won its name.
#[derive(Debug, Clone)]
pub struct CommandEntry {
	pub owner: ExtensionId,
	pub def: CommandDef,
}

/// Session-wide command namespace produced by composition.
#[derive(Debug, Clone, Default)]
pub struct CommandMap {
	entries: Arc<IndexMap<Box<str>, CommandEntry>>,
}

impl CommandMap {
	pub(crate) fn from_entries(entries: IndexMap<Box<str>, CommandEntry>) -> Self {
		Self {
			entries: Arc::new(entries),
		}
	}

	pub fn get(&self, name: &str) -> Option<&CommandEntry> {
		self.entries.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Extension that provides `name`.
	pub fn owner(&self, name: &str) -> Option<&str> {
		self.get(name).map(|entry| &*entry.owner)
	}

	/// Command names in first-contribution order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(|name| &**name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Runs a command.
	///
	/// The returned future owns everything it needs, so it can be spawned.
	pub fn execute(&self, name: &str, args: CommandArgs) -> BoxFutureStatic<Result<CommandOutput>> {
		let name = name.to_owned();
		let handler = self.entries.get(name.as_str()).map(|entry| Arc::clone(&entry.def.handler));
		Box::pin(async move {
			let Some(handler) = handler else {
				return Err(RegistryError::UnknownCommand(name));
			};
			tracing::debug!(command = %name, "command.execute");
			handler(args).await.map_err(|err| {
				tracing::debug!(command = %name, error = %err, "command.failed");
				RegistryError::CommandFailed {
					name,
					message: format!("{err:#}"),
				}
			})
		})
	}
}
