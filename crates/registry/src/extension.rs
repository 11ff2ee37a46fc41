//! The capability interface every extension implements.

use std::sync::Arc;

use quill_primitives::{ChangeNotifier, Document, Subscription, Viewport};

use crate::command::{CommandDef, CommandMap};
use crate::contrib::{Fragment, NodeTypeDescriptor};
use crate::error::ExtensionError;
use crate::menus::ProviderRegistrar;
use crate::meta::ExtensionMeta;
use crate::query::StateQueryDef;
use crate::settings::{ConfigSlot, ExtensionConfig};

/// Teardown returned by [`Extension::register`]. Runs at most once.
pub type Teardown = Subscription;

/// Live session handed to lifecycle hooks.
///
/// Everything an extension may attach to during registration is reachable
/// from here; nothing is global.
pub struct RegisterCx<'a> {
	document: &'a Arc<dyn Document>,
	viewport: &'a Arc<dyn Viewport>,
	menus: &'a Arc<dyn ProviderRegistrar>,
	commands: &'a CommandMap,
	config: Arc<ExtensionConfig>,
}

impl<'a> RegisterCx<'a> {
	pub fn new(
		document: &'a Arc<dyn Document>,
		viewport: &'a Arc<dyn Viewport>,
		menus: &'a Arc<dyn ProviderRegistrar>,
		commands: &'a CommandMap,
		config: Arc<ExtensionConfig>,
	) -> Self {
		Self {
			document,
			viewport,
			menus,
			commands,
			config,
		}
	}

	pub fn document(&self) -> &Arc<dyn Document> {
		self.document
	}

	pub fn viewport(&self) -> &Arc<dyn Viewport> {
		self.viewport
	}

	pub fn menus(&self) -> &Arc<dyn ProviderRegistrar> {
		self.menus
	}

	/// The merged command map of the composition being mounted.
	pub fn commands(&self) -> &CommandMap {
		self.commands
	}

	/// The registering extension's config at mount time.
	pub fn config(&self) -> &ExtensionConfig {
		&self.config
	}
}

/// A self-describing capability unit.
///
/// Every contribution surface is optional. Contributions are read once per
/// composition; an extension whose contributions change must be recomposed.
pub trait Extension: Send + Sync + 'static {
	fn meta(&self) -> &ExtensionMeta;

	fn id(&self) -> &str {
		&self.meta().id
	}

	/// Storage backing [`config`](Self::config) and [`configure`](Self::configure).
	fn config_slot(&self) -> Option<&ConfigSlot> {
		None
	}

	fn config(&self) -> Arc<ExtensionConfig> {
		self.config_slot().map(ConfigSlot::get).unwrap_or_default()
	}

	/// Replaces the extension's config wholesale.
	fn configure(&self, config: ExtensionConfig) -> Result<(), ExtensionError> {
		match self.config_slot() {
			Some(slot) => {
				slot.replace(config);
				Ok(())
			}
			None if config.is_empty() => Ok(()),
			None => Err(ExtensionError::invalid_config(self.id(), "extension takes no configuration")),
		}
	}

	fn node_types(&self) -> Vec<NodeTypeDescriptor> {
		Vec::new()
	}

	fn commands(&self) -> Vec<CommandDef> {
		Vec::new()
	}

	fn state_queries(&self) -> Vec<StateQueryDef> {
		Vec::new()
	}

	fn fragments(&self) -> Vec<Fragment> {
		Vec::new()
	}

	/// Extension-local change signal; firing it re-evaluates state queries.
	fn change_notifier(&self) -> Option<ChangeNotifier> {
		None
	}

	/// Lifecycle hook run against the live session.
	///
	/// Listeners attached here must be released by the returned teardown.
	/// An error aborts the mount and reaches the host unchanged.
	fn register(&self, cx: &RegisterCx<'_>) -> Result<Teardown, ExtensionError> {
		let _ = cx;
		Ok(Teardown::noop())
	}
}

impl std::fmt::Debug for dyn Extension {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Extension").field("id", &self.id()).finish_non_exhaustive()
	}
}
