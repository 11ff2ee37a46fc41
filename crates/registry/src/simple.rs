//! Closure-assembled extensions for hosts that do not need a dedicated type.

use std::sync::Arc;

use quill_primitives::ChangeNotifier;

use crate::command::CommandDef;
use crate::contrib::{Fragment, NodeTypeDescriptor};
use crate::error::ExtensionError;
use crate::extension::{Extension, RegisterCx, Teardown};
use crate::meta::ExtensionMeta;
use crate::query::StateQueryDef;
use crate::settings::{ConfigSlot, ExtensionConfig};

type RegisterFn = dyn Fn(&RegisterCx<'_>) -> Result<Teardown, ExtensionError> + Send + Sync;

/// An [`Extension`] assembled from parts.
///
/// ```ignore
/// let ext = SimpleExtension::new("bold")
///     .command(CommandDef::new("bold.toggle", |_| Ok(Value::Null)))
///     .state_query(StateQueryDef::new("bold.active", || false))
///     .on_register(|cx| Ok(Teardown::noop()));
/// ```
pub struct SimpleExtension {
	meta: ExtensionMeta,
	config: ConfigSlot,
	node_types: Vec<NodeTypeDescriptor>,
	commands: Vec<CommandDef>,
	state_queries: Vec<StateQueryDef>,
	fragments: Vec<Fragment>,
	notifier: Option<ChangeNotifier>,
	register: Option<Arc<RegisterFn>>,
}

impl SimpleExtension {
	pub fn new(id: &str) -> Self {
		Self::with_meta(ExtensionMeta::new(id))
	}

	pub fn with_meta(meta: ExtensionMeta) -> Self {
		Self {
			meta,
			config: ConfigSlot::default(),
			node_types: Vec::new(),
			commands: Vec::new(),
			state_queries: Vec::new(),
			fragments: Vec::new(),
			notifier: None,
			register: None,
		}
	}

	pub fn init_priority(mut self, priority: i32) -> Self {
		self.meta.init_priority = priority;
		self
	}

	pub fn category(mut self, category: &str) -> Self {
		self.meta.categories.insert(category.into());
		self
	}

	pub fn with_config(self, config: ExtensionConfig) -> Self {
		self.config.replace(config);
		self
	}

	pub fn node_type(mut self, descriptor: NodeTypeDescriptor) -> Self {
		self.node_types.push(descriptor);
		self
	}

	pub fn command(mut self, def: CommandDef) -> Self {
		self.commands.push(def);
		self
	}

	pub fn state_query(mut self, def: StateQueryDef) -> Self {
		self.state_queries.push(def);
		self
	}

	pub fn fragment(mut self, fragment: Fragment) -> Self {
		self.fragments.push(fragment);
		self
	}

	pub fn notifier(mut self, notifier: ChangeNotifier) -> Self {
		self.notifier = Some(notifier);
		self
	}

	pub fn on_register<F>(mut self, hook: F) -> Self
	where
		F: Fn(&RegisterCx<'_>) -> Result<Teardown, ExtensionError> + Send + Sync + 'static,
	{
		self.register = Some(Arc::new(hook));
		self
	}

	/// Finishes the builder as a shareable trait object.
	pub fn build(self) -> Arc<dyn Extension> {
		Arc::new(self)
	}
}

impl Extension for SimpleExtension {
	fn meta(&self) -> &ExtensionMeta {
		&self.meta
	}

	fn config_slot(&self) -> Option<&ConfigSlot> {
		Some(&self.config)
	}

	fn node_types(&self) -> Vec<NodeTypeDescriptor> {
		self.node_types.clone()
	}

	fn commands(&self) -> Vec<CommandDef> {
		self.commands.clone()
	}

	fn state_queries(&self) -> Vec<StateQueryDef> {
		self.state_queries.clone()
	}

	fn fragments(&self) -> Vec<Fragment> {
		self.fragments.clone()
	}

	fn change_notifier(&self) -> Option<ChangeNotifier> {
		self.notifier.clone()
	}

	fn register(&self, cx: &RegisterCx<'_>) -> Result<Teardown, ExtensionError> {
		match &self.register {
			Some(hook) => hook(cx),
			None => Ok(Teardown::noop()),
		}
	}
}
