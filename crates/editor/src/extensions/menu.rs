use std::sync::Arc;

use quill_primitives::{ChangeNotifier, Subscription};
use quill_registry::{
	CommandDef, ContextMenuProvider, Extension, ExtensionError, ExtensionMeta, Fragment, FragmentSlot, RegisterCx,
	StateQueryDef, Teardown,
};
use serde_json::Value;

use crate::context_menu::ContextMenuResolver;

/// Exposes the session's context menu and hands providers to it on mount.
pub struct ContextMenuExtension {
	meta: ExtensionMeta,
	menus: ContextMenuResolver,
	providers: Vec<Arc<dyn ContextMenuProvider>>,
}

impl ContextMenuExtension {
	pub const ID: &'static str = "context-menu";

	pub fn new(menus: &ContextMenuResolver) -> Self {
		Self {
			meta: ExtensionMeta::new(Self::ID).with_category("menu"),
			menus: menus.clone(),
			providers: Vec::new(),
		}
	}

	pub fn with_provider(mut self, provider: Arc<dyn ContextMenuProvider>) -> Self {
		self.providers.push(provider);
		self
	}
}

impl Extension for ContextMenuExtension {
	fn meta(&self) -> &ExtensionMeta {
		&self.meta
	}

	fn commands(&self) -> Vec<CommandDef> {
		let menus = self.menus.clone();
		vec![CommandDef::new("context_menu.hide", move |_| Ok(Value::Bool(menus.hide())))]
	}

	fn state_queries(&self) -> Vec<StateQueryDef> {
		let menus = self.menus.clone();
		vec![StateQueryDef::new("context_menu.open", move || menus.is_open())]
	}

	fn fragments(&self) -> Vec<Fragment> {
		vec![Fragment::new(Self::ID, FragmentSlot::Floating)]
	}

	fn change_notifier(&self) -> Option<ChangeNotifier> {
		Some(self.menus.notifier())
	}

	fn register(&self, cx: &RegisterCx<'_>) -> Result<Teardown, ExtensionError> {
		let registrar = cx.menus();
		Ok(Subscription::all(
			self.providers
				.iter()
				.map(|provider| registrar.register_provider(Arc::clone(provider)))
				.collect(),
		))
	}
}
