//! One live, composed editing session.
//!
//! # Lifecycle
//!
//! Mounting composes the extension list, then runs each extension's
//! [`register`](Extension::register) hook in [`registration order`](ExtensionSet::registration_order),
//! keeping one [`RegistrationRecord`] per extension. Any change to the set
//! (register, unregister, reorder, configure) tears the current records down
//! in reverse before the new composition registers anything. Every teardown
//! runs at most once.
//!
//! A failing hook aborts the mount: records created so far are torn down and
//! the error is returned unchanged.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use quill_primitives::{BoxFutureStatic, Document, Subscription, Viewport};
use quill_registry::{
	Collision, CommandArgs, CommandMap, CommandOutput, Extension, ExtensionConfig, ExtensionId, ExtensionSet,
	PointerEvent, ProviderRegistrar, RegisterCx, RegistryError, StateQueryMap, Teardown,
};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::context_menu::ContextMenuResolver;
use crate::error::{Result, SessionError};
use crate::reactive::{StateScheduler, StateSnapshot};

mod context;

pub use context::UiContext;

/// An extension together with the teardown its lifecycle hook returned.
pub struct RegistrationRecord {
	pub id: ExtensionId,
	teardown: Teardown,
}

impl RegistrationRecord {
	fn tear_down(self) {
		tracing::debug!(ext = %self.id, "extension.teardown");
		self.teardown.cancel();
	}
}

impl std::fmt::Debug for RegistrationRecord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegistrationRecord").field("id", &self.id).finish_non_exhaustive()
	}
}

struct Mounted {
	set: ExtensionSet,
	/// In registration order.
	records: Vec<RegistrationRecord>,
	/// Scheduler attachments to the document and extension notifiers.
	watchers: Subscription,
}

/// A composed editing session over an external document and viewport.
pub struct Session {
	document: Arc<dyn Document>,
	viewport: Arc<dyn Viewport>,
	menus: ContextMenuResolver,
	registrar: Arc<dyn ProviderRegistrar>,
	scheduler: StateScheduler,
	config: SessionConfig,
	mounted: Mutex<Option<Mounted>>,
	ui: RwLock<Option<UiContext>>,
}

impl Session {
	/// Creates an unmounted session. State rounds run on `handle`.
	pub fn new(document: Arc<dyn Document>, viewport: Arc<dyn Viewport>, handle: Handle, config: SessionConfig) -> Self {
		let menus = ContextMenuResolver::new(Arc::clone(&viewport), config.context_menu.clone());
		Self {
			registrar: Arc::new(menus.clone()),
			menus,
			scheduler: StateScheduler::new(handle),
			document,
			viewport,
			config,
			mounted: Mutex::new(None),
			ui: RwLock::new(None),
		}
	}

	/// Composes `extensions` and mounts them, replacing any current composition.
	///
	/// Extensions named in the config's `[extensions]` table are configured first.
	pub fn mount(&self, extensions: Vec<Arc<dyn Extension>>) -> Result<()> {
		for ext in &extensions {
			self.apply_file_config(ext)?;
		}
		let set = self.compose(extensions)?;
		self.mount_set(set)
	}

	/// Tears down every registration and clears the state snapshot.
	pub fn unmount(&self) {
		let Some(mounted) = self.mounted.lock().take() else {
			return;
		};
		self.tear_down(mounted);
		tracing::debug!("session.unmount");
	}

	/// Appends an extension and remounts.
	pub fn register_extension(&self, extension: Arc<dyn Extension>) -> Result<()> {
		self.apply_file_config(&extension)?;
		let mut extensions = self.extensions();
		extensions.push(extension);
		self.remount(extensions)
	}

	/// Removes an extension and remounts.
	pub fn unregister_extension(&self, id: &str) -> Result<()> {
		let mut extensions = self.extensions();
		let before = extensions.len();
		extensions.retain(|ext| ext.id() != id);
		if extensions.len() == before {
			return Err(RegistryError::UnknownExtension(id.to_owned()).into());
		}
		self.remount(extensions)
	}

	/// Reorders the composition; `ids` must list every mounted extension once.
	pub fn reorder(&self, ids: &[&str]) -> Result<()> {
		let mut remaining = self.extensions();
		let mounted: Vec<String> = remaining.iter().map(|ext| ext.id().to_owned()).collect();
		let invalid = || SessionError::InvalidOrder {
			given: ids.iter().map(|id| (*id).to_owned()).collect(),
			mounted: mounted.clone(),
		};
		if ids.len() != remaining.len() {
			return Err(invalid());
		}
		let mut ordered = Vec::with_capacity(ids.len());
		for id in ids {
			let at = remaining.iter().position(|ext| ext.id() == *id).ok_or_else(invalid)?;
			ordered.push(remaining.swap_remove(at));
		}
		self.remount(ordered)
	}

	/// Replaces one extension's config and remounts.
	pub fn configure_extension(&self, id: &str, config: ExtensionConfig) -> Result<()> {
		let extensions = self.extensions();
		let ext = extensions
			.iter()
			.find(|ext| ext.id() == id)
			.ok_or_else(|| RegistryError::UnknownExtension(id.to_owned()))?;
		ext.configure(config)?;
		tracing::debug!(ext = %id, "extension.configure");
		self.remount(extensions)
	}

	pub fn is_mounted(&self) -> bool {
		self.mounted.lock().is_some()
	}

	/// Mounted extensions in array order.
	pub fn extensions(&self) -> Vec<Arc<dyn Extension>> {
		self.with_set(|set| set.extensions().to_vec()).unwrap_or_default()
	}

	pub fn extension_ids(&self) -> Vec<String> {
		self.with_set(|set| set.ids().map(str::to_owned).collect()).unwrap_or_default()
	}

	/// Ids in the order their hooks ran.
	pub fn registration_order(&self) -> Vec<String> {
		self.mounted
			.lock()
			.as_ref()
			.map(|mounted| mounted.records.iter().map(|record| record.id.to_string()).collect())
			.unwrap_or_default()
	}

	/// The current composition.
	pub fn composition(&self) -> Option<ExtensionSet> {
		self.with_set(ExtensionSet::clone)
	}

	pub fn commands(&self) -> CommandMap {
		self.with_set(|set| set.commands().clone()).unwrap_or_default()
	}

	pub fn state_queries(&self) -> StateQueryMap {
		self.with_set(|set| set.state_queries().clone()).unwrap_or_default()
	}

	pub fn collisions(&self) -> Vec<Collision> {
		self.with_set(|set| set.collisions().to_vec()).unwrap_or_default()
	}

	/// Runs a merged command.
	pub fn execute(&self, name: &str, args: CommandArgs) -> BoxFutureStatic<quill_registry::Result<CommandOutput>> {
		self.commands().execute(name, args)
	}

	/// Latest published state snapshot.
	pub fn snapshot(&self) -> StateSnapshot {
		self.scheduler.snapshot()
	}

	pub fn subscribe_state(&self) -> watch::Receiver<StateSnapshot> {
		self.scheduler.subscribe()
	}

	pub fn scheduler(&self) -> &StateScheduler {
		&self.scheduler
	}

	pub fn menus(&self) -> &ContextMenuResolver {
		&self.menus
	}

	/// Resolves a contextual pointer event against the committed selection.
	pub fn handle_pointer_event(&self, event: &PointerEvent) -> bool {
		self.menus.handle_pointer_event(event, &self.document.read())
	}

	pub fn document(&self) -> &Arc<dyn Document> {
		&self.document
	}

	pub fn viewport(&self) -> &Arc<dyn Viewport> {
		&self.viewport
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Context for presentation code; `None` while unmounted.
	pub fn ui_context(&self) -> Option<UiContext> {
		self.ui.read().clone()
	}

	fn with_set<T>(&self, f: impl FnOnce(&ExtensionSet) -> T) -> Option<T> {
		self.mounted.lock().as_ref().map(|mounted| f(&mounted.set))
	}

	fn apply_file_config(&self, ext: &Arc<dyn Extension>) -> Result<()> {
		if let Some(config) = self.config.extension_config(ext.id()) {
			ext.configure(config)?;
		}
		Ok(())
	}

	fn compose(&self, extensions: Vec<Arc<dyn Extension>>) -> Result<ExtensionSet> {
		Ok(ExtensionSet::compose_with(extensions, self.config.composition.duplicate_policy)?)
	}

	/// Composes first so a rejected composition leaves the current one mounted.
	fn remount(&self, extensions: Vec<Arc<dyn Extension>>) -> Result<()> {
		let set = self.compose(extensions)?;
		self.mount_set(set)
	}

	fn mount_set(&self, set: ExtensionSet) -> Result<()> {
		let mut mounted = self.mounted.lock();
		if let Some(previous) = mounted.take() {
			self.tear_down(previous);
		}

		let mut records: Vec<RegistrationRecord> = Vec::with_capacity(set.len());
		for ext in set.registration_order() {
			let cx = RegisterCx::new(&self.document, &self.viewport, &self.registrar, set.commands(), ext.config());
			match ext.register(&cx) {
				Ok(teardown) => {
					tracing::debug!(ext = %ext.id(), priority = ext.meta().init_priority, "extension.register");
					records.push(RegistrationRecord {
						id: Arc::clone(&ext.meta().id),
						teardown,
					});
				}
				Err(err) => {
					tracing::debug!(ext = %ext.id(), error = %err, "extension.register_failed");
					for record in records.into_iter().rev() {
						record.tear_down();
					}
					self.reset_runtime();
					return Err(err.into());
				}
			}
		}

		self.menus.set_commands(set.commands().clone());
		let mut watchers = vec![self.scheduler.attach_document(&self.document)];
		for (id, notifier) in set.change_notifiers() {
			tracing::trace!(ext = %id, "state.notifier.attach");
			watchers.push(self.scheduler.attach_notifier(&notifier));
		}
		drop(self.scheduler.set_queries(set.state_queries().clone()));
		*self.ui.write() = Some(UiContext::new(
			set.commands().clone(),
			self.scheduler.subscribe(),
			self.menus.clone(),
			set.fragments().to_vec(),
		));

		tracing::debug!(
			extensions = set.len(),
			commands = set.commands().len(),
			state_queries = set.state_queries().len(),
			"session.mount"
		);
		*mounted = Some(Mounted {
			set,
			records,
			watchers: Subscription::all(watchers),
		});
		Ok(())
	}

	fn tear_down(&self, mounted: Mounted) {
		let Mounted { records, watchers, .. } = mounted;
		watchers.cancel();
		for record in records.into_iter().rev() {
			record.tear_down();
		}
		self.reset_runtime();
	}

	fn reset_runtime(&self) {
		*self.ui.write() = None;
		self.menus.hide();
		self.menus.set_commands(CommandMap::default());
		self.scheduler.clear();
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.unmount();
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("extensions", &self.extension_ids())
			.field("scheduler", &self.scheduler)
			.field("menus", &self.menus)
			.finish_non_exhaustive()
	}
}
