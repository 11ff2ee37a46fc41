//! Priority-ordered resolution of contextual pointer events into menus.
//!
//! # State machine
//!
//! - `Closed -> Open` when a provider claims a pointer event with a non-empty
//!   item list, or on [`ContextMenuResolver::show`].
//! - `Open -> Open` on [`reposition`](ContextMenuResolver::reposition) or
//!   when another menu replaces the open one.
//! - `Open -> Closed` on a click outside the menu, `Escape`, item activation,
//!   [`hide`](ContextMenuResolver::hide), or when the anchor element leaves
//!   the document.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use quill_primitives::{BoxFutureStatic, ChangeNotifier, EditorState, Listeners, Point, Rect, Size, Subscription, Viewport};
use quill_registry::{
	CommandMap, CommandOutput, ContextMenuProvider, MenuAction, MenuAnchor, MenuItem, MenuRequest, PointerEvent,
	ProviderRegistrar,
};
use rustc_hash::FxHashMap;

use crate::config::ContextMenuConfig;
use crate::error::{Result, SessionError};

#[cfg(test)]
mod tests;

/// Menu contents and placement passed to [`ContextMenuResolver::show`].
#[derive(Debug, Clone)]
pub struct MenuConfig {
	pub items: Vec<MenuItem>,
	/// Pointer coordinates; ignored when `anchor` is set.
	pub position: Point,
	pub anchor: Option<MenuAnchor>,
	pub renderer: Option<Box<str>>,
}

impl MenuConfig {
	pub fn at(position: Point, items: Vec<MenuItem>) -> Self {
		Self {
			items,
			position,
			anchor: None,
			renderer: None,
		}
	}

	pub fn anchored(mut self, anchor: MenuAnchor) -> Self {
		self.anchor = Some(anchor);
		self
	}

	pub fn with_renderer(mut self, renderer: impl Into<Box<str>>) -> Self {
		self.renderer = Some(renderer.into());
		self
	}
}

/// The menu currently on screen.
#[derive(Debug, Clone)]
pub struct OpenMenu {
	pub items: Vec<MenuItem>,
	/// Top-left corner after clamping into the viewport.
	pub position: Point,
	/// Estimated on-screen bounds, used for click-outside detection.
	pub rect: Rect,
	pub anchor: Option<MenuAnchor>,
	pub renderer: Option<Box<str>>,
	/// Provider that produced the menu; `None` for [`ContextMenuResolver::show`].
	pub provider: Option<Box<str>>,
	/// Requested position before clamping.
	pointer: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
	ClickOutside,
	Escape,
	AnchorDisconnected,
	Activated,
	Hidden,
}

/// Notification sent to menu subscribers.
#[derive(Debug)]
pub enum MenuEvent<'a> {
	Opened(&'a OpenMenu),
	Moved(&'a OpenMenu),
	Closed(CloseReason),
}

pub type MenuListener = dyn Fn(&MenuEvent<'_>) + Send + Sync;

/// Result of activating a menu item.
pub enum Activation {
	/// The item's callback ran.
	Callback,
	/// A command was dispatched; await for its output.
	Command(BoxFutureStatic<quill_registry::Result<CommandOutput>>),
}

impl std::fmt::Debug for Activation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Callback => f.write_str("Callback"),
			Self::Command(_) => f.write_str("Command(..)"),
		}
	}
}

#[derive(Clone)]
struct ProviderRecord {
	provider: Arc<dyn ContextMenuProvider>,
	/// Registration sequence; breaks priority ties.
	seq: u64,
}

/// Provider registry plus open-menu state for one session.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ContextMenuResolver {
	inner: Arc<Inner>,
}

struct Inner {
	viewport: Arc<dyn Viewport>,
	config: ContextMenuConfig,
	providers: Mutex<FxHashMap<Box<str>, ProviderRecord>>,
	next_seq: AtomicU64,
	open: Mutex<Option<OpenMenu>>,
	commands: RwLock<CommandMap>,
	listeners: Listeners<MenuListener>,
	notifier: ChangeNotifier,
}

impl ContextMenuResolver {
	pub fn new(viewport: Arc<dyn Viewport>, config: ContextMenuConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				viewport,
				config,
				providers: Mutex::new(FxHashMap::default()),
				next_seq: AtomicU64::new(0),
				open: Mutex::new(None),
				commands: RwLock::new(CommandMap::default()),
				listeners: Listeners::new(),
				notifier: ChangeNotifier::new(),
			}),
		}
	}

	/// Command map used by [`activate`](Self::activate).
	pub fn set_commands(&self, commands: CommandMap) {
		*self.inner.commands.write() = commands;
	}

	/// Registers `provider`, replacing any provider with the same id.
	///
	/// The returned teardown removes the provider unless it was replaced since.
	pub fn register_provider(&self, provider: Arc<dyn ContextMenuProvider>) -> Subscription {
		let id: Box<str> = provider.id().into();
		let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(provider = %id, priority = provider.priority(), "menu.provider.register");
		self.inner
			.providers
			.lock()
			.insert(id.clone(), ProviderRecord { provider, seq });

		let weak = Arc::downgrade(&self.inner);
		Subscription::new(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let mut providers = inner.providers.lock();
			if providers.get(&id).is_some_and(|record| record.seq == seq) {
				providers.remove(&id);
				tracing::debug!(provider = %id, "menu.provider.unregister");
			}
		})
	}

	pub fn unregister_provider(&self, id: &str) -> bool {
		let removed = self.inner.providers.lock().remove(id).is_some();
		if removed {
			tracing::debug!(provider = %id, "menu.provider.unregister");
		}
		removed
	}

	/// Providers in resolution order: priority descending, then registration order.
	pub fn providers(&self) -> Vec<Arc<dyn ContextMenuProvider>> {
		let mut records: Vec<ProviderRecord> = self.inner.providers.lock().values().cloned().collect();
		records.sort_by_key(|record| (std::cmp::Reverse(record.provider.priority()), record.seq));
		records.into_iter().map(|record| record.provider).collect()
	}

	pub fn provider_count(&self) -> usize {
		self.inner.providers.lock().len()
	}

	/// Resolves a contextual pointer event.
	///
	/// Returns true when a menu opened, meaning the host should suppress the
	/// platform menu. The first provider that can handle the event decides;
	/// an empty item list from it means no menu.
	pub fn handle_pointer_event(&self, event: &PointerEvent, state: &EditorState) -> bool {
		let request = MenuRequest { event, state };
		let Some(provider) = self.providers().into_iter().find(|p| p.can_handle(&request)) else {
			tracing::trace!(target_el = ?event.target, "menu.unclaimed");
			return false;
		};
		let items = provider.items(&request);
		if items.is_empty() {
			tracing::debug!(provider = provider.id(), "menu.no_items");
			return false;
		}
		let config = MenuConfig {
			items,
			position: event.position,
			anchor: provider.anchor(&request),
			renderer: provider.renderer().map(Into::into),
		};
		self.open(config, Some(provider.id().into()))
	}

	/// Opens a menu directly. Returns false if its anchor is not connected.
	pub fn show(&self, config: MenuConfig) -> bool {
		self.open(config, None)
	}

	/// Closes the open menu. A second call is a no-op.
	pub fn hide(&self) -> bool {
		self.close(CloseReason::Hidden)
	}

	/// Closes the menu when `point` lies outside it.
	pub fn handle_click(&self, point: Point) -> bool {
		let outside = self.inner.open.lock().as_ref().is_some_and(|menu| !menu.rect.contains(point));
		outside && self.close(CloseReason::ClickOutside)
	}

	/// Closes the menu on `Escape`.
	pub fn handle_key(&self, key: &str) -> bool {
		key == "Escape" && self.close(CloseReason::Escape)
	}

	/// Re-places the open menu after scroll or resize.
	///
	/// Anchored menus follow their element and close once it is disconnected.
	pub fn reposition(&self) {
		let Some(current) = self.open_menu() else {
			return;
		};
		let placed = match current.anchor {
			Some(anchor) => match self.anchor_origin(anchor) {
				Some(origin) => self.place(origin, current.items.len()),
				None => {
					self.close(CloseReason::AnchorDisconnected);
					return;
				}
			},
			None => self.place(current.pointer, current.items.len()),
		};
		let moved = {
			let mut open = self.inner.open.lock();
			match open.as_mut() {
				Some(menu) if menu.rect != placed => {
					menu.rect = placed;
					menu.position = placed.origin();
					Some(menu.clone())
				}
				_ => None,
			}
		};
		if let Some(menu) = moved {
			tracing::trace!(x = menu.position.x, y = menu.position.y, "menu.moved");
			self.emit(&MenuEvent::Moved(&menu));
		}
	}

	/// Runs item `id` of the open menu and closes the menu.
	pub fn activate(&self, id: &str) -> Result<Activation> {
		let item = self
			.inner
			.open
			.lock()
			.as_ref()
			.and_then(|menu| menu.items.iter().find(|item| &*item.id == id).cloned())
			.ok_or_else(|| SessionError::UnknownMenuItem(id.to_owned()))?;
		if item.disabled {
			return Err(SessionError::DisabledMenuItem(id.to_owned()));
		}
		self.close(CloseReason::Activated);
		Ok(match item.action {
			MenuAction::Command { name, args } => {
				let commands = self.inner.commands.read().clone();
				Activation::Command(commands.execute(&name, args))
			}
			MenuAction::Callback(callback) => {
				callback();
				Activation::Callback
			}
		})
	}

	pub fn is_open(&self) -> bool {
		self.inner.open.lock().is_some()
	}

	pub fn open_menu(&self) -> Option<OpenMenu> {
		self.inner.open.lock().clone()
	}

	pub fn subscribe(&self, listener: impl Fn(&MenuEvent<'_>) + Send + Sync + 'static) -> Subscription {
		self.inner.listeners.subscribe(Arc::new(listener))
	}

	/// Fires on every open, move and close.
	pub fn notifier(&self) -> ChangeNotifier {
		self.inner.notifier.clone()
	}

	fn open(&self, config: MenuConfig, provider: Option<Box<str>>) -> bool {
		let pointer = match config.anchor {
			Some(anchor) => match self.anchor_origin(anchor) {
				Some(origin) => origin,
				None => {
					tracing::debug!(element = %anchor.element, "menu.anchor_disconnected");
					return false;
				}
			},
			None => config.position,
		};
		let rect = self.place(pointer, config.items.len());
		let menu = OpenMenu {
			items: config.items,
			position: rect.origin(),
			rect,
			anchor: config.anchor,
			renderer: config.renderer,
			provider,
			pointer,
		};
		tracing::debug!(provider = ?menu.provider, items = menu.items.len(), "menu.open");
		*self.inner.open.lock() = Some(menu.clone());
		self.emit(&MenuEvent::Opened(&menu));
		true
	}

	fn close(&self, reason: CloseReason) -> bool {
		if self.inner.open.lock().take().is_none() {
			return false;
		}
		tracing::debug!(?reason, "menu.close");
		self.emit(&MenuEvent::Closed(reason));
		true
	}

	fn anchor_origin(&self, anchor: MenuAnchor) -> Option<Point> {
		if !self.inner.viewport.is_connected(anchor.element) {
			return None;
		}
		let rect = self.inner.viewport.element_rect(anchor.element)?;
		Some(rect.origin().offset(anchor.offset_x, anchor.offset_y))
	}

	/// Menu bounds for `count` items at `origin`, clamped into the viewport.
	fn place(&self, origin: Point, count: usize) -> Rect {
		let size = Size::new(self.inner.config.menu_width, self.inner.config.item_height * count as f32);
		Rect::from_origin(origin, size).clamp_within(self.inner.viewport.bounds())
	}

	fn emit(&self, event: &MenuEvent<'_>) {
		for listener in self.inner.listeners.snapshot() {
			listener(event);
		}
		self.inner.notifier.notify();
	}
}

impl ProviderRegistrar for ContextMenuResolver {
	fn register_provider(&self, provider: Arc<dyn ContextMenuProvider>) -> Subscription {
		ContextMenuResolver::register_provider(self, provider)
	}

	fn unregister_provider(&self, id: &str) -> bool {
		ContextMenuResolver::unregister_provider(self, id)
	}
}

impl std::fmt::Debug for ContextMenuResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContextMenuResolver")
			.field("providers", &self.provider_count())
			.field("open", &self.is_open())
			.finish_non_exhaustive()
	}
}
