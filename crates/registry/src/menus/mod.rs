//! Context-menu provider contract.
//!
//! Providers claim contextual pointer events. The resolver that walks them
//! lives in the editor runtime; this module only defines what a provider is
//! and how extensions hand providers to the session.

use std::sync::Arc;

use quill_primitives::{EditorState, ElementId, NodeKey, Point, Selection, Subscription};
use serde_json::Value;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
	Primary,
	#[default]
	Secondary,
	Auxiliary,
}

/// A contextual pointer event as delivered by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
	/// Viewport coordinates of the pointer.
	pub position: Point,
	/// Rendered element under the pointer.
	pub target: Option<ElementId>,
	/// Document node under the pointer.
	pub node: Option<NodeKey>,
	pub button: PointerButton,
}

impl PointerEvent {
	pub fn at(position: Point) -> Self {
		Self {
			position,
			target: None,
			node: None,
			button: PointerButton::Secondary,
		}
	}

	pub fn on_element(mut self, element: ElementId) -> Self {
		self.target = Some(element);
		self
	}

	pub fn on_node(mut self, node: NodeKey) -> Self {
		self.node = Some(node);
		self
	}
}

/// What a provider sees when asked to claim an event.
#[derive(Debug, Clone, Copy)]
pub struct MenuRequest<'a> {
	pub event: &'a PointerEvent,
	pub state: &'a EditorState,
}

impl MenuRequest<'_> {
	pub fn target(&self) -> Option<ElementId> {
		self.event.target
	}

	pub fn selection(&self) -> Option<Selection> {
		self.state.selection()
	}
}

/// What activating a menu item does.
#[derive(Clone)]
pub enum MenuAction {
	/// Dispatch a session command.
	Command { name: Box<str>, args: Value },
	/// Run a provider-local callback.
	Callback(Arc<dyn Fn() + Send + Sync>),
}

impl std::fmt::Debug for MenuAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Command { name, args } => f.debug_struct("Command").field("name", name).field("args", args).finish(),
			Self::Callback(_) => f.write_str("Callback(..)"),
		}
	}
}

#[derive(Debug, Clone)]
pub struct MenuItem {
	pub id: Box<str>,
	pub label: Box<str>,
	pub shortcut: Option<Box<str>>,
	pub disabled: bool,
	pub action: MenuAction,
}

impl MenuItem {
	/// An item dispatching `command` with null arguments.
	pub fn command(id: impl Into<Box<str>>, label: impl Into<Box<str>>, command: impl Into<Box<str>>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			shortcut: None,
			disabled: false,
			action: MenuAction::Command {
				name: command.into(),
				args: Value::Null,
			},
		}
	}

	pub fn callback(id: impl Into<Box<str>>, label: impl Into<Box<str>>, f: impl Fn() + Send + Sync + 'static) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			shortcut: None,
			disabled: false,
			action: MenuAction::Callback(Arc::new(f)),
		}
	}

	pub fn with_args(mut self, args: Value) -> Self {
		if let MenuAction::Command { args: slot, .. } = &mut self.action {
			*slot = args;
		}
		self
	}

	pub fn with_shortcut(mut self, shortcut: impl Into<Box<str>>) -> Self {
		self.shortcut = Some(shortcut.into());
		self
	}

	pub fn disabled(mut self, disabled: bool) -> Self {
		self.disabled = disabled;
		self
	}
}

/// Places a menu relative to a rendered element instead of the pointer.
///
/// The menu follows the element's live bounding box through scroll and layout
/// shifts, and closes once the element leaves the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuAnchor {
	pub element: ElementId,
	pub offset_x: f32,
	pub offset_y: f32,
}

impl MenuAnchor {
	pub fn new(element: ElementId, offset_x: f32, offset_y: f32) -> Self {
		Self {
			element,
			offset_x,
			offset_y,
		}
	}
}

/// A capability that can claim contextual pointer events.
pub trait ContextMenuProvider: Send + Sync {
	/// Registry key; registering another provider with the same id replaces this one.
	fn id(&self) -> &str;

	/// Higher priorities are asked first.
	fn priority(&self) -> i32 {
		0
	}

	fn can_handle(&self, request: &MenuRequest<'_>) -> bool;

	fn items(&self, request: &MenuRequest<'_>) -> Vec<MenuItem>;

	/// Anchor the menu to an element rather than the pointer position.
	fn anchor(&self, request: &MenuRequest<'_>) -> Option<MenuAnchor> {
		let _ = request;
		None
	}

	/// Name of a custom renderer registered with the UI layer.
	fn renderer(&self) -> Option<&str> {
		None
	}
}

/// Session-side registry that extensions hand providers to.
pub trait ProviderRegistrar: Send + Sync {
	/// Registers a provider; the returned teardown removes it again unless it
	/// was already replaced by a provider with the same id.
	fn register_provider(&self, provider: Arc<dyn ContextMenuProvider>) -> Subscription;

	/// Removes the provider registered under `id`.
	fn unregister_provider(&self, id: &str) -> bool;
}

type CanHandleFn = dyn Fn(&MenuRequest<'_>) -> bool + Send + Sync;
type ItemsFn = dyn Fn(&MenuRequest<'_>) -> Vec<MenuItem> + Send + Sync;
type AnchorFn = dyn Fn(&MenuRequest<'_>) -> Option<MenuAnchor> + Send + Sync;

/// A provider assembled from closures.
pub struct FnProvider {
	id: Box<str>,
	priority: i32,
	can_handle: Box<CanHandleFn>,
	items: Box<ItemsFn>,
	anchor: Option<Box<AnchorFn>>,
	renderer: Option<Box<str>>,
}

impl FnProvider {
	pub fn new<C, I>(id: impl Into<Box<str>>, priority: i32, can_handle: C, items: I) -> Self
	where
		C: Fn(&MenuRequest<'_>) -> bool + Send + Sync + 'static,
		I: Fn(&MenuRequest<'_>) -> Vec<MenuItem> + Send + Sync + 'static,
	{
		Self {
			id: id.into(),
			priority,
			can_handle: Box::new(can_handle),
			items: Box::new(items),
			anchor: None,
			renderer: None,
		}
	}

	pub fn with_anchor<A>(mut self, anchor: A) -> Self
	where
		A: Fn(&MenuRequest<'_>) -> Option<MenuAnchor> + Send + Sync + 'static,
	{
		self.anchor = Some(Box::new(anchor));
		self
	}

	pub fn with_renderer(mut self, renderer: impl Into<Box<str>>) -> Self {
		self.renderer = Some(renderer.into());
		self
	}

	pub fn into_arc(self) -> Arc<dyn ContextMenuProvider> {
		Arc::new(self)
	}
}

impl ContextMenuProvider for FnProvider {
	fn id(&self) -> &str {
		&self.id
	}

	fn priority(&self) -> i32 {
		self.priority
	}

	fn can_handle(&self, request: &MenuRequest<'_>) -> bool {
		(self.can_handle)(request)
	}

	fn items(&self, request: &MenuRequest<'_>) -> Vec<MenuItem> {
		(self.items)(request)
	}

	fn anchor(&self, request: &MenuRequest<'_>) -> Option<MenuAnchor> {
		self.anchor.as_ref().and_then(|anchor| anchor(request))
	}

	fn renderer(&self) -> Option<&str> {
		self.renderer.as_deref()
	}
}
