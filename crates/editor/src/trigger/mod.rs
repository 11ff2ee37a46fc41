//! In-line trigger detection before the caret.
//!
//! A [`TriggerScanner`] re-runs [`scan`] on every committed transaction. While
//! the text before the caret ends in `<boundary><trigger><query>` it tracks an
//! active [`MatchSpan`], filters its entries by the query and exposes a
//! floating-menu position derived from the live caret rectangle. Executing an
//! entry replaces exactly the span.
//!
//! The slash-command and emoji menus are two instances of the same scanner
//! with different options and entry tables; see [`crate::extensions`].

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use quill_primitives::{
	BoxFutureStatic, CharIdx, ChangeNotifier, Document, DocumentExt, EditorState, Listeners, NodeKey, Point,
	Subscription, UpdateTag, Viewport,
};
use quill_registry::{CommandMap, CommandOutput};
use serde_json::Value;

use crate::error::{Result, SessionError};

mod symbols;

pub use symbols::{SYMBOL_REPLACE_TAG, SymbolMatch, SymbolReplacer};


/// Tag carried by the transaction that executes an entry.
pub const EXECUTE_TAG: UpdateTag = "trigger-execute";

/// Detection limits for one scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
	pub trigger: char,
	/// Longest query, in characters, that keeps the match open.
	pub max_query_len: usize,
	/// Cap on filtered entries.
	pub max_entries: usize,
}

impl ScanOptions {
	pub const fn slash() -> Self {
		Self {
			trigger: '/',
			max_query_len: 32,
			max_entries: 10,
		}
	}

	pub const fn emoji() -> Self {
		Self {
			trigger: ':',
			max_query_len: 24,
			max_entries: 8,
		}
	}
}

/// The trigger plus query currently eligible for replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
	pub node: NodeKey,
	/// Offset of the trigger character.
	pub start: CharIdx,
	/// Caret offset.
	pub end: CharIdx,
	/// Text between the trigger and the caret.
	pub query: String,
}

impl MatchSpan {
	fn key(&self) -> (NodeKey, CharIdx) {
		(self.node, self.start)
	}
}

/// Detects an active trigger in `state`.
///
/// Returns `None` unless the selection is a caret inside a text node, the last
/// trigger before the caret sits at start of text or after whitespace, and the
/// query after it has no whitespace and is at most `max_query_len` characters.
pub fn scan(state: &EditorState, options: &ScanOptions) -> Option<MatchSpan> {
	let caret = state.caret()?;
	let before = caret.before;
	let trigger_at = before.rfind(options.trigger)?;
	let prefix = &before[..trigger_at];
	if prefix.chars().next_back().is_some_and(|c| !c.is_whitespace()) {
		return None;
	}
	let query = &before[trigger_at + options.trigger.len_utf8()..];
	if query.chars().any(char::is_whitespace) || query.chars().count() > options.max_query_len {
		return None;
	}
	Some(MatchSpan {
		node: caret.position.node,
		start: prefix.chars().count(),
		end: caret.position.offset,
		query: query.to_owned(),
	})
}

/// What executing an entry does.
#[derive(Clone)]
pub enum EntryAction {
	/// Replace the span with literal text.
	Insert(String),
	/// Replace the span with text computed from the query.
	Produce(Arc<dyn Fn(&str) -> String + Send + Sync>),
	/// Delete the span, then dispatch a session command.
	Command { name: Box<str>, args: Value },
}

impl EntryAction {
	fn replacement(&self, query: &str) -> String {
		match self {
			Self::Insert(text) => text.clone(),
			Self::Produce(produce) => produce(query),
			Self::Command { .. } => String::new(),
		}
	}
}

impl std::fmt::Debug for EntryAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Insert(text) => f.debug_tuple("Insert").field(text).finish(),
			Self::Produce(_) => f.write_str("Produce(..)"),
			Self::Command { name, args } => f.debug_struct("Command").field("name", name).field("args", args).finish(),
		}
	}
}

/// One selectable row in a trigger menu.
#[derive(Debug, Clone)]
pub struct TriggerEntry {
	pub id: Box<str>,
	pub label: Box<str>,
	/// Extra search terms.
	pub keywords: Vec<Box<str>>,
	/// Short aliases (`smile`, `h1`).
	pub shortcuts: Vec<Box<str>>,
	pub action: EntryAction,
}

impl TriggerEntry {
	fn with_action(id: impl Into<Box<str>>, label: impl Into<Box<str>>, action: EntryAction) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			keywords: Vec::new(),
			shortcuts: Vec::new(),
			action,
		}
	}

	pub fn insert(id: impl Into<Box<str>>, label: impl Into<Box<str>>, text: impl Into<String>) -> Self {
		Self::with_action(id, label, EntryAction::Insert(text.into()))
	}

	pub fn produce(
		id: impl Into<Box<str>>,
		label: impl Into<Box<str>>,
		produce: impl Fn(&str) -> String + Send + Sync + 'static,
	) -> Self {
		Self::with_action(id, label, EntryAction::Produce(Arc::new(produce)))
	}

	pub fn command(id: impl Into<Box<str>>, label: impl Into<Box<str>>, name: impl Into<Box<str>>) -> Self {
		Self::with_action(
			id,
			label,
			EntryAction::Command {
				name: name.into(),
				args: Value::Null,
			},
		)
	}

	pub fn with_args(mut self, args: Value) -> Self {
		if let EntryAction::Command { args: slot, .. } = &mut self.action {
			*slot = args;
		}
		self
	}

	pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		self.keywords.extend(keywords.into_iter().map(Into::into));
		self
	}

	pub fn with_shortcuts<I, S>(mut self, shortcuts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		self.shortcuts.extend(shortcuts.into_iter().map(Into::into));
		self
	}

	/// Case-insensitive substring match against label, keywords and shortcuts.
	///
	/// `needle` must already be lowercase.
	fn matches_lowercase(&self, needle: &str) -> bool {
		needle.is_empty()
			|| std::iter::once(&self.label)
				.chain(&self.keywords)
				.chain(&self.shortcuts)
				.any(|hay| hay.to_lowercase().contains(needle))
	}
}

/// Filters `entries` by `query`, keeping their order, capped at `limit`.
pub fn filter_entries<'a>(
	entries: impl IntoIterator<Item = &'a TriggerEntry>,
	query: &str,
	limit: usize,
) -> Vec<TriggerEntry> {
	let needle = query.to_lowercase();
	entries
		.into_iter()
		.filter(|entry| entry.matches_lowercase(&needle))
		.take(limit)
		.cloned()
		.collect()
}

/// External, possibly slow source of entries.
pub trait EntryCatalog: Send + Sync {
	fn search(&self, query: &str, limit: usize) -> BoxFutureStatic<anyhow::Result<Vec<TriggerEntry>>>;
}

/// Observable scanner state.
#[derive(Debug, Clone, Default)]
pub struct ScannerView {
	pub span: Option<MatchSpan>,
	/// Where the floating menu goes, below the caret.
	pub position: Option<Point>,
	pub entries: Vec<TriggerEntry>,
	pub selected: Option<usize>,
}

impl ScannerView {
	pub fn is_open(&self) -> bool {
		self.span.is_some()
	}

	pub fn query(&self) -> Option<&str> {
		self.span.as_ref().map(|span| span.query.as_str())
	}

	pub fn selected_entry(&self) -> Option<&TriggerEntry> {
		self.entries.get(self.selected?)
	}
}

impl PartialEq for ScannerView {
	fn eq(&self, other: &Self) -> bool {
		self.span == other.span
			&& self.position == other.position
			&& self.selected == other.selected
			&& self.entries.iter().map(|e| &e.id).eq(other.entries.iter().map(|e| &e.id))
	}
}

/// Result of executing an entry.
pub enum Execution {
	/// The span was replaced with this text.
	Inserted(String),
	/// The span was deleted and a command dispatched; await for its output.
	Command(BoxFutureStatic<quill_registry::Result<CommandOutput>>),
}

impl std::fmt::Debug for Execution {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Inserted(text) => f.debug_tuple("Inserted").field(text).finish(),
			Self::Command(_) => f.write_str("Command(..)"),
		}
	}
}

/// Callback invoked after every change of a scanner's view.
pub type ScannerListener = dyn Fn(&ScannerView) + Send + Sync;

/// Tracks one trigger character against the live document.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TriggerScanner {
	inner: Arc<Inner>,
}

struct Inner {
	name: &'static str,
	options: RwLock<ScanOptions>,
	entries: RwLock<Arc<[TriggerEntry]>>,
	/// Entry table the open view was filtered from.
	filtered_from: Mutex<Option<Arc<[TriggerEntry]>>>,
	catalog: RwLock<Option<Arc<dyn EntryCatalog>>>,
	view: Mutex<ScannerView>,
	/// Trigger the user dismissed; stays closed until the caret leaves it.
	dismissed: Mutex<Option<(NodeKey, CharIdx)>>,
	session: RwLock<Option<Attached>>,
	listeners: Listeners<ScannerListener>,
	notifier: ChangeNotifier,
}

#[derive(Clone)]
struct Attached {
	document: Arc<dyn Document>,
	viewport: Arc<dyn Viewport>,
	commands: CommandMap,
}

impl TriggerScanner {
	/// `name` labels log events ("slash", "emoji").
	pub fn new(name: &'static str, options: ScanOptions, entries: Vec<TriggerEntry>) -> Self {
		Self {
			inner: Arc::new(Inner {
				name,
				options: RwLock::new(options),
				entries: RwLock::new(entries.into()),
				filtered_from: Mutex::new(None),
				catalog: RwLock::new(None),
				view: Mutex::new(ScannerView::default()),
				dismissed: Mutex::new(None),
				session: RwLock::new(None),
				listeners: Listeners::new(),
				notifier: ChangeNotifier::new(),
			}),
		}
	}

	pub fn name(&self) -> &'static str {
		self.inner.name
	}

	pub fn options(&self) -> ScanOptions {
		*self.inner.options.read()
	}

	/// Takes effect on the next scan.
	pub fn set_options(&self, options: ScanOptions) {
		*self.inner.options.write() = options;
	}

	/// Replaces the static entry table; an open menu is refiltered at once.
	pub fn set_entries(&self, entries: Vec<TriggerEntry>) {
		*self.inner.entries.write() = entries.into();
		if let Some(session) = self.attached() {
			self.on_document_update(&session.document.read());
		}
	}

	pub fn set_catalog(&self, catalog: Option<Arc<dyn EntryCatalog>>) {
		*self.inner.catalog.write() = catalog;
	}

	/// Starts tracking `document`. The teardown detaches and closes the menu.
	pub fn attach(&self, document: &Arc<dyn Document>, viewport: &Arc<dyn Viewport>, commands: &CommandMap) -> Subscription {
		*self.inner.session.write() = Some(Attached {
			document: Arc::clone(document),
			viewport: Arc::clone(viewport),
			commands: commands.clone(),
		});
		self.on_document_update(&document.read());

		let weak = Arc::downgrade(&self.inner);
		let source = Arc::downgrade(document);
		let updates = document.subscribe(move |event| {
			// A newer commit is already queued; its event supersedes this one.
			if source.upgrade().is_some_and(|doc| doc.read().revision() > event.state.revision()) {
				return;
			}
			if let Some(scanner) = upgrade(&weak) {
				scanner.on_document_update(&event.state);
			}
		});
		let weak = Arc::downgrade(&self.inner);
		let detach = Subscription::new(move || {
			if let Some(scanner) = upgrade(&weak) {
				*scanner.inner.session.write() = None;
				*scanner.inner.dismissed.lock() = None;
				scanner.transition(|view| *view = ScannerView::default());
			}
		});
		Subscription::all(vec![updates, detach])
	}

	pub fn is_attached(&self) -> bool {
		self.inner.session.read().is_some()
	}

	/// Re-evaluates the trigger against a committed state.
	pub fn on_document_update(&self, state: &EditorState) {
		let options = self.options();
		let span = {
			let mut dismissed = self.inner.dismissed.lock();
			match scan(state, &options) {
				Some(span) if *dismissed == Some(span.key()) => None,
				span => {
					*dismissed = None;
					span
				}
			}
		};

		let viewport = self.attached().map(|session| session.viewport);
		let position = match (&span, &viewport) {
			(Some(_), Some(viewport)) => match viewport.caret_rect(state) {
				Some(rect) => Some(rect.bottom_left()),
				None => {
					tracing::trace!(scanner = self.inner.name, "trigger.position_lost");
					self.transition(|view| *view = ScannerView::default());
					return;
				}
			},
			_ => None,
		};

		let entries = Arc::clone(&self.inner.entries.read());
		let table_changed = {
			let mut filtered_from = self.inner.filtered_from.lock();
			let changed = !filtered_from.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, &entries));
			*filtered_from = span.is_some().then(|| Arc::clone(&entries));
			changed
		};
		self.transition(|view| {
			let Some(span) = span else {
				*view = ScannerView::default();
				return;
			};
			if table_changed || view.query() != Some(span.query.as_str()) {
				view.entries = filter_entries(entries.iter(), &span.query, options.max_entries);
				view.selected = (!view.entries.is_empty()).then_some(0);
			}
			view.span = Some(span);
			view.position = position;
		});
	}

	/// Recomputes the menu position after scroll or resize.
	///
	/// Closes the menu when the caret can no longer be located.
	pub fn reposition(&self) {
		if !self.is_open() {
			return;
		}
		let Some(session) = self.attached() else {
			return;
		};
		let state = session.document.read();
		match session.viewport.caret_rect(&state) {
			Some(rect) => {
				self.transition(|view| view.position = Some(rect.bottom_left()));
			}
			None => {
				tracing::trace!(scanner = self.inner.name, "trigger.position_lost");
				self.transition(|view| *view = ScannerView::default());
			}
		}
	}

	pub fn view(&self) -> ScannerView {
		self.inner.view.lock().clone()
	}

	pub fn is_open(&self) -> bool {
		self.inner.view.lock().is_open()
	}

	/// Query of the active match.
	pub fn active_query(&self) -> Option<String> {
		self.inner.view.lock().query().map(str::to_owned)
	}

	pub fn span(&self) -> Option<MatchSpan> {
		self.inner.view.lock().span.clone()
	}

	pub fn position(&self) -> Option<Point> {
		self.inner.view.lock().position
	}

	pub fn entries(&self) -> Vec<TriggerEntry> {
		self.inner.view.lock().entries.clone()
	}

	pub fn selected(&self) -> Option<usize> {
		self.inner.view.lock().selected
	}

	/// Filters the static entry table by `text`.
	pub fn query(&self, text: &str) -> Vec<TriggerEntry> {
		let limit = self.options().max_entries;
		filter_entries(self.inner.entries.read().iter(), text, limit)
	}

	/// Static matches followed by catalog results, deduplicated by id.
	///
	/// A failing catalog contributes nothing.
	pub fn query_async(&self, text: &str) -> BoxFutureStatic<Vec<TriggerEntry>> {
		let limit = self.options().max_entries;
		let mut found = self.query(text);
		let catalog = self.inner.catalog.read().clone();
		let name = self.inner.name;
		let pending = catalog.map(|catalog| catalog.search(text, limit));
		Box::pin(async move {
			let Some(pending) = pending else {
				return found;
			};
			match pending.await {
				Ok(extra) => {
					for entry in extra {
						if found.len() >= limit {
							break;
						}
						if !found.iter().any(|e| e.id == entry.id) {
							found.push(entry);
						}
					}
				}
				Err(err) => tracing::debug!(scanner = name, error = %err, "trigger.catalog_failed"),
			}
			found
		})
	}

	/// Re-filters the open menu with catalog results.
	///
	/// Results are dropped if the query changed while the catalog was searching.
	pub async fn refresh(&self) {
		let Some(query) = self.active_query() else {
			return;
		};
		let entries = self.query_async(&query).await;
		self.transition(|view| {
			if view.query() == Some(query.as_str()) {
				view.selected = (!entries.is_empty()).then_some(0);
				view.entries = entries;
			}
		});
	}

	pub fn select_next(&self) {
		self.transition(|view| {
			let len = view.entries.len();
			if len > 0 {
				view.selected = Some(view.selected.map_or(0, |i| (i + 1) % len));
			}
		});
	}

	pub fn select_prev(&self) {
		self.transition(|view| {
			let len = view.entries.len();
			if len > 0 {
				view.selected = Some(view.selected.map_or(len - 1, |i| (i + len - 1) % len));
			}
		});
	}

	/// Replaces the active span (or inserts at the caret) with entry `id`.
	pub fn execute(&self, id: &str) -> Result<Execution> {
		let session = self.attached().ok_or(SessionError::Detached("trigger scanner"))?;
		let entry = self.find_entry(id).ok_or_else(|| SessionError::UnknownEntry(id.to_owned()))?;
		let span = self.span();
		let trigger = self.options().trigger;
		let text = entry.action.replacement(span.as_ref().map_or("", |span| span.query.as_str()));

		session.document.edit_tagged(Some(EXECUTE_TAG), |state: &mut EditorState| match &span {
			Some(span) if span_is_live(state, span, trigger) => state.splice(span.node, span.start, span.end, &text),
			_ => state.type_text(&text),
		})?;
		tracing::debug!(scanner = self.inner.name, entry = %entry.id, "trigger.execute");

		*self.inner.dismissed.lock() = None;
		self.transition(|view| *view = ScannerView::default());

		Ok(match entry.action {
			EntryAction::Command { name, args } => Execution::Command(session.commands.execute(&name, args)),
			EntryAction::Insert(_) | EntryAction::Produce(_) => Execution::Inserted(text),
		})
	}

	/// Executes the highlighted entry, if any.
	pub fn execute_selected(&self) -> Result<Option<Execution>> {
		let Some(id) = self.inner.view.lock().selected_entry().map(|e| e.id.clone()) else {
			return Ok(None);
		};
		self.execute(&id).map(Some)
	}

	/// Closes the menu until the caret leaves the current trigger.
	///
	/// Returns false (and notifies nobody) when nothing was open.
	pub fn dismiss(&self) -> bool {
		let Some(key) = self.inner.view.lock().span.as_ref().map(MatchSpan::key) else {
			return false;
		};
		*self.inner.dismissed.lock() = Some(key);
		tracing::trace!(scanner = self.inner.name, "trigger.dismiss");
		self.transition(|view| *view = ScannerView::default())
	}

	/// Subscribes to view changes.
	pub fn subscribe(&self, listener: impl Fn(&ScannerView) + Send + Sync + 'static) -> Subscription {
		self.inner.listeners.subscribe(Arc::new(listener))
	}

	/// Fires after every view change; feeds the state scheduler.
	pub fn notifier(&self) -> ChangeNotifier {
		self.inner.notifier.clone()
	}

	fn attached(&self) -> Option<Attached> {
		self.inner.session.read().clone()
	}

	fn find_entry(&self, id: &str) -> Option<TriggerEntry> {
		let visible = self.inner.view.lock().entries.iter().find(|e| &*e.id == id).cloned();
		visible.or_else(|| self.inner.entries.read().iter().find(|e| &*e.id == id).cloned())
	}

	/// Applies `f` to a copy of the view and publishes it if it changed.
	fn transition(&self, f: impl FnOnce(&mut ScannerView)) -> bool {
		let (was_open, next) = {
			let mut view = self.inner.view.lock();
			let mut next = view.clone();
			f(&mut next);
			if next == *view {
				return false;
			}
			let was_open = view.is_open();
			*view = next.clone();
			(was_open, next)
		};
		match (was_open, next.is_open()) {
			(false, true) => tracing::trace!(scanner = self.inner.name, query = ?next.query(), "trigger.open"),
			(true, false) => tracing::trace!(scanner = self.inner.name, "trigger.close"),
			_ => {}
		}
		for listener in self.inner.listeners.snapshot() {
			listener(&next);
		}
		self.inner.notifier.notify();
		true
	}
}

impl std::fmt::Debug for TriggerScanner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TriggerScanner")
			.field("name", &self.inner.name)
			.field("options", &self.options())
			.field("view", &self.view())
			.finish_non_exhaustive()
	}
}

fn upgrade(weak: &Weak<Inner>) -> Option<TriggerScanner> {
	weak.upgrade().map(|inner| TriggerScanner { inner })
}

/// True if `span` still covers a trigger in `state`.
fn span_is_live(state: &EditorState, span: &MatchSpan, trigger: char) -> bool {
	state
		.text(span.node)
		.is_ok_and(|text| text.chars().count() >= span.end && text.chars().nth(span.start) == Some(trigger))
}
