//! Named asynchronous boolean predicates ("is bold active?").

use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use quill_primitives::BoxFutureStatic;

use crate::meta::ExtensionId;

/// Future produced by one state-query evaluation.
pub type QueryFuture = BoxFutureStatic<anyhow::Result<bool>>;
/// Type-erased state query.
pub type StateQueryFn = Arc<dyn Fn() -> QueryFuture + Send + Sync>;

/// A state query contributed by an extension.
#[derive(Clone)]
pub struct StateQueryDef {
	pub name: Box<str>,
	pub query: StateQueryFn,
}

impl StateQueryDef {
	/// Wraps an infallible synchronous predicate.
	pub fn new<F>(name: impl Into<Box<str>>, predicate: F) -> Self
	where
		F: Fn() -> bool + Send + Sync + 'static,
	{
		Self::fallible(name, move || Ok(predicate()))
	}

	/// Wraps a synchronous predicate that may fail.
	pub fn fallible<F>(name: impl Into<Box<str>>, predicate: F) -> Self
	where
		F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			query: Arc::new(move || -> QueryFuture { Box::pin(std::future::ready(predicate())) }),
		}
	}

	/// Wraps an asynchronous predicate.
	pub fn new_async<F, Fut>(name: impl Into<Box<str>>, predicate: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
	{
		Self {
			name: name.into(),
			query: Arc::new(move || -> QueryFuture { Box::pin(predicate()) }),
		}
	}
}

impl std::fmt::Debug for StateQueryDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StateQueryDef").field("name", &self.name).finish_non_exhaustive()
	}
}

#[derive(Debug, Clone)]
pub struct StateQueryEntry {
	pub owner: ExtensionId,
	pub def: StateQueryDef,
}

/// Session-wide state-query namespace produced by composition.
#[derive(Debug, Clone, Default)]
pub struct StateQueryMap {
	entries: Arc<IndexMap<Box<str>, StateQueryEntry>>,
}

impl StateQueryMap {
	pub(crate) fn from_entries(entries: IndexMap<Box<str>, StateQueryEntry>) -> Self {
		Self {
			entries: Arc::new(entries),
		}
	}

	/// Builds a map directly from definitions, bypassing composition.
	///
	/// Later definitions replace earlier ones with the same name.
	pub fn from_defs(owner: impl Into<ExtensionId>, defs: impl IntoIterator<Item = StateQueryDef>) -> Self {
		let owner = owner.into();
		let entries = defs
			.into_iter()
			.map(|def| {
				(
					def.name.clone(),
					StateQueryEntry {
						owner: Arc::clone(&owner),
						def,
					},
				)
			})
			.collect();
		Self::from_entries(entries)
	}

	pub fn get(&self, name: &str) -> Option<&StateQueryEntry> {
		self.entries.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(|name| &**name)
	}

	/// `(name, query)` pairs in first-contribution order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &StateQueryFn)> {
		self.entries.iter().map(|(name, entry)| (&**name, &entry.def.query))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
