//! Ordered listener tables with drop-to-unsubscribe handles.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;


/// Teardown handle returned by every subscription.
///
/// The teardown runs exactly once: on [`Subscription::cancel`] or when the
/// handle is dropped, whichever comes first.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	teardown: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
	/// Wraps a teardown callback.
	pub fn new(teardown: impl FnOnce() + Send + Sync + 'static) -> Self {
		Self {
			teardown: Some(Box::new(teardown)),
		}
	}

	/// A subscription with nothing to tear down.
	pub fn noop() -> Self {
		Self { teardown: None }
	}

	/// Combines several subscriptions; they are torn down in reverse order.
	pub fn all(subscriptions: Vec<Subscription>) -> Self {
		Self::new(move || {
			for sub in subscriptions.into_iter().rev() {
				sub.cancel();
			}
		})
	}

	/// Runs the teardown now.
	pub fn cancel(mut self) {
		self.run();
	}

	/// Returns true until the teardown has run.
	pub fn is_active(&self) -> bool {
		self.teardown.is_some()
	}

	fn run(&mut self) {
		if let Some(teardown) = self.teardown.take() {
			teardown();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.run();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").field("active", &self.is_active()).finish()
	}
}

struct Table<T: ?Sized> {
	next_id: u64,
	entries: BTreeMap<u64, Arc<T>>,
}

/// Listener table that notifies in subscription order.
///
/// Callers take a [`snapshot`](Self::snapshot) and invoke it without holding
/// the table lock, so a listener may subscribe, unsubscribe, or trigger a
/// nested notification while being called.
pub struct Listeners<T: ?Sized> {
	table: Arc<Mutex<Table<T>>>,
}

impl<T: ?Sized> Clone for Listeners<T> {
	fn clone(&self) -> Self {
		Self {
			table: Arc::clone(&self.table),
		}
	}
}

impl<T: ?Sized> Default for Listeners<T> {
	fn default() -> Self {
		Self {
			table: Arc::new(Mutex::new(Table {
				next_id: 0,
				entries: BTreeMap::new(),
			})),
		}
	}
}

impl<T: ?Sized + Send + Sync + 'static> Listeners<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a listener; dropping the returned handle removes it.
	pub fn subscribe(&self, listener: Arc<T>) -> Subscription {
		let id = {
			let mut table = self.table.lock();
			table.next_id += 1;
			let id = table.next_id;
			table.entries.insert(id, listener);
			id
		};
		let weak: Weak<Mutex<Table<T>>> = Arc::downgrade(&self.table);
		Subscription::new(move || {
			if let Some(table) = weak.upgrade() {
				table.lock().entries.remove(&id);
			}
		})
	}

	/// Listeners in subscription order.
	pub fn snapshot(&self) -> Vec<Arc<T>> {
		self.table.lock().entries.values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.table.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.lock().entries.is_empty()
	}
}

type ChangeFn = dyn Fn() + Send + Sync;

/// Argument-less change signal an extension exposes to say "my state moved".
#[derive(Clone, Default)]
pub struct ChangeNotifier {
	listeners: Listeners<ChangeFn>,
}

impl ChangeNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
		self.listeners.subscribe(Arc::new(listener))
	}

	/// Calls every listener in subscription order.
	pub fn notify(&self) {
		for listener in self.listeners.snapshot() {
			listener();
		}
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl std::fmt::Debug for ChangeNotifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChangeNotifier")
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
