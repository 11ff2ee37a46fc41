//! Version-fenced re-evaluation of state queries.
//!
//! Every trigger (a committed document transaction or an extension's change
//! notifier firing) starts a round: the version counter is bumped, every
//! query is started, and the results are awaited concurrently. A round only
//! publishes if no newer round was started in the meantime, and only when the
//! values actually differ from the current snapshot.
//!
//! Failing or panicking queries read as `false`.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use futures::future::join_all;
use indexmap::IndexMap;
use parking_lot::RwLock;
use quill_primitives::{ChangeNotifier, Document, DocumentExt, Subscription};
use quill_registry::{QueryFuture, StateQueryMap};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;


/// Query name to value. Published snapshots are never mutated.
pub type StateValues = IndexMap<Box<str>, bool>;

/// A published snapshot. Consumers may compare with [`Arc::ptr_eq`] to skip work.
pub type StateSnapshot = Arc<StateValues>;

/// What happened to one evaluation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
	/// The snapshot was replaced.
	Published,
	/// Values matched the current snapshot; it was kept as is.
	Unchanged,
	/// A newer round started first; the results were dropped.
	Stale,
}

/// Drives the session's state snapshot.
///
/// Cheap to clone; clones share the version counter and the snapshot channel.
#[derive(Clone)]
pub struct StateScheduler {
	inner: Arc<Inner>,
}

struct Inner {
	version: AtomicU64,
	queries: RwLock<StateQueryMap>,
	tx: watch::Sender<StateSnapshot>,
	handle: Handle,
}

impl StateScheduler {
	/// Creates a scheduler with an empty snapshot. Rounds run on `handle`.
	pub fn new(handle: Handle) -> Self {
		let (tx, _rx) = watch::channel(StateSnapshot::default());
		Self {
			inner: Arc::new(Inner {
				version: AtomicU64::new(0),
				queries: RwLock::new(StateQueryMap::default()),
				tx,
				handle,
			}),
		}
	}

	/// Latest version handed out.
	pub fn version(&self) -> u64 {
		self.inner.version.load(Ordering::Acquire)
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> StateSnapshot {
		Arc::clone(&self.inner.tx.borrow())
	}

	/// Receiver woken only when a round publishes a different snapshot.
	pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
		self.inner.tx.subscribe()
	}

	pub fn queries(&self) -> StateQueryMap {
		self.inner.queries.read().clone()
	}

	/// Swaps the query map and starts a round against it.
	pub fn set_queries(&self, queries: StateQueryMap) -> JoinHandle<RoundOutcome> {
		*self.inner.queries.write() = queries;
		self.trigger()
	}

	/// Starts a round.
	///
	/// Queries are invoked before this returns; only their futures run on the
	/// runtime. Must be called from a thread that can reach the runtime handle.
	pub fn trigger(&self) -> JoinHandle<RoundOutcome> {
		let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;
		let pending = start_queries(&self.inner.queries.read());
		tracing::trace!(version, queries = pending.len(), "state.round.scheduled");
		let inner = Arc::clone(&self.inner);
		self.inner.handle.spawn(async move {
			let values = evaluate(pending).await;
			inner.publish(version, values)
		})
	}

	/// Fences off in-flight rounds, drops the queries and publishes an empty snapshot.
	pub fn clear(&self) {
		self.inner.version.fetch_add(1, Ordering::AcqRel);
		*self.inner.queries.write() = StateQueryMap::default();
		self.inner.tx.send_if_modified(|current| {
			if current.is_empty() {
				return false;
			}
			*current = StateSnapshot::default();
			true
		});
	}

	/// Runs a round on every committed transaction of `document`.
	pub fn attach_document(&self, document: &Arc<dyn Document>) -> Subscription {
		let weak = self.downgrade();
		document.subscribe(move |_| {
			if let Some(scheduler) = upgrade(&weak) {
				drop(scheduler.trigger());
			}
		})
	}

	/// Runs a round every time `notifier` fires.
	pub fn attach_notifier(&self, notifier: &ChangeNotifier) -> Subscription {
		let weak = self.downgrade();
		notifier.subscribe(move || {
			if let Some(scheduler) = upgrade(&weak) {
				drop(scheduler.trigger());
			}
		})
	}

	fn downgrade(&self) -> Weak<Inner> {
		Arc::downgrade(&self.inner)
	}
}

fn upgrade(weak: &Weak<Inner>) -> Option<StateScheduler> {
	weak.upgrade().map(|inner| StateScheduler { inner })
}

impl Inner {
	fn publish(&self, version: u64, values: StateValues) -> RoundOutcome {
		let mut outcome = RoundOutcome::Stale;
		// The fence is checked under the channel lock so a round that passed it
		// cannot publish after a newer round did.
		self.tx.send_if_modified(|current| {
			if self.version.load(Ordering::Acquire) != version {
				return false;
			}
			if **current == values {
				outcome = RoundOutcome::Unchanged;
				return false;
			}
			*current = Arc::new(values);
			outcome = RoundOutcome::Published;
			true
		});
		match outcome {
			RoundOutcome::Stale => tracing::debug!(version, "state.round.stale"),
			RoundOutcome::Unchanged => tracing::trace!(version, "state.round.unchanged"),
			RoundOutcome::Published => tracing::trace!(version, "state.round.published"),
		}
		outcome
	}
}

impl std::fmt::Debug for StateScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StateScheduler")
			.field("version", &self.version())
			.field("snapshot", &*self.snapshot())
			.finish()
	}
}

/// Invokes every query. A query that panics while being invoked reads as `false`.
fn start_queries(queries: &StateQueryMap) -> Vec<(Box<str>, QueryFuture)> {
	queries
		.iter()
		.map(|(name, query)| {
			let future = match std::panic::catch_unwind(AssertUnwindSafe(|| query())) {
				Ok(future) => future,
				Err(_) => Box::pin(std::future::ready(Err(anyhow::anyhow!("query panicked on invocation")))),
			};
			(Box::from(name), future)
		})
		.collect()
}

/// Awaits started queries concurrently, coercing failures to `false`.
pub async fn evaluate(pending: Vec<(Box<str>, QueryFuture)>) -> StateValues {
	let results = join_all(pending.into_iter().map(|(name, future)| async move {
		let value = match AssertUnwindSafe(future).catch_unwind().await {
			Ok(Ok(value)) => value,
			Ok(Err(err)) => {
				tracing::warn!(query = %name, error = %err, "state query failed");
				false
			}
			Err(_) => {
				tracing::warn!(query = %name, "state query panicked");
				false
			}
		};
		(name, value)
	}))
	.await;
	results.into_iter().collect()
}

/// Starts and evaluates every query in `queries` once, outside any fence.
pub async fn evaluate_once(queries: &StateQueryMap) -> StateValues {
	evaluate(start_queries(queries)).await
}
