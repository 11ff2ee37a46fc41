//! In-process document engine.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::document::{Document, UpdateEvent, UpdateListener, UpdateTag};
use crate::error::{EditError, Result};
use crate::listeners::{Listeners, Subscription};
use crate::state::EditorState;


/// [`Document`] backed by an in-memory [`EditorState`].
///
/// Listeners may start a new transaction while being notified. The nested
/// transaction commits immediately, but its event is queued until every
/// listener has seen the outer event, so each listener observes commits in
/// revision order.
pub struct MemoryDocument {
	state: Mutex<Arc<EditorState>>,
	in_update: AtomicBool,
	notifying: AtomicBool,
	pending: Mutex<VecDeque<UpdateEvent>>,
	listeners: Listeners<UpdateListener>,
}

impl MemoryDocument {
	pub fn new(state: EditorState) -> Self {
		Self {
			state: Mutex::new(Arc::new(state)),
			in_update: AtomicBool::new(false),
			notifying: AtomicBool::new(false),
			pending: Mutex::new(VecDeque::new()),
			listeners: Listeners::new(),
		}
	}

	/// Convenience constructor: one text node per paragraph.
	pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(EditorState::from_paragraphs(paragraphs))
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Applies `edit` and queues its event; `None` if nothing changed.
	fn commit(&self, tag: Option<UpdateTag>, edit: &mut dyn FnMut(&mut EditorState) -> Result<()>) -> Result<Option<Arc<EditorState>>> {
		if self.in_update.swap(true, Ordering::AcqRel) {
			return Err(EditError::NestedUpdate);
		}
		let _open = ClearOnDrop(&self.in_update);

		let prev = self.read();
		let mut draft = (*prev).clone();
		edit(&mut draft)?;
		if draft == *prev {
			return Ok(None);
		}
		draft.bump_revision();
		let state = Arc::new(draft);
		*self.state.lock() = Arc::clone(&state);
		tracing::trace!(revision = state.revision(), tag = ?tag, "document.commit");
		self.pending.lock().push_back(UpdateEvent {
			prev,
			state: Arc::clone(&state),
			tag,
		});
		Ok(Some(state))
	}

	/// Delivers queued events until the queue is empty.
	///
	/// Only one caller drains at a time; events queued by a nested or
	/// concurrent commit are picked up by the active drain.
	fn drain(&self) {
		loop {
			if self.notifying.swap(true, Ordering::AcqRel) {
				return;
			}
			{
				let _notifying = ClearOnDrop(&self.notifying);
				loop {
					let next = self.pending.lock().pop_front();
					let Some(event) = next else {
						break;
					};
					for listener in self.listeners.snapshot() {
						listener(&event);
					}
				}
			}
			if self.pending.lock().is_empty() {
				return;
			}
		}
	}
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new(EditorState::default())
	}
}

impl Document for MemoryDocument {
	fn read(&self) -> Arc<EditorState> {
		Arc::clone(&self.state.lock())
	}

	fn update(&self, tag: Option<UpdateTag>, edit: &mut dyn FnMut(&mut EditorState) -> Result<()>) -> Result<Arc<EditorState>> {
		let Some(state) = self.commit(tag, edit)? else {
			return Ok(self.read());
		};
		self.drain();
		Ok(state)
	}

	fn on_update(&self, listener: Arc<UpdateListener>) -> Subscription {
		self.listeners.subscribe(listener)
	}
}

/// Clears a scope flag (open transaction, active fan-out) when the scope ends.
struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}
