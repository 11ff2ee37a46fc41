use std::sync::Arc;

use crate::error::Result;
use crate::listeners::Subscription;
use crate::state::EditorState;

/// Free-form label attached to a transaction (e.g. `"symbol-replace"`).
pub type UpdateTag = &'static str;

/// Callback invoked synchronously after every committed transaction.
pub type UpdateListener = dyn Fn(&UpdateEvent) + Send + Sync;

/// Notification describing one committed transaction.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
	/// State before the transaction.
	pub prev: Arc<EditorState>,
	/// State after the transaction.
	pub state: Arc<EditorState>,
	/// Tag passed to [`Document::update`], if any.
	pub tag: Option<UpdateTag>,
}

impl UpdateEvent {
	/// Returns true if any node changed.
	pub fn content_changed(&self) -> bool {
		self.prev.nodes().ne(self.state.nodes())
	}

	/// Returns true if the selection changed.
	pub fn selection_changed(&self) -> bool {
		self.prev.selection() != self.state.selection()
	}
}

/// Transactional document engine consumed by the runtime.
///
/// Reads capture the committed state; writes run inside [`update`](Self::update)
/// and are never interleaved. Listeners fire synchronously, in subscription
/// order, after the transaction commits.
pub trait Document: Send + Sync {
	/// Captures the committed state.
	fn read(&self) -> Arc<EditorState>;

	/// Runs `edit` against a draft of the committed state and commits it.
	///
	/// An error from `edit` discards the draft. A draft identical to the
	/// committed state commits nothing and notifies nobody.
	fn update(&self, tag: Option<UpdateTag>, edit: &mut dyn FnMut(&mut EditorState) -> Result<()>) -> Result<Arc<EditorState>>;

	/// Subscribes to committed transactions.
	fn on_update(&self, listener: Arc<UpdateListener>) -> Subscription;
}

/// Closure-friendly helpers over [`Document`].
pub trait DocumentExt: Document {
	/// Runs a one-shot edit as an untagged transaction.
	fn edit<F>(&self, f: F) -> Result<Arc<EditorState>>
	where
		F: FnOnce(&mut EditorState) -> Result<()>,
	{
		self.edit_tagged(None, f)
	}

	/// Runs a one-shot edit as a transaction carrying `tag`.
	fn edit_tagged<F>(&self, tag: Option<UpdateTag>, f: F) -> Result<Arc<EditorState>>
	where
		F: FnOnce(&mut EditorState) -> Result<()>,
	{
		let mut f = Some(f);
		self.update(tag, &mut |state: &mut EditorState| match f.take() {
			Some(f) => f(state),
			None => Ok(()),
		})
	}

	/// Subscribes a closure to committed transactions.
	fn subscribe<F>(&self, f: F) -> Subscription
	where
		F: Fn(&UpdateEvent) + Send + Sync + 'static,
	{
		self.on_update(Arc::new(f))
	}
}

impl<D: Document + ?Sized> DocumentExt for D {}
