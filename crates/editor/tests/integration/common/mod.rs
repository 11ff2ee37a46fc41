//! Shared fixtures for session integration tests.

use std::sync::Arc;

use parking_lot::Mutex;
use quill_editor::{Session, SessionConfig};
use quill_primitives::{Document, EditorState, GridViewport, MemoryDocument, Subscription, Viewport};
use quill_registry::{Extension, ExtensionError, SimpleExtension};
use tokio::runtime::Handle;

/// Ordered record of lifecycle events across extensions.
pub type Log = Arc<Mutex<Vec<String>>>;

pub struct Fixture {
	pub document: Arc<MemoryDocument>,
	pub viewport: Arc<GridViewport>,
	pub session: Session,
}

/// A session over one paragraph with the caret at its end.
///
/// Must run inside a tokio runtime.
pub fn fixture(text: &str) -> Fixture {
	fixture_with(text, SessionConfig::default())
}

pub fn fixture_with(text: &str, config: SessionConfig) -> Fixture {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let mut state = EditorState::new();
	let key = state.push_text(text);
	state.set_caret(key, text.chars().count()).expect("caret inside fresh node");
	let document = Arc::new(MemoryDocument::new(state));
	let viewport = Arc::new(GridViewport::default());
	let dyn_doc: Arc<dyn Document> = document.clone();
	let dyn_view: Arc<dyn Viewport> = viewport.clone();
	let session = Session::new(dyn_doc, dyn_view, Handle::current(), config);
	Fixture {
		document,
		viewport,
		session,
	}
}

pub fn log() -> Log {
	Arc::default()
}

pub fn entries(log: &Log) -> Vec<String> {
	log.lock().clone()
}

/// An extension that logs `register:<id>` and `teardown:<id>`.
pub fn recorder(id: &str, priority: i32, log: &Log) -> Arc<dyn Extension> {
	recorder_builder(id, priority, log).build()
}

pub fn recorder_builder(id: &str, priority: i32, log: &Log) -> SimpleExtension {
	let (name, log) = (id.to_owned(), Arc::clone(log));
	SimpleExtension::new(id).init_priority(priority).on_register(move |_| {
		log.lock().push(format!("register:{name}"));
		let (name, log) = (name.clone(), Arc::clone(&log));
		Ok(Subscription::new(move || log.lock().push(format!("teardown:{name}"))))
	})
}

/// An extension whose hook always fails.
pub fn failing(id: &str, priority: i32) -> Arc<dyn Extension> {
	let name = id.to_owned();
	SimpleExtension::new(id)
		.init_priority(priority)
		.on_register(move |_| Err(ExtensionError::registration(name.clone(), "backend offline")))
		.build()
}
