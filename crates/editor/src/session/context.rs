use quill_primitives::BoxFutureStatic;
use quill_registry::{CommandArgs, CommandMap, CommandOutput, FragmentEntry};
use tokio::sync::watch;

use crate::context_menu::ContextMenuResolver;
use crate::reactive::StateSnapshot;

/// Everything presentation code needs from a mounted session.
///
/// Handed to the UI layer explicitly at render time. A new context is built on
/// every mount; the session drops its copy on teardown.
#[derive(Clone)]
pub struct UiContext {
	commands: CommandMap,
	state: watch::Receiver<StateSnapshot>,
	menus: ContextMenuResolver,
	fragments: Vec<FragmentEntry>,
}

impl UiContext {
	pub(crate) fn new(
		commands: CommandMap,
		state: watch::Receiver<StateSnapshot>,
		menus: ContextMenuResolver,
		fragments: Vec<FragmentEntry>,
	) -> Self {
		Self {
			commands,
			state,
			menus,
			fragments,
		}
	}

	pub fn commands(&self) -> &CommandMap {
		&self.commands
	}

	pub fn execute(&self, name: &str, args: CommandArgs) -> BoxFutureStatic<quill_registry::Result<CommandOutput>> {
		self.commands.execute(name, args)
	}

	/// Latest published state snapshot.
	pub fn snapshot(&self) -> StateSnapshot {
		self.state.borrow().clone()
	}

	/// Value of one state query; unknown names read as false.
	pub fn is_active(&self, query: &str) -> bool {
		self.state.borrow().get(query).copied().unwrap_or(false)
	}

	/// Receiver for awaiting snapshot changes.
	pub fn state(&self) -> watch::Receiver<StateSnapshot> {
		self.state.clone()
	}

	pub fn menus(&self) -> &ContextMenuResolver {
		&self.menus
	}

	/// UI fragments to mount, in extension order.
	pub fn fragments(&self) -> &[FragmentEntry] {
		&self.fragments
	}
}

impl std::fmt::Debug for UiContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UiContext")
			.field("commands", &self.commands.len())
			.field("fragments", &self.fragments.len())
			.finish_non_exhaustive()
	}
}
