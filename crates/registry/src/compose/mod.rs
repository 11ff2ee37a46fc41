//! Folds an ordered extension list into one session-wide namespace.
//!
//! # Ordering contract
//!
//! - Contributions are folded in array order. On a key collision the
//!   [`DuplicatePolicy`] decides; under the default `LastWins` the later
//!   extension's contribution replaces the earlier one.
//! - Mounting uses [`ExtensionSet::registration_order`]: a stable sort by
//!   descending `init_priority`. The re-sort never affects folding.
//! - Composing the same list twice yields the same maps, collisions and
//!   registration order.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use quill_primitives::ChangeNotifier;

use crate::collision::{Collision, DuplicatePolicy, KeyKind, Resolution};
use crate::command::{CommandEntry, CommandMap};
use crate::contrib::{FragmentEntry, NodeTypeEntry};
use crate::error::{RegistryError, Result};
use crate::extension::Extension;
use crate::meta::ExtensionId;
use crate::query::{StateQueryEntry, StateQueryMap};


/// An extension set together with its merged contributions.
#[derive(Clone)]
pub struct ExtensionSet {
	extensions: Vec<Arc<dyn Extension>>,
	commands: CommandMap,
	state_queries: StateQueryMap,
	node_types: IndexMap<Box<str>, NodeTypeEntry>,
	fragments: Vec<FragmentEntry>,
	collisions: Vec<Collision>,
	policy: DuplicatePolicy,
}

impl ExtensionSet {
	/// Composes with the default (`LastWins`) policy.
	pub fn compose(extensions: Vec<Arc<dyn Extension>>) -> Result<Self> {
		Self::compose_with(extensions, DuplicatePolicy::default())
	}

	pub fn compose_with(extensions: Vec<Arc<dyn Extension>>, policy: DuplicatePolicy) -> Result<Self> {
		{
			let mut seen = HashSet::with_capacity(extensions.len());
			for ext in &extensions {
				if !seen.insert(ext.id()) {
					return Err(RegistryError::DuplicateExtension(ext.id().to_owned()));
				}
			}
		}

		let mut collisions = Vec::new();
		let mut commands = IndexMap::new();
		let mut state_queries = IndexMap::new();
		let mut node_types = IndexMap::new();
		let mut fragments = Vec::new();

		for ext in &extensions {
			let owner: ExtensionId = Arc::clone(&ext.meta().id);
			for def in ext.commands() {
				let key = def.name.clone();
				let entry = CommandEntry {
					owner: Arc::clone(&owner),
					def,
				};
				insert_keyed(&mut commands, KeyKind::Command, key, entry, policy, &mut collisions)?;
			}
			for def in ext.state_queries() {
				let key = def.name.clone();
				let entry = StateQueryEntry {
					owner: Arc::clone(&owner),
					def,
				};
				insert_keyed(&mut state_queries, KeyKind::StateQuery, key, entry, policy, &mut collisions)?;
			}
			for descriptor in ext.node_types() {
				let key = descriptor.name.clone();
				let entry = NodeTypeEntry {
					owner: Arc::clone(&owner),
					descriptor,
				};
				insert_keyed(&mut node_types, KeyKind::NodeType, key, entry, policy, &mut collisions)?;
			}
			fragments.extend(ext.fragments().into_iter().map(|fragment| FragmentEntry {
				owner: Arc::clone(&owner),
				fragment,
			}));
		}

		tracing::debug!(
			extensions = extensions.len(),
			commands = commands.len(),
			state_queries = state_queries.len(),
			collisions = collisions.len(),
			"extensions.compose"
		);

		Ok(Self {
			extensions,
			commands: CommandMap::from_entries(commands),
			state_queries: StateQueryMap::from_entries(state_queries),
			node_types,
			fragments,
			collisions,
			policy,
		})
	}

	/// Extensions in array (fold) order.
	pub fn extensions(&self) -> &[Arc<dyn Extension>] {
		&self.extensions
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.extensions.iter().map(|ext| ext.id())
	}

	pub fn get(&self, id: &str) -> Option<&Arc<dyn Extension>> {
		self.extensions.iter().find(|ext| ext.id() == id)
	}

	pub fn len(&self) -> usize {
		self.extensions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.extensions.is_empty()
	}

	/// Mount order: higher `init_priority` first, ties keep array order.
	pub fn registration_order(&self) -> Vec<Arc<dyn Extension>> {
		let mut order = self.extensions.clone();
		order.sort_by_key(|ext| std::cmp::Reverse(ext.meta().init_priority));
		order
	}

	pub fn commands(&self) -> &CommandMap {
		&self.commands
	}

	pub fn state_queries(&self) -> &StateQueryMap {
		&self.state_queries
	}

	pub fn node_types(&self) -> impl Iterator<Item = &NodeTypeEntry> {
		self.node_types.values()
	}

	pub fn node_type(&self, name: &str) -> Option<&NodeTypeEntry> {
		self.node_types.get(name)
	}

	/// UI fragments in array order.
	pub fn fragments(&self) -> &[FragmentEntry] {
		&self.fragments
	}

	/// Collisions observed while folding, in the order they happened.
	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}

	/// Change notifiers declared by extensions, in array order.
	pub fn change_notifiers(&self) -> Vec<(ExtensionId, ChangeNotifier)> {
		self.extensions
			.iter()
			.filter_map(|ext| Some((Arc::clone(&ext.meta().id), ext.change_notifier()?)))
			.collect()
	}
}

impl std::fmt::Debug for ExtensionSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExtensionSet")
			.field("extensions", &self.ids().collect::<Vec<_>>())
			.field("commands", &self.commands.len())
			.field("state_queries", &self.state_queries.len())
			.field("collisions", &self.collisions.len())
			.field("policy", &self.policy)
			.finish()
	}
}

trait Owned {
	fn owner(&self) -> &str;
}

impl Owned for CommandEntry {
	fn owner(&self) -> &str {
		&self.owner
	}
}

impl Owned for StateQueryEntry {
	fn owner(&self) -> &str {
		&self.owner
	}
}

impl Owned for NodeTypeEntry {
	fn owner(&self) -> &str {
		&self.owner
	}
}

fn insert_keyed<E: Owned>(
	map: &mut IndexMap<Box<str>, E>,
	kind: KeyKind,
	key: Box<str>,
	entry: E,
	policy: DuplicatePolicy,
	collisions: &mut Vec<Collision>,
) -> Result<()> {
	let Some(existing) = map.get(&*key) else {
		map.insert(key, entry);
		return Ok(());
	};
	let existing: Box<str> = existing.owner().into();
	let incoming: Box<str> = entry.owner().into();

	let resolution = match policy {
		DuplicatePolicy::Reject => {
			return Err(RegistryError::KeyCollision {
				kind,
				key: key.into(),
				existing: existing.into(),
				incoming: incoming.into(),
			});
		}
		DuplicatePolicy::FirstWins => Resolution::KeptExisting,
		DuplicatePolicy::LastWins => {
			map.insert(key.clone(), entry);
			Resolution::ReplacedExisting
		}
	};

	tracing::warn!(
		%kind,
		key = %key,
		existing = %existing,
		incoming = %incoming,
		resolution = ?resolution,
		"extension contribution collision"
	);
	collisions.push(Collision {
		kind,
		key,
		existing,
		incoming,
		resolution,
	});
	Ok(())
}
