use std::collections::BTreeSet;
use std::sync::Arc;

/// Stable, unique extension identifier.
pub type ExtensionId = Arc<str>;

/// Identity and scheduling metadata of an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMeta {
	/// Unique within a composed set.
	pub id: ExtensionId,
	/// Free-form tags ("formatting", "menu", "input-rule").
	pub categories: BTreeSet<Box<str>>,
	/// Mount order key: higher registers first and tears down last.
	pub init_priority: i32,
}

impl ExtensionMeta {
	pub fn new(id: impl Into<ExtensionId>) -> Self {
		Self {
			id: id.into(),
			categories: BTreeSet::new(),
			init_priority: 0,
		}
	}

	pub fn with_category(mut self, category: impl Into<Box<str>>) -> Self {
		self.categories.insert(category.into());
		self
	}

	pub fn with_init_priority(mut self, priority: i32) -> Self {
		self.init_priority = priority;
		self
	}

	pub fn has_category(&self, category: &str) -> bool {
		self.categories.contains(category)
	}
}
