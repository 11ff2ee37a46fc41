//! Per-extension configuration with replace-on-configure semantics.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Free-form configuration map owned by one extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionConfig(Map<String, Value>);

impl ExtensionConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a config from a JSON object; any other value yields an empty config.
	pub fn from_value(value: Value) -> Self {
		match value {
			Value::Object(map) => Self(map),
			_ => Self::default(),
		}
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key)?.as_str()
	}

	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.get(key)?.as_bool()
	}

	pub fn get_u64(&self, key: &str) -> Option<u64> {
		self.get(key)?.as_u64()
	}

	/// Deserializes the whole map into a typed settings struct.
	pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
		serde_json::from_value(Value::Object(self.0.clone()))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}
}

impl From<Map<String, Value>> for ExtensionConfig {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// Shared slot holding an extension's current config.
///
/// `configure` replaces the whole map; nothing is merged. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct ConfigSlot {
	current: Arc<RwLock<Arc<ExtensionConfig>>>,
}

impl ConfigSlot {
	pub fn new(initial: ExtensionConfig) -> Self {
		Self {
			current: Arc::new(RwLock::new(Arc::new(initial))),
		}
	}

	/// Current config capture.
	pub fn get(&self) -> Arc<ExtensionConfig> {
		Arc::clone(&self.current.read())
	}

	/// Replaces the config wholesale.
	pub fn replace(&self, config: ExtensionConfig) {
		*self.current.write() = Arc::new(config);
	}
}
