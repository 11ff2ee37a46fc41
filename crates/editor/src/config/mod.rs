//! Session configuration loaded from TOML.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. [`SessionConfig::validate`] runs on every load.

use std::collections::BTreeMap;
use std::path::Path;

use quill_registry::{DuplicatePolicy, ExtensionConfig};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::trigger::ScanOptions;


/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	pub composition: CompositionConfig,
	pub slash: SlashConfig,
	pub emoji: EmojiConfig,
	pub context_menu: ContextMenuConfig,
	/// Replace-on-configure config per extension id.
	pub extensions: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionConfig {
	pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlashConfig {
	pub trigger: String,
	pub max_query_len: usize,
	pub max_entries: usize,
}

impl Default for SlashConfig {
	fn default() -> Self {
		Self {
			trigger: "/".into(),
			max_query_len: 32,
			max_entries: 10,
		}
	}
}

impl SlashConfig {
	/// Scanner options; call after [`SessionConfig::validate`].
	pub fn scan_options(&self) -> ScanOptions {
		ScanOptions {
			trigger: single_char(&self.trigger).unwrap_or('/'),
			max_query_len: self.max_query_len,
			max_entries: self.max_entries,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmojiConfig {
	pub trigger: String,
	pub max_query_len: usize,
	pub max_entries: usize,
	pub auto_replace: bool,
	/// Symbol sequence to glyph, e.g. `":)" = "🙂"`.
	pub symbols: BTreeMap<String, String>,
}

impl Default for EmojiConfig {
	fn default() -> Self {
		let symbols = [
			(":)", "🙂"),
			(":-)", "🙂"),
			(":(", "🙁"),
			(":D", "😄"),
			(";)", "😉"),
			(":P", "😛"),
			(":O", "😮"),
			("<3", "❤️"),
			("</3", "💔"),
		];
		Self {
			trigger: ":".into(),
			max_query_len: 24,
			max_entries: 8,
			auto_replace: true,
			symbols: symbols.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
		}
	}
}

impl EmojiConfig {
	/// Scanner options; call after [`SessionConfig::validate`].
	pub fn scan_options(&self) -> ScanOptions {
		ScanOptions {
			trigger: single_char(&self.trigger).unwrap_or(':'),
			max_query_len: self.max_query_len,
			max_entries: self.max_entries,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextMenuConfig {
	/// Estimated height of one rendered item, in pixels.
	pub item_height: f32,
	pub menu_width: f32,
}

impl Default for ContextMenuConfig {
	fn default() -> Self {
		Self {
			item_height: 28.0,
			menu_width: 220.0,
		}
	}
}

impl SessionConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), extensions = config.extensions.len(), "config.load");
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		check_trigger("slash.trigger", &self.slash.trigger)?;
		check_nonzero("slash.max_query_len", self.slash.max_query_len)?;
		check_nonzero("slash.max_entries", self.slash.max_entries)?;

		check_trigger("emoji.trigger", &self.emoji.trigger)?;
		check_nonzero("emoji.max_query_len", self.emoji.max_query_len)?;
		check_nonzero("emoji.max_entries", self.emoji.max_entries)?;
		for (symbol, glyph) in &self.emoji.symbols {
			if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
				return Err(ConfigError::invalid(
					"emoji.symbols",
					format!("symbol {symbol:?} must be non-empty and contain no whitespace"),
				));
			}
			if glyph.is_empty() {
				return Err(ConfigError::invalid("emoji.symbols", format!("symbol {symbol:?} maps to an empty glyph")));
			}
		}

		check_positive("context_menu.item_height", self.context_menu.item_height)?;
		check_positive("context_menu.menu_width", self.context_menu.menu_width)?;
		Ok(())
	}

	/// Config for one extension, if the file names it.
	pub fn extension_config(&self, id: &str) -> Option<ExtensionConfig> {
		self.extensions.get(id).cloned().map(ExtensionConfig::from)
	}
}

fn single_char(s: &str) -> Option<char> {
	let mut chars = s.chars();
	match (chars.next(), chars.next()) {
		(Some(c), None) => Some(c),
		_ => None,
	}
}

fn check_trigger(field: &'static str, trigger: &str) -> Result<(), ConfigError> {
	match single_char(trigger) {
		Some(c) if !c.is_whitespace() => Ok(()),
		_ => Err(ConfigError::invalid(
			field,
			format!("expected a single non-whitespace character, got {trigger:?}"),
		)),
	}
}

fn check_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
	if value == 0 {
		return Err(ConfigError::invalid(field, "must be greater than zero"));
	}
	Ok(())
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
	if !(value.is_finite() && value > 0.0) {
		return Err(ConfigError::invalid(field, format!("must be a positive number, got {value}")));
	}
	Ok(())
}
