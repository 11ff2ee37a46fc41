//! Built-in extensions that wire the interaction components into a session.
//!
//! Each one is an ordinary [`Extension`](quill_registry::Extension): its
//! lifecycle hook attaches a component to the live document and returns the
//! detaching teardown.

mod emoji;
mod menu;
mod slash;

pub use emoji::{EMOJIS, Emoji, EmojiExtension, emoji_entries};
pub use menu::ContextMenuExtension;
pub use slash::SlashMenuExtension;

use anyhow::anyhow;
use quill_registry::{CommandDef, CommandResult, ExtensionConfig, ExtensionError, StateQueryDef};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::trigger::{Execution, ScanOptions, TriggerScanner};


/// Per-extension overrides of [`ScanOptions`], read from the extension config.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScanOverrides {
	trigger: Option<String>,
	max_query_len: Option<usize>,
	max_entries: Option<usize>,
}

fn scan_options(id: &str, base: ScanOptions, config: &ExtensionConfig) -> Result<ScanOptions, ExtensionError> {
	if config.is_empty() {
		return Ok(base);
	}
	let overrides: ScanOverrides = config
		.decode()
		.map_err(|err| ExtensionError::invalid_config(id, err))?;
	let mut options = base;
	if let Some(trigger) = overrides.trigger {
		let mut chars = trigger.chars();
		options.trigger = match (chars.next(), chars.next()) {
			(Some(c), None) if !c.is_whitespace() => c,
			_ => return Err(ExtensionError::invalid_config(id, format!("trigger {trigger:?} must be one character"))),
		};
	}
	if let Some(len) = overrides.max_query_len {
		options.max_query_len = len;
	}
	if let Some(max) = overrides.max_entries {
		options.max_entries = max;
	}
	if options.max_query_len == 0 || options.max_entries == 0 {
		return Err(ExtensionError::invalid_config(id, "limits must be greater than zero"));
	}
	Ok(options)
}

/// `<prefix>.dismiss`, `<prefix>.select_next`, `<prefix>.select_prev`, `<prefix>.execute`.
fn scanner_commands(prefix: &str, scanner: &TriggerScanner) -> Vec<CommandDef> {
	let dismiss = scanner.clone();
	let next = scanner.clone();
	let prev = scanner.clone();
	let exec = scanner.clone();
	vec![
		CommandDef::new(format!("{prefix}.dismiss"), move |_| Ok(Value::Bool(dismiss.dismiss()))),
		CommandDef::new(format!("{prefix}.select_next"), move |_| {
			next.select_next();
			Ok(json!(next.selected()))
		}),
		CommandDef::new(format!("{prefix}.select_prev"), move |_| {
			prev.select_prev();
			Ok(json!(prev.selected()))
		}),
		CommandDef::new_async(format!("{prefix}.execute"), move |args: Value| execute_entry(exec.clone(), args)),
	]
}

/// Executes `args.id`, or the selected entry when no id is given.
async fn execute_entry(scanner: TriggerScanner, args: Value) -> CommandResult {
	let execution = match args.get("id").and_then(Value::as_str) {
		Some(id) => scanner.execute(id)?,
		None => scanner
			.execute_selected()?
			.ok_or_else(|| anyhow!("no entry is selected"))?,
	};
	match execution {
		Execution::Inserted(text) => Ok(json!({ "inserted": text })),
		Execution::Command(pending) => Ok(pending.await?),
	}
}

/// `<prefix>.open`.
fn scanner_queries(prefix: &str, scanner: &TriggerScanner) -> Vec<StateQueryDef> {
	let scanner = scanner.clone();
	vec![StateQueryDef::new(format!("{prefix}.open"), move || scanner.is_open())]
}
