use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quill_editor::{EmojiConfig, EmojiExtension, ScanOptions, SlashMenuExtension, SymbolReplacer, TriggerEntry};
use quill_primitives::{Document, DocumentExt, MemoryDocument};
use quill_registry::{Extension, ExtensionConfig};
use serde_json::{Value, json};

use crate::common::{Fixture, fixture};

fn blocks() -> Vec<TriggerEntry> {
	vec![
		TriggerEntry::insert("h1", "Heading 1", "# ").with_keywords(["title"]),
		TriggerEntry::insert("h2", "Heading 2", "## "),
		TriggerEntry::insert("quote", "Quote", "> "),
		TriggerEntry::produce("upper", "Shout", |query: &str| query.to_uppercase()),
	]
}

fn type_chars(document: &MemoryDocument, text: &str) {
	for ch in text.chars() {
		let ch = ch.to_string();
		document.edit(|state| state.type_text(&ch)).unwrap();
	}
}

fn text(fx: &Fixture) -> String {
	fx.document.read().text_content()
}

#[tokio::test]
async fn slash_menu_opens_and_executes_through_commands() {
	let fx = fixture("intro ");
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let scanner = slash.scanner().clone();
	let ext: Arc<dyn Extension> = Arc::new(slash);
	fx.session.mount(vec![ext]).unwrap();
	assert!(!scanner.is_open());

	type_chars(&fx.document, "/he");
	assert_eq!(scanner.active_query().as_deref(), Some("he"));
	let ids: Vec<String> = scanner.entries().iter().map(|e| e.id.to_string()).collect();
	assert_eq!(ids, ["h1", "h2"]);

	fx.session.scheduler().trigger().await.unwrap();
	assert_eq!(fx.session.snapshot().get("slash.open"), Some(&true));

	assert_eq!(fx.session.execute("slash.select_next", Value::Null).await.unwrap(), json!(1));
	let out = fx.session.execute("slash.execute", Value::Null).await.unwrap();
	assert_eq!(out, json!({ "inserted": "## " }));
	assert_eq!(text(&fx), "intro ## ");
	assert!(!scanner.is_open());

	fx.session.scheduler().trigger().await.unwrap();
	assert_eq!(fx.session.snapshot().get("slash.open"), Some(&false));
}

#[tokio::test]
async fn produced_entries_see_the_query() {
	let fx = fixture("");
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let ext: Arc<dyn Extension> = Arc::new(slash);
	fx.session.mount(vec![ext]).unwrap();

	type_chars(&fx.document, "/hey");
	let out = fx.session.execute("slash.execute", json!({ "id": "upper" })).await.unwrap();
	assert_eq!(out, json!({ "inserted": "HEY" }));
	assert_eq!(text(&fx), "HEY");
}

#[tokio::test]
async fn dismiss_sticks_until_a_new_trigger() {
	let fx = fixture("");
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let scanner = slash.scanner().clone();
	let ext: Arc<dyn Extension> = Arc::new(slash);
	fx.session.mount(vec![ext]).unwrap();

	type_chars(&fx.document, "/q");
	assert_eq!(fx.session.execute("slash.dismiss", Value::Null).await.unwrap(), json!(true));
	assert_eq!(fx.session.execute("slash.dismiss", Value::Null).await.unwrap(), json!(false));

	type_chars(&fx.document, "u");
	assert!(!scanner.is_open());

	type_chars(&fx.document, " /");
	assert!(scanner.is_open());
	assert_eq!(scanner.active_query().as_deref(), Some(""));
}

#[tokio::test]
async fn config_overrides_the_trigger_character() {
	let fx = fixture("");
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let scanner = slash.scanner().clone();
	let ext: Arc<dyn Extension> = Arc::new(slash);
	fx.session.mount(vec![ext]).unwrap();
	fx.session
		.configure_extension("slash-menu", ExtensionConfig::new().with("trigger", "!"))
		.unwrap();

	type_chars(&fx.document, "/h");
	assert!(!scanner.is_open());
	type_chars(&fx.document, " !h");
	assert_eq!(scanner.active_query().as_deref(), Some("h"));
}

#[tokio::test]
async fn unmount_detaches_scanners() {
	let fx = fixture("");
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let scanner = slash.scanner().clone();
	let ext: Arc<dyn Extension> = Arc::new(slash);
	fx.session.mount(vec![ext]).unwrap();
	type_chars(&fx.document, "/");
	assert!(scanner.is_open());

	fx.session.unmount();
	assert!(!scanner.is_attached());
	assert!(!scanner.is_open());
	assert_eq!(fx.document.listener_count(), 0);
}

#[tokio::test]
async fn emoji_picker_and_symbol_replacement_share_one_extension() {
	let fx = fixture("");
	let emoji = EmojiExtension::from_config(&EmojiConfig::default());
	let scanner = emoji.scanner().clone();
	let ext: Arc<dyn Extension> = Arc::new(emoji);
	fx.session.mount(vec![ext]).unwrap();

	type_chars(&fx.document, "hi :) ");
	assert_eq!(text(&fx), "hi \u{1f642} ");

	type_chars(&fx.document, ":tad");
	assert_eq!(scanner.active_query().as_deref(), Some("tad"));
	let out = fx.session.execute("emoji.execute", Value::Null).await.unwrap();
	assert_eq!(out, json!({ "inserted": "\u{1f389}" }));
	assert_eq!(text(&fx), "hi \u{1f642} \u{1f389}");
}

#[tokio::test]
async fn later_scanners_see_symbol_replacement_before_executing() {
	let fx = fixture("");
	let emoji = EmojiExtension::new(ScanOptions::emoji(), Vec::new())
		.with_replacer(SymbolReplacer::new([(":)", "\u{1f642}")]));
	let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
	let scanner = slash.scanner().clone();
	let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(emoji), Arc::new(slash)];
	fx.session.mount(extensions).unwrap();

	type_chars(&fx.document, "/:),");
	assert_eq!(text(&fx), "/\u{1f642},");
	let span = scanner.span().unwrap();
	assert_eq!((span.start, span.end), (0, 3));
	assert_eq!(span.query, "\u{1f642},");

	let out = fx.session.execute("slash.execute", json!({ "id": "h1" })).await.unwrap();
	assert_eq!(out, json!({ "inserted": "# " }));
	assert_eq!(text(&fx), "# ");
}

#[tokio::test]
async fn symbols_inside_words_are_left_alone() {
	let fx = fixture("");
	let ext: Arc<dyn Extension> = Arc::new(EmojiExtension::from_config(&EmojiConfig::default()));
	fx.session.mount(vec![ext]).unwrap();

	type_chars(&fx.document, "a:)b and x<3 ");
	assert_eq!(text(&fx), "a:)b and x<3 ");
}

fn trigger_case() -> impl Strategy<Value = (String, String, usize)> {
	(
		prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(|words| words.join(" ")),
		"[a-z]{0,6}",
		0usize..4,
	)
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(48))]

	#[test]
	fn executing_an_entry_changes_length_by_replacement_minus_span((prefix, query, pick) in trigger_case()) {
		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		runtime.block_on(async {
			let fx = fixture("");
			let slash = SlashMenuExtension::new(ScanOptions::slash(), blocks());
			let scanner = slash.scanner().clone();
			let ext: Arc<dyn Extension> = Arc::new(slash);
			fx.session.mount(vec![ext]).unwrap();

			let lead = if prefix.is_empty() { String::new() } else { format!("{prefix} ") };
			type_chars(&fx.document, &format!("{lead}/{query}"));
			let span = scanner.span().expect("trigger after whitespace opens");
			assert_eq!(span.query, query);

			let before = text(&fx).chars().count();
			let id = blocks()[pick].id.to_string();
			let inserted = match scanner.execute(&id).unwrap() {
				quill_editor::Execution::Inserted(inserted) => inserted,
				quill_editor::Execution::Command(_) => unreachable!("block entries only insert"),
			};
			let after = text(&fx);
			assert_eq!(
				after.chars().count() + (span.end - span.start),
				before + inserted.chars().count()
			);
			assert_eq!(after, format!("{lead}{inserted}"));
		});
	}
}
