use quill_primitives::{ChangeNotifier, Subscription};
use quill_registry::{
	CommandDef, ConfigSlot, Extension, ExtensionError, ExtensionMeta, Fragment, FragmentSlot, RegisterCx, StateQueryDef,
	Teardown,
};

use super::{scan_options, scanner_commands, scanner_queries};
use crate::config::EmojiConfig;
use crate::trigger::{ScanOptions, SymbolReplacer, TriggerEntry, TriggerScanner};

/// A glyph with its searchable names; the first name is its shortcode.
#[derive(Debug, Clone, Copy)]
pub struct Emoji {
	pub glyph: &'static str,
	pub names: &'static [&'static str],
}

impl Emoji {
	pub fn shortcode(&self) -> &'static str {
		self.names.first().copied().unwrap_or("emoji")
	}

	fn entry(&self) -> TriggerEntry {
		let shortcode = self.shortcode();
		TriggerEntry::insert(shortcode, format!("{} {shortcode}", self.glyph), self.glyph)
			.with_shortcuts(self.names.iter().copied())
	}
}

/// Common emoji, most frequently picked first.
pub static EMOJIS: &[Emoji] = &[
	Emoji { glyph: "\u{1f600}", names: &["grinning", "smile", "happy"] },
	Emoji { glyph: "\u{1f604}", names: &["smile", "happy", "joy"] },
	Emoji { glyph: "\u{1f602}", names: &["joy", "laugh", "tears"] },
	Emoji { glyph: "\u{1f642}", names: &["slight_smile", "smile"] },
	Emoji { glyph: "\u{1f609}", names: &["wink"] },
	Emoji { glyph: "\u{1f60d}", names: &["heart_eyes", "love"] },
	Emoji { glyph: "\u{1f60e}", names: &["sunglasses", "cool"] },
	Emoji { glyph: "\u{1f914}", names: &["thinking", "hmm"] },
	Emoji { glyph: "\u{1f641}", names: &["slight_frown", "sad"] },
	Emoji { glyph: "\u{1f62d}", names: &["sob", "cry"] },
	Emoji { glyph: "\u{1f62e}", names: &["open_mouth", "surprised"] },
	Emoji { glyph: "\u{1f61b}", names: &["tongue", "playful"] },
	Emoji { glyph: "\u{1f44d}", names: &["thumbsup", "yes", "approve"] },
	Emoji { glyph: "\u{1f44e}", names: &["thumbsdown", "no"] },
	Emoji { glyph: "\u{1f44f}", names: &["clap", "applause"] },
	Emoji { glyph: "\u{1f64f}", names: &["pray", "thanks", "please"] },
	Emoji { glyph: "\u{1f440}", names: &["eyes", "look"] },
	Emoji { glyph: "\u{2764}\u{fe0f}", names: &["heart", "love"] },
	Emoji { glyph: "\u{1f494}", names: &["broken_heart"] },
	Emoji { glyph: "\u{1f525}", names: &["fire", "hot", "lit"] },
	Emoji { glyph: "\u{2728}", names: &["sparkles", "shiny"] },
	Emoji { glyph: "\u{1f389}", names: &["tada", "party", "celebrate"] },
	Emoji { glyph: "\u{1f680}", names: &["rocket", "launch", "ship"] },
	Emoji { glyph: "\u{2705}", names: &["check", "done"] },
	Emoji { glyph: "\u{274c}", names: &["x", "cross", "wrong"] },
	Emoji { glyph: "\u{26a0}\u{fe0f}", names: &["warning", "caution"] },
	Emoji { glyph: "\u{1f41b}", names: &["bug"] },
	Emoji { glyph: "\u{1f4a1}", names: &["bulb", "idea"] },
	Emoji { glyph: "\u{1f4dd}", names: &["memo", "note"] },
	Emoji { glyph: "\u{2615}", names: &["coffee"] },
];

/// Scanner entries for every emoji in [`EMOJIS`].
pub fn emoji_entries() -> Vec<TriggerEntry> {
	EMOJIS.iter().map(Emoji::entry).collect()
}

/// `:` shortcode picker plus optional symbol-to-glyph replacement.
pub struct EmojiExtension {
	meta: ExtensionMeta,
	config: ConfigSlot,
	base: ScanOptions,
	scanner: TriggerScanner,
	replacer: Option<SymbolReplacer>,
}

impl EmojiExtension {
	pub const ID: &'static str = "emoji";

	pub fn new(options: ScanOptions, entries: Vec<TriggerEntry>) -> Self {
		Self {
			meta: ExtensionMeta::new(Self::ID).with_category("menu").with_category("input-rule"),
			config: ConfigSlot::default(),
			base: options,
			scanner: TriggerScanner::new("emoji", options, entries),
			replacer: None,
		}
	}

	/// Picker over [`emoji_entries`], replacing symbols when `auto_replace` is set.
	pub fn from_config(config: &EmojiConfig) -> Self {
		let ext = Self::new(config.scan_options(), emoji_entries());
		if config.auto_replace && !config.symbols.is_empty() {
			ext.with_replacer(SymbolReplacer::new(config.symbols.clone()))
		} else {
			ext
		}
	}

	pub fn with_replacer(mut self, replacer: SymbolReplacer) -> Self {
		self.replacer = Some(replacer);
		self
	}

	pub fn scanner(&self) -> &TriggerScanner {
		&self.scanner
	}

	pub fn replacer(&self) -> Option<&SymbolReplacer> {
		self.replacer.as_ref()
	}
}

impl Extension for EmojiExtension {
	fn meta(&self) -> &ExtensionMeta {
		&self.meta
	}

	fn config_slot(&self) -> Option<&ConfigSlot> {
		Some(&self.config)
	}

	fn commands(&self) -> Vec<CommandDef> {
		scanner_commands("emoji", &self.scanner)
	}

	fn state_queries(&self) -> Vec<StateQueryDef> {
		scanner_queries("emoji", &self.scanner)
	}

	fn fragments(&self) -> Vec<Fragment> {
		vec![Fragment::new("emoji-picker", FragmentSlot::Floating)]
	}

	fn change_notifier(&self) -> Option<ChangeNotifier> {
		Some(self.scanner.notifier())
	}

	fn register(&self, cx: &RegisterCx<'_>) -> Result<Teardown, ExtensionError> {
		self.scanner.set_options(scan_options(self.id(), self.base, cx.config())?);
		let mut subs = vec![self.scanner.attach(cx.document(), cx.viewport(), cx.commands())];
		if let Some(replacer) = &self.replacer {
			subs.push(replacer.attach(cx.document()));
		}
		Ok(Subscription::all(subs))
	}
}
