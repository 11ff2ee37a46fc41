use quill_registry::{
	CommandDef, ConfigSlot, Extension, ExtensionError, ExtensionMeta, Fragment, FragmentSlot, RegisterCx, StateQueryDef,
	Teardown,
};
use quill_primitives::ChangeNotifier;

use super::{scan_options, scanner_commands, scanner_queries};
use crate::config::SlashConfig;
use crate::trigger::{ScanOptions, TriggerEntry, TriggerScanner};

/// Slash-command menu: `/` at a word boundary opens a filtered command list.
pub struct SlashMenuExtension {
	meta: ExtensionMeta,
	config: ConfigSlot,
	base: ScanOptions,
	scanner: TriggerScanner,
}

impl SlashMenuExtension {
	pub const ID: &'static str = "slash-menu";

	pub fn new(options: ScanOptions, entries: Vec<TriggerEntry>) -> Self {
		Self {
			meta: ExtensionMeta::new(Self::ID).with_category("menu").with_category("input-rule"),
			config: ConfigSlot::default(),
			base: options,
			scanner: TriggerScanner::new("slash", options, entries),
		}
	}

	pub fn from_config(config: &SlashConfig, entries: Vec<TriggerEntry>) -> Self {
		Self::new(config.scan_options(), entries)
	}

	pub fn scanner(&self) -> &TriggerScanner {
		&self.scanner
	}
}

impl Extension for SlashMenuExtension {
	fn meta(&self) -> &ExtensionMeta {
		&self.meta
	}

	fn config_slot(&self) -> Option<&ConfigSlot> {
		Some(&self.config)
	}

	fn commands(&self) -> Vec<CommandDef> {
		scanner_commands("slash", &self.scanner)
	}

	fn state_queries(&self) -> Vec<StateQueryDef> {
		scanner_queries("slash", &self.scanner)
	}

	fn fragments(&self) -> Vec<Fragment> {
		vec![Fragment::new(Self::ID, FragmentSlot::Floating)]
	}

	fn change_notifier(&self) -> Option<ChangeNotifier> {
		Some(self.scanner.notifier())
	}

	fn register(&self, cx: &RegisterCx<'_>) -> Result<Teardown, ExtensionError> {
		self.scanner.set_options(scan_options(self.id(), self.base, cx.config())?);
		Ok(self.scanner.attach(cx.document(), cx.viewport(), cx.commands()))
	}
}
