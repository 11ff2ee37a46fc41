#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Runtime for composed rich-text editing sessions.
//!
//! A [`Session`] mounts a list of extensions against an external document and
//! viewport, keeps a version-fenced snapshot of their state queries, and owns
//! the interaction components built-in extensions attach to.
//!
//! # Main Types
//!
//! - [`Session`] - mount, remount and teardown of an extension set
//! - [`StateScheduler`] - re-evaluates state queries, discarding stale rounds
//! - [`TriggerScanner`] - `/` and `:` style inline menus
//! - [`SymbolReplacer`] - `:)` to glyph replacement
//! - [`ContextMenuResolver`] - provider-driven context menus
//!
//! ```text
//! Session
//! ├── ExtensionSet          // merged commands, queries, fragments
//! ├── RegistrationRecord[]  // one teardown per extension
//! ├── StateScheduler        // watch::Sender<StateSnapshot>
//! ├── ContextMenuResolver   // providers + open menu
//! └── UiContext             // handed to presentation code
//! ```

pub mod config;
pub mod context_menu;
pub mod error;
pub mod extensions;
pub mod reactive;
pub mod session;
pub mod trigger;

pub use config::{CompositionConfig, ContextMenuConfig, EmojiConfig, SessionConfig, SlashConfig};
pub use context_menu::{
	Activation, CloseReason, ContextMenuResolver, MenuConfig, MenuEvent, MenuListener, OpenMenu,
};
pub use error::{ConfigError, Result, SessionError};
pub use extensions::{ContextMenuExtension, EmojiExtension, SlashMenuExtension};
pub use reactive::{RoundOutcome, StateScheduler, StateSnapshot, StateValues};
pub use session::{RegistrationRecord, Session, UiContext};
pub use trigger::{
	EntryAction, EntryCatalog, Execution, MatchSpan, ScanOptions, ScannerView, SymbolMatch, SymbolReplacer,
	TriggerEntry, TriggerScanner,
};
