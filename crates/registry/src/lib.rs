//! Extension descriptors and their composition.
//!
//! An [`Extension`] declares optional contributions (commands, state queries,
//! node types, UI fragments) plus a lifecycle hook. [`ExtensionSet`] folds an
//! ordered list of extensions into one namespace per contribution kind.
//!
//! # Modules
//!
//! - [`extension`] - the capability trait and its registration context
//! - [`compose`] - folding and mount ordering
//! - [`collision`] - duplicate-key policy and diagnostics
//! - [`menus`] - context-menu provider contract
//! - [`simple`] - closure-assembled extensions

pub mod collision;
pub mod command;
pub mod compose;
pub mod contrib;
pub mod error;
pub mod extension;
pub mod menus;
pub mod meta;
pub mod query;
pub mod settings;
pub mod simple;

pub use collision::{Collision, DuplicatePolicy, KeyKind, Resolution};
pub use command::{CommandArgs, CommandDef, CommandEntry, CommandHandler, CommandMap, CommandOutput, CommandResult};
pub use compose::ExtensionSet;
pub use contrib::{Fragment, FragmentEntry, FragmentSlot, NodeRole, NodeTypeDescriptor, NodeTypeEntry};
pub use error::{ExtensionError, RegistryError, Result};
pub use extension::{Extension, RegisterCx, Teardown};
pub use menus::{
	ContextMenuProvider, FnProvider, MenuAction, MenuAnchor, MenuItem, MenuRequest, PointerButton, PointerEvent,
	ProviderRegistrar,
};
pub use meta::{ExtensionId, ExtensionMeta};
pub use query::{QueryFuture, StateQueryDef, StateQueryEntry, StateQueryFn, StateQueryMap};
pub use settings::{ConfigSlot, ExtensionConfig};
pub use simple::SimpleExtension;
