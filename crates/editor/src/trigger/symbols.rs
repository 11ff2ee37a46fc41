use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use quill_primitives::{CharIdx, Document, DocumentExt, EditError, EditorState, Subscription, UpdateTag};

/// Tag carried by the transaction that swaps a symbol for its glyph.
pub const SYMBOL_REPLACE_TAG: UpdateTag = "symbol-replace";

/// A symbol found right before the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
	pub start: CharIdx,
	pub end: CharIdx,
	pub glyph: String,
}

/// Replaces typed symbol sequences (`:)`, `<3`) with glyphs.
///
/// A sequence is replaced once it is followed by whitespace or punctuation and
/// preceded by start of text, whitespace or punctuation. The trailing
/// character stays in place; the caret stays after it.
#[derive(Clone)]
pub struct SymbolReplacer {
	inner: Arc<Inner>,
}

struct Inner {
	/// Longest sequence first, so `:-)` wins over `-)`.
	symbols: Vec<(String, String)>,
	busy: AtomicBool,
}

impl SymbolReplacer {
	pub fn new<I, K, V>(symbols: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut symbols: Vec<(String, String)> = symbols.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
		symbols.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
		Self {
			inner: Arc::new(Inner {
				symbols,
				busy: AtomicBool::new(false),
			}),
		}
	}

	pub fn len(&self) -> usize {
		self.inner.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.symbols.is_empty()
	}

	/// Finds a replaceable symbol at the end of `before` (the text before the caret).
	pub fn find(&self, before: &str) -> Option<SymbolMatch> {
		let mut chars = before.chars();
		let trailing = chars.next_back()?;
		if !is_boundary(trailing) {
			return None;
		}
		let body = chars.as_str();
		self.inner.symbols.iter().find_map(|(symbol, glyph)| {
			let head = body.strip_suffix(symbol.as_str())?;
			if head.chars().next_back().is_some_and(|c| !is_boundary(c)) {
				return None;
			}
			let start = head.chars().count();
			Some(SymbolMatch {
				start,
				end: start + symbol.chars().count(),
				glyph: glyph.clone(),
			})
		})
	}

	/// Replaces a symbol before the caret of `document`'s committed state.
	///
	/// Returns false without touching the document while a replacement is
	/// already in progress.
	pub fn apply(&self, document: &dyn Document) -> Result<bool, EditError> {
		if self.inner.busy.swap(true, Ordering::AcqRel) {
			return Ok(false);
		}
		let _busy = Busy(&self.inner.busy);

		let mut replaced = None;
		document.edit_tagged(Some(SYMBOL_REPLACE_TAG), |state: &mut EditorState| {
			let Some((node, found)) = state
				.caret()
				.and_then(|caret| Some((caret.position.node, self.find(caret.before)?)))
			else {
				return Ok(());
			};
			state.splice(node, found.start, found.end, &found.glyph)?;
			replaced = Some(found);
			Ok(())
		})?;

		if let Some(found) = &replaced {
			tracing::debug!(glyph = %found.glyph, offset = found.start, "symbol.replace");
		}
		Ok(replaced.is_some())
	}

	/// Runs [`apply`](Self::apply) after every content change of `document`.
	pub fn attach(&self, document: &Arc<dyn Document>) -> Subscription {
		let replacer = self.clone();
		let weak = Arc::downgrade(document);
		document.subscribe(move |event| {
			if event.tag == Some(SYMBOL_REPLACE_TAG) || !event.content_changed() {
				return;
			}
			let Some(caret) = event.state.caret() else {
				return;
			};
			if replacer.find(caret.before).is_none() {
				return;
			}
			let Some(document) = weak.upgrade() else {
				return;
			};
			if document.read().revision() > event.state.revision() {
				return;
			}
			if let Err(err) = replacer.apply(&*document) {
				tracing::debug!(error = %err, "symbol.replace_failed");
			}
		})
	}
}

impl std::fmt::Debug for SymbolReplacer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SymbolReplacer").field("symbols", &self.inner.symbols).finish()
	}
}

fn is_boundary(c: char) -> bool {
	c.is_whitespace() || c.is_ascii_punctuation()
}

struct Busy<'a>(&'a AtomicBool);

impl Drop for Busy<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}
