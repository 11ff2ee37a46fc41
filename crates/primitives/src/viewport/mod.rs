//! Layout queries answered by the UI layer.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::geometry::{Rect, Size};
use crate::ids::ElementId;
use crate::selection::Position;
use crate::state::EditorState;


/// Live layout information about the rendered document.
///
/// Every query reflects the layout at call time; callers re-query after
/// scroll or resize instead of caching rectangles.
pub trait Viewport: Send + Sync {
	/// Visible bounds that floating UI must stay within.
	fn bounds(&self) -> Rect;

	/// Bounding box of the collapsed selection, or `None` when it is not rendered.
	fn caret_rect(&self, state: &EditorState) -> Option<Rect>;

	/// Bounding box of a rendered element, or `None` if it is gone.
	fn element_rect(&self, element: ElementId) -> Option<Rect>;

	/// Returns true while the element is attached to the rendered tree.
	fn is_connected(&self, element: ElementId) -> bool {
		self.element_rect(element).is_some()
	}
}

/// Headless viewport that lays text out on a fixed character grid.
///
/// Each text node occupies one row in document order and each character one
/// cell. Element rectangles are registered explicitly and can be moved or
/// detached to simulate layout shifts.
pub struct GridViewport {
	bounds: Rect,
	cell: Size,
	scroll_y: Mutex<f32>,
	elements: Mutex<HashMap<ElementId, Rect>>,
}

impl GridViewport {
	pub fn new(bounds: Rect, cell: Size) -> Self {
		Self {
			bounds,
			cell,
			scroll_y: Mutex::new(0.0),
			elements: Mutex::new(HashMap::new()),
		}
	}

	/// Places (or moves) an element.
	pub fn set_element(&self, element: ElementId, rect: Rect) {
		self.elements.lock().insert(element, rect);
	}

	/// Detaches an element from the rendered tree.
	pub fn remove_element(&self, element: ElementId) {
		self.elements.lock().remove(&element);
	}

	/// Scrolls content vertically; element and caret rectangles shift up by `dy`.
	pub fn scroll_by(&self, dy: f32) {
		*self.scroll_y.lock() += dy;
	}

	fn position_rect(&self, state: &EditorState, pos: Position) -> Option<Rect> {
		let row = state.nodes().position(|node| node.key == pos.node)?;
		let scroll = *self.scroll_y.lock();
		let x = self.bounds.x + pos.offset as f32 * self.cell.width;
		let y = self.bounds.y + row as f32 * self.cell.height - scroll;
		let rect = Rect::new(x, y, 1.0, self.cell.height);
		(rect.bottom() > self.bounds.top() && rect.top() < self.bounds.bottom()).then_some(rect)
	}
}

impl Default for GridViewport {
	fn default() -> Self {
		Self::new(Rect::new(0.0, 0.0, 1024.0, 768.0), Size::new(8.0, 20.0))
	}
}

impl Viewport for GridViewport {
	fn bounds(&self) -> Rect {
		self.bounds
	}

	fn caret_rect(&self, state: &EditorState) -> Option<Rect> {
		let pos = state.selection()?.caret_position()?;
		self.position_rect(state, pos)
	}

	fn element_rect(&self, element: ElementId) -> Option<Rect> {
		let rect = *self.elements.lock().get(&element)?;
		let scroll = *self.scroll_y.lock();
		Some(Rect::new(rect.x, rect.y - scroll, rect.width, rect.height))
	}
}
