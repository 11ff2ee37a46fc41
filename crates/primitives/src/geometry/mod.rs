//! Screen-space geometry in CSS pixels.


/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f32,
	/// Vertical coordinate.
	pub y: f32,
}

impl Point {
	/// Creates a point.
	pub const fn new(x: f32, y: f32) -> Self {
		Self { x, y }
	}

	/// Returns this point translated by `(dx, dy)`.
	pub fn offset(self, dx: f32, dy: f32) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
	pub width: f32,
	pub height: f32,
}

impl Size {
	pub const fn new(width: f32, height: f32) -> Self {
		Self { width, height }
	}
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32,
}

impl Rect {
	/// Creates a rectangle; negative dimensions are clamped to zero.
	pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
		Self {
			x,
			y,
			width: width.max(0.0),
			height: height.max(0.0),
		}
	}

	/// Creates a rectangle from its origin and size.
	pub fn from_origin(origin: Point, size: Size) -> Self {
		Self::new(origin.x, origin.y, size.width, size.height)
	}

	pub fn origin(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn size(&self) -> Size {
		Size::new(self.width, self.height)
	}

	pub fn left(&self) -> f32 {
		self.x
	}

	pub fn right(&self) -> f32 {
		self.x + self.width
	}

	pub fn top(&self) -> f32 {
		self.y
	}

	pub fn bottom(&self) -> f32 {
		self.y + self.height
	}

	/// Bottom-left corner, where floating menus attach below a caret.
	pub fn bottom_left(&self) -> Point {
		Point::new(self.x, self.bottom())
	}

	/// Inclusive origin, exclusive far edges.
	pub fn contains(&self, point: Point) -> bool {
		point.x >= self.left() && point.x < self.right() && point.y >= self.top() && point.y < self.bottom()
	}

	/// Shifts the rectangle so that it lies inside `bounds`.
	///
	/// On an axis where the rectangle is larger than `bounds` it is aligned to
	/// the bounds' origin instead.
	pub fn clamp_within(self, bounds: Rect) -> Rect {
		let x = if self.width >= bounds.width {
			bounds.x
		} else {
			self.x.clamp(bounds.left(), bounds.right() - self.width)
		};
		let y = if self.height >= bounds.height {
			bounds.y
		} else {
			self.y.clamp(bounds.top(), bounds.bottom() - self.height)
		};
		Rect::new(x, y, self.width, self.height)
	}
}
