//! # Grid Geometry
//!
//! Integer points, grid sizes and rectangles. No implicit wrap-around anywhere:
//! a coordinate is either inside a grid or it is not.

use std::ops::{Add, Sub};

/// Integer grid coordinate.
///
/// The Y axis points up: row 0 is the bottom of the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row (0 = bottom).
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the point shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.offset(-rhs.x, -rhs.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Grid dimensions in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridSize {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl GridSize {
    /// Creates a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns true if both dimensions are positive.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Number of cells (0 for degenerate sizes).
    #[inline]
    #[must_use]
    pub fn area(self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as usize * self.height as usize
    }

    /// Returns true if `pos` lies in `[0, width) x [0, height)`.
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: Point) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }
}

/// Axis-aligned rectangle: origin plus extent.
///
/// `x1`/`y1` are exclusive. A rectangle with a non-positive width or height
/// is empty and covers no coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Bottom edge (inclusive).
    pub y: i32,
    /// Extent along X.
    pub width: i32,
    /// Extent along Y.
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a `width` x `height` rectangle whose `center()` is `center`.
    #[must_use]
    pub const fn centered(center: Point, width: i32, height: i32) -> Self {
        Self {
            x: center.x - width / 2,
            y: center.y - height / 2,
            width,
            height,
        }
    }

    /// Rectangle covering a whole grid.
    #[inline]
    #[must_use]
    pub const fn from_size(size: GridSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn x1(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive top edge.
    #[inline]
    #[must_use]
    pub const fn y1(self) -> i32 {
        self.y + self.height
    }

    /// Center, rounded toward the origin corner.
    #[inline]
    #[must_use]
    pub const fn center(self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns true if the rectangle covers no coordinates.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns true if `pos` is covered (half-open on both axes).
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: Point) -> bool {
        pos.x >= self.x && pos.x < self.x1() && pos.y >= self.y && pos.y < self.y1()
    }

    /// Overlap of two rectangles, or `None` if they do not overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}
