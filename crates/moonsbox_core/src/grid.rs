//! # Grid Storage
//!
//! The world is a single rectangle of [`MaterialData`] records stored
//! column-first: `index = y + x * height`. Walking the vector in order walks
//! the world column by column, bottom to top, which is also the order in
//! which `fill` and the tick dispatcher visit cells.
//!
//! Every coordinate query is bounds-checked and answers out-of-range
//! coordinates with `None` / `false`. Nothing here panics on bad input.

use crate::cell::{MaterialData, Rgba};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{GridSize, Point, Rect};
use crate::raster;

/// Rectangular cell storage.
///
/// `Grid::default()` is the empty 0x0 grid: it has no cells and every
/// coordinate is out of bounds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<MaterialData>,
}

impl Grid {
    /// Creates a grid and initializes every cell through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] if either dimension is not positive.
    pub fn new<F>(size: GridSize, factory: F) -> CoreResult<Self>
    where
        F: FnMut(&mut Grid, Point),
    {
        let mut grid = Self::zeroed(size)?;
        raster::fill(&mut grid, factory);
        Ok(grid)
    }

    /// Creates a grid where every cell is a copy of `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] if either dimension is not positive.
    pub fn filled(size: GridSize, cell: MaterialData) -> CoreResult<Self> {
        check_size(size)?;
        Ok(Self {
            size,
            cells: vec![cell; size.area()],
        })
    }

    /// Rebuilds a grid from column-first records.
    pub(crate) fn from_cells(size: GridSize, cells: Vec<MaterialData>) -> CoreResult<Self> {
        let degenerate = size.width < 0 || size.height < 0 || (size.width == 0) != (size.height == 0);
        if degenerate || cells.len() != size.area() {
            return Err(CoreError::corrupt(format!(
                "{} cells do not fill a {}x{} grid",
                cells.len(),
                size.width,
                size.height
            )));
        }
        Ok(Self { size, cells })
    }

    fn zeroed(size: GridSize) -> CoreResult<Self> {
        Self::filled(size, MaterialData::default())
    }

    /// Grid dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.size.width
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.size.height
    }

    /// Rectangle covering the whole grid.
    #[inline]
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::from_size(self.size)
    }

    /// Returns true iff `0 <= x < width` and `0 <= y < height`.
    #[inline]
    #[must_use]
    pub const fn bounds(&self, pos: Point) -> bool {
        self.size.contains(pos)
    }

    /// Storage index of `pos`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn index(&self, pos: Point) -> Option<usize> {
        if !self.bounds(pos) {
            return None;
        }
        Some(pos.y as usize + pos.x as usize * self.size.height as usize)
    }

    /// Coordinate of a storage index.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<Point> {
        if index >= self.cells.len() {
            return None;
        }
        let height = self.size.height as usize;
        Some(Point::new((index / height) as i32, (index % height) as i32))
    }

    /// Reads the cell at `pos`.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: Point) -> Option<&MaterialData> {
        self.index(pos).and_then(|i| self.cells.get(i))
    }

    /// Mutable access to the cell at `pos`.
    #[inline]
    pub fn get_mut(&mut self, pos: Point) -> Option<&mut MaterialData> {
        self.index(pos).and_then(|i| self.cells.get_mut(i))
    }

    /// Overwrites the cell at `pos`. Returns false (and does nothing) out of bounds.
    #[inline]
    pub fn set(&mut self, pos: Point, cell: MaterialData) -> bool {
        match self.get_mut(pos) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Exchanges two whole records, aux payloads included.
    ///
    /// Returns false without touching anything if either position is out of
    /// bounds.
    pub fn swap_cells(&mut self, a: Point, b: Point) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => {
                self.cells.swap(i, j);
                true
            }
            _ => false,
        }
    }

    /// All records in storage (column-first) order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[MaterialData] {
        &self.cells
    }

    /// Iterates `(position, cell)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &MaterialData)> + '_ {
        let height = self.size.height.max(1) as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Point::new((i / height) as i32, (i % height) as i32), cell))
    }

    /// Changes the grid dimensions, keeping the overlapping region.
    ///
    /// Cells present in both the old and the new grid keep their records.
    /// Only the newly exposed cells are initialized through `factory`, in
    /// storage order. Previously obtained references are invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] if either dimension is not
    /// positive; the grid is left unchanged.
    pub fn resize<F>(&mut self, new_size: GridSize, mut factory: F) -> CoreResult<()>
    where
        F: FnMut(&mut Grid, Point),
    {
        check_size(new_size)?;
        let old = std::mem::replace(self, Self::zeroed(new_size)?);
        let keep = old.rect().intersect(self.rect());

        if let Some(keep) = keep {
            for x in keep.x..keep.x1() {
                let src = old.index(Point::new(x, 0));
                let dst = self.index(Point::new(x, 0));
                if let (Some(src), Some(dst)) = (src, dst) {
                    let rows = keep.height as usize;
                    self.cells[dst..dst + rows].copy_from_slice(&old.cells[src..src + rows]);
                }
            }
        }

        for x in 0..new_size.width {
            for y in 0..new_size.height {
                let pos = Point::new(x, y);
                if !keep.is_some_and(|k| k.contains(pos)) {
                    factory(self, pos);
                }
            }
        }

        tracing::debug!(
            from_width = old.size.width,
            from_height = old.size.height,
            to_width = new_size.width,
            to_height = new_size.height,
            "grid resized"
        );
        Ok(())
    }

    /// Reallocates the grid and re-initializes every cell through `factory`.
    ///
    /// Nothing of the old contents survives.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSize`] if either dimension is not
    /// positive; the grid is left unchanged.
    pub fn reinitialize<F>(&mut self, new_size: GridSize, factory: F) -> CoreResult<()>
    where
        F: FnMut(&mut Grid, Point),
    {
        *self = Self::new(new_size, factory)?;
        tracing::debug!(
            width = new_size.width,
            height = new_size.height,
            "grid reinitialized"
        );
        Ok(())
    }

    /// Converts a row between world space (Y up) and screen space (Y down).
    #[inline]
    #[must_use]
    pub const fn invert_y(&self, y: i32) -> i32 {
        self.size.height - 1 - y
    }

    /// Converts a position between world space and screen space.
    #[inline]
    #[must_use]
    pub const fn invert_y_pos(&self, pos: Point) -> Point {
        Point::new(pos.x, self.invert_y(pos.y))
    }

    /// Cell colors as a tightly packed RGBA8 image, top row first.
    #[must_use]
    pub fn rgba_image(&self) -> Vec<u8> {
        let mut pixels: Vec<Rgba> = Vec::with_capacity(self.cells.len());
        for y in (0..self.size.height).rev() {
            for x in 0..self.size.width {
                pixels.push(self.get(Point::new(x, y)).map_or(Rgba::TRANSPARENT, |c| c.color));
            }
        }
        bytemuck::cast_slice(&pixels).to_vec()
    }
}

fn check_size(size: GridSize) -> CoreResult<()> {
    if size.is_valid() {
        Ok(())
    } else {
        Err(CoreError::InvalidSize {
            width: size.width,
            height: size.height,
        })
    }
}
