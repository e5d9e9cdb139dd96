//! Movement utilities shared by materials.
//!
//! Every utility moves the cell at `pos` by swapping it with the first
//! eligible target of a fixed search pattern and returns the new position.
//! Left/right preference is picked at random per call so piles and pools
//! spread evenly.
//!
//! Eligibility: the source must carry a `MOVABLE` flag; a target must be in
//! bounds, must not be `SOLID`, and must carry one of the utility's
//! displaceable flags.

use rand::Rng;

use crate::cell::MaterialFlags;
use crate::geometry::Point;

use super::context::SimContext;

const DOWN: i32 = -1;
const UP: i32 = 1;

/// How far a search pattern reaches.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Reach {
    /// Straight, then diagonals.
    Diagonal,
    /// Straight, diagonals, then sideways.
    Sideways,
}

impl SimContext<'_> {
    /// Swaps two whole records, aux payloads included.
    ///
    /// Returns false if either position is out of bounds.
    pub fn swap(&mut self, p1: Point, p2: Point) -> bool {
        self.grid.swap_cells(p1, p2)
    }

    /// Powder: down, then a lower diagonal. Sinks through space, gas and
    /// liquid.
    pub fn fall_sand(&mut self, pos: Point) -> Option<Point> {
        self.shift(pos, DOWN, Reach::Diagonal, MaterialFlags::FLOWABLE)
    }

    /// Light powder: like [`Self::fall_sand`], but floats on liquids.
    pub fn fall_ash(&mut self, pos: Point) -> Option<Point> {
        self.shift(pos, DOWN, Reach::Diagonal, MaterialFlags::SPARSENESS)
    }

    /// Liquid: down, lower diagonals, then sideways through space and gas.
    pub fn fall_liquid(&mut self, pos: Point) -> Option<Point> {
        self.shift(pos, DOWN, Reach::Sideways, MaterialFlags::SPARSENESS)
    }

    /// Heavy gas: sinks and spreads like a liquid, but only into space.
    pub fn fall_gas(&mut self, pos: Point) -> Option<Point> {
        self.shift(pos, DOWN, Reach::Sideways, MaterialFlags::SPACE)
    }

    /// Light gas: up, upper diagonals, then sideways, only into space.
    pub fn rise_gas(&mut self, pos: Point) -> Option<Point> {
        self.shift(pos, UP, Reach::Sideways, MaterialFlags::SPACE)
    }

    /// Returns true if the cell at `target` may be displaced by a mover
    /// restricted to `displaceable`.
    #[must_use]
    pub fn can_displace(&self, target: Point, displaceable: MaterialFlags) -> bool {
        self.get_cell(target).is_some_and(|cell| {
            !cell.flags.intersects(MaterialFlags::SOLID) && cell.flags.intersects(displaceable)
        })
    }

    fn shift(&mut self, pos: Point, dy: i32, reach: Reach, displaceable: MaterialFlags) -> Option<Point> {
        if !self.get_cell(pos)?.is_movable() {
            return None;
        }

        let side = if self.rng().gen_bool(0.5) { 1 } else { -1 };
        let pattern = [
            (0, dy),
            (side, dy),
            (-side, dy),
            (side, 0),
            (-side, 0),
        ];
        let len = match reach {
            Reach::Diagonal => 3,
            Reach::Sideways => 5,
        };

        for &(dx, dy) in &pattern[..len] {
            let target = pos.offset(dx, dy);
            if self.can_displace(target, displaceable) {
                self.grid.swap_cells(pos, target);
                return Some(target);
            }
        }
        None
    }
}
