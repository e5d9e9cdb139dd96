//! The capability object materials act through.

use crate::cell::{MaterialData, MaterialId};
use crate::error::CoreResult;
use crate::geometry::{GridSize, Point};
use crate::grid::Grid;
use crate::SimRng;

use super::registry::MaterialRegistry;

/// Von Neumann offsets: N, E, S, W.
const VON_NEUMANN: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Moore offsets: N, E, S, W, NE, SE, SW, NW.
const MOORE: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

/// A neighbouring cell and where it lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Position of the neighbour.
    pub pos: Point,
    /// Copy of the neighbour's record.
    pub cell: MaterialData,
}

/// Everything a material update may do to the world.
///
/// Wraps the grid, the registry and the tick's random generator for the
/// duration of one dispatch. The grid's storage layout is not exposed.
pub struct SimContext<'a> {
    pub(super) grid: &'a mut Grid,
    registry: &'a MaterialRegistry,
    rng: &'a mut SimRng,
}

impl<'a> SimContext<'a> {
    /// Creates a context over `grid`.
    pub fn new(grid: &'a mut Grid, registry: &'a MaterialRegistry, rng: &'a mut SimRng) -> Self {
        Self { grid, registry, rng }
    }

    /// Reads the cell at `pos`.
    #[inline]
    #[must_use]
    pub fn get_cell(&self, pos: Point) -> Option<&MaterialData> {
        self.grid.get(pos)
    }

    /// Mutable access to the cell at `pos`.
    #[inline]
    pub fn get_cell_mut(&mut self, pos: Point) -> Option<&mut MaterialData> {
        self.grid.get_mut(pos)
    }

    /// Overwrites the cell at `pos`. Returns false out of bounds.
    #[inline]
    pub fn set_cell(&mut self, pos: Point, cell: MaterialData) -> bool {
        self.grid.set(pos, cell)
    }

    /// Returns true if `pos` is inside the grid.
    #[inline]
    #[must_use]
    pub fn bounds(&self, pos: Point) -> bool {
        self.grid.bounds(pos)
    }

    /// Grid dimensions.
    #[inline]
    #[must_use]
    pub fn size(&self) -> GridSize {
        self.grid.size()
    }

    /// The four axis neighbours, N, E, S, W. `None` past the grid edge.
    #[must_use]
    pub fn von_neumann_neighbours(&self, pos: Point) -> [Option<Neighbour>; 4] {
        VON_NEUMANN.map(|(dx, dy)| self.neighbour(pos.offset(dx, dy)))
    }

    /// The eight surrounding cells, N, E, S, W, NE, SE, SW, NW. `None` past
    /// the grid edge.
    #[must_use]
    pub fn moore_neighbours(&self, pos: Point) -> [Option<Neighbour>; 8] {
        MOORE.map(|(dx, dy)| self.neighbour(pos.offset(dx, dy)))
    }

    fn neighbour(&self, pos: Point) -> Option<Neighbour> {
        self.grid.get(pos).map(|cell| Neighbour { pos, cell: *cell })
    }

    /// Replaces the cell at `pos` with a fresh cell of material `id`.
    ///
    /// Returns `Ok(false)` out of bounds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::UnknownMaterial`] for unregistered ids.
    pub fn spawn(&mut self, pos: Point, id: MaterialId) -> CoreResult<bool> {
        if !self.grid.bounds(pos) {
            return Ok(false);
        }
        let cell = self.registry.create(id, self.rng)?;
        Ok(self.grid.set(pos, cell))
    }

    /// Id registered under `name`.
    #[must_use]
    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.registry.id_of(name)
    }

    /// The material registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'a MaterialRegistry {
        self.registry
    }

    /// The tick's deterministic random generator.
    #[inline]
    pub fn rng(&mut self) -> &mut SimRng {
        self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{MaterialFlags, Rgba};
    use rand::SeedableRng;

    fn marked_grid() -> Grid {
        Grid::new(GridSize::new(3, 3), |grid, pos| {
            let id = MaterialId((pos.x * 10 + pos.y + 1) as u32);
            grid.set(
                pos,
                MaterialData::new(id, MaterialFlags::SPACE, Rgba::TRANSPARENT, 300.0, 0.0, 0.0),
            );
        })
        .unwrap()
    }

    fn id_at(n: &Option<Neighbour>) -> Option<(i32, i32)> {
        n.map(|n| (n.pos.x, n.pos.y))
    }

    #[test]
    fn test_von_neumann_order_and_edges() {
        let mut grid = marked_grid();
        let registry = MaterialRegistry::new();
        let mut rng = SimRng::seed_from_u64(0);
        let ctx = SimContext::new(&mut grid, &registry, &mut rng);

        let center: Vec<_> = ctx.von_neumann_neighbours(Point::new(1, 1)).iter().map(id_at).collect();
        assert_eq!(center, vec![Some((1, 2)), Some((2, 1)), Some((1, 0)), Some((0, 1))]);

        let corner: Vec<_> = ctx.von_neumann_neighbours(Point::new(0, 0)).iter().map(id_at).collect();
        assert_eq!(corner, vec![Some((0, 1)), Some((1, 0)), None, None]);
    }

    #[test]
    fn test_moore_order_and_edges() {
        let mut grid = marked_grid();
        let registry = MaterialRegistry::new();
        let mut rng = SimRng::seed_from_u64(0);
        let ctx = SimContext::new(&mut grid, &registry, &mut rng);

        let all = ctx.moore_neighbours(Point::new(1, 1));
        assert!(all.iter().all(Option::is_some));
        assert_eq!(id_at(&all[4]), Some((2, 2)));
        assert_eq!(id_at(&all[7]), Some((0, 2)));
        assert_eq!(all[5].unwrap().cell.material, MaterialId(2 * 10 + 1));

        let corner = ctx.moore_neighbours(Point::new(2, 2));
        assert_eq!(corner.iter().filter(|n| n.is_some()).count(), 3);
    }

    #[test]
    fn test_spawn_out_of_bounds_and_unknown() {
        let mut grid = marked_grid();
        let registry = MaterialRegistry::new();
        let mut rng = SimRng::seed_from_u64(0);
        let mut ctx = SimContext::new(&mut grid, &registry, &mut rng);
        assert_eq!(ctx.spawn(Point::new(5, 5), MaterialId(1)), Ok(false));
        assert!(ctx.spawn(Point::new(1, 1), MaterialId(1)).is_err());
        assert!(ctx.get_cell(Point::new(-1, 0)).is_none());
    }
}
