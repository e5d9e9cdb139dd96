//! Per-tick update dispatch.

use crate::error::CoreResult;
use crate::geometry::Point;
use crate::grid::Grid;
use crate::SimRng;

use super::context::SimContext;
use super::registry::MaterialRegistry;

/// Counters for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Number of update calls dispatched.
    pub cells: usize,
}

/// Runs the update routine of whatever material occupies `pos`.
///
/// Returns `Ok(false)` if `pos` is out of bounds.
///
/// # Errors
///
/// Returns [`crate::CoreError::UnknownMaterial`] if the cell's material id
/// (null included) is not registered, or the material's own error.
pub fn update_cell(ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<bool> {
    let Some(cell) = ctx.get_cell(pos) else {
        return Ok(false);
    };
    let entry = ctx.registry().entry(cell.material)?;
    entry.material().update(ctx, pos)?;
    Ok(true)
}

/// Updates every cell once, column by column, bottom to top.
///
/// A cell that moves into a position not yet visited this tick is updated
/// again when the walk reaches it.
///
/// # Errors
///
/// Stops at the first failing update; cells already updated keep their
/// new state.
pub fn run_tick(grid: &mut Grid, registry: &MaterialRegistry, rng: &mut SimRng) -> CoreResult<TickStats> {
    let size = grid.size();
    let mut ctx = SimContext::new(grid, registry, rng);
    let mut stats = TickStats::default();

    for x in 0..size.width {
        for y in 0..size.height {
            if update_cell(&mut ctx, Point::new(x, y))? {
                stats.cells += 1;
            }
        }
    }

    tracing::trace!(cells = stats.cells, "tick dispatched");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{MaterialData, MaterialFlags, MaterialId, Rgba};
    use crate::error::CoreError;
    use crate::geometry::GridSize;
    use crate::plugin::{Material, Registrar, Version};
    use rand::SeedableRng;

    struct Inert;

    impl Material for Inert {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, MaterialFlags::SPACE, Rgba::TRANSPARENT, 300.0, 0.3, 1.0)
        }
    }

    struct Sand;

    impl Material for Sand {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, MaterialFlags::BULK, Rgba::rgb(255, 200, 0), 300.0, 0.3, 0.1)
        }

        fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
            ctx.fall_sand(pos);
            Ok(())
        }
    }

    /// Heats itself every update, so double updates are visible.
    struct Counter;

    impl Material for Counter {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, MaterialFlags::SOLID, Rgba::TRANSPARENT, 0.0, 0.0, 0.0)
        }

        fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
            if let Some(cell) = ctx.get_cell_mut(pos) {
                cell.temp += 1.0;
            }
            Ok(())
        }
    }

    fn registry() -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        let mut registrar = Registrar::new(&mut registry, "test");
        let v = Version::new(1, 0);
        registrar.register_material("Space", v, Box::new(Inert)).unwrap();
        registrar.register_material("Sand", v, Box::new(Sand)).unwrap();
        registrar.register_material("Counter", v, Box::new(Counter)).unwrap();
        registrar.commit();
        registry
    }

    #[test]
    fn test_tick_updates_every_cell_once() {
        let registry = registry();
        let mut rng = SimRng::seed_from_u64(7);
        let counter = registry.id_of("Counter").unwrap();
        let mut grid = registry.new_grid(GridSize::new(4, 3), counter, &mut rng).unwrap();

        let stats = run_tick(&mut grid, &registry, &mut rng).unwrap();
        assert_eq!(stats, TickStats { cells: 12 });
        assert!(grid.cells().iter().all(|c| c.temp == 1.0));
    }

    #[test]
    fn test_sand_settles_over_ticks() {
        let registry = registry();
        let mut rng = SimRng::seed_from_u64(7);
        let space = registry.id_of("Space").unwrap();
        let sand = registry.id_of("Sand").unwrap();
        let mut grid = registry.new_grid(GridSize::new(1, 5), space, &mut rng).unwrap();
        let cell = registry.create(sand, &mut rng).unwrap();
        grid.set(Point::new(0, 4), cell);

        for _ in 0..5 {
            run_tick(&mut grid, &registry, &mut rng).unwrap();
        }
        assert_eq!(grid.get(Point::new(0, 0)).unwrap().material, sand);
        let sand_cells = grid.cells().iter().filter(|c| c.material == sand).count();
        assert_eq!(sand_cells, 1);
    }

    #[test]
    fn test_unknown_material_aborts_tick() {
        let registry = registry();
        let mut rng = SimRng::seed_from_u64(7);
        let space = registry.id_of("Space").unwrap();
        let mut grid = registry.new_grid(GridSize::new(2, 2), space, &mut rng).unwrap();
        grid.get_mut(Point::new(1, 1)).unwrap().material = MaterialId(42);
        assert_eq!(
            run_tick(&mut grid, &registry, &mut rng).unwrap_err(),
            CoreError::unknown_id(42)
        );

        grid.get_mut(Point::new(1, 1)).unwrap().material = MaterialId::NULL;
        assert!(run_tick(&mut grid, &registry, &mut rng).is_err());
    }

    #[test]
    fn test_update_cell_out_of_bounds() {
        let registry = registry();
        let mut rng = SimRng::seed_from_u64(7);
        let mut grid = Grid::default();
        let mut ctx = SimContext::new(&mut grid, &registry, &mut rng);
        assert_eq!(update_cell(&mut ctx, Point::new(0, 0)), Ok(false));
    }
}
