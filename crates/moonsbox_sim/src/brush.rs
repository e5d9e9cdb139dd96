//! Painting tools.
//!
//! A [`Shape`] picks the cells, a [`Brush`] decides what happens to each
//! of them. Both go through the core rasterizers, so every shape clips to
//! the grid and touches each cell once.

use moonsbox_core::{
    raster, CoreResult, Grid, LineEnds, MaterialFlags, MaterialId, MaterialRegistry, Point, Rect,
    SimRng,
};

/// Temperature change of one heat tool application, in kelvin.
pub const HEAT_STEP: f32 = 100.0;

/// Region to paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Every cell of the rectangle.
    Rect(Rect),
    /// The ellipse inscribed in the rectangle.
    Ellipse(Rect),
    /// A capped line.
    Line {
        /// First end point.
        start: Point,
        /// Last end point.
        end: Point,
        /// Line width in cells.
        width: i32,
        /// Cap and cross-section shape.
        ends: LineEnds,
    },
}

/// What painting does to a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Brush {
    /// Replaces the cell with a fresh cell of the material.
    Material(MaterialId),
    /// Adds `delta` kelvin to the cell, never going below absolute zero.
    Heat(f32),
}

impl Brush {
    /// The +100 K tool.
    #[must_use]
    pub const fn heater() -> Self {
        Self::Heat(HEAT_STEP)
    }

    /// The -100 K tool.
    #[must_use]
    pub const fn cooler() -> Self {
        Self::Heat(-HEAT_STEP)
    }
}

/// Paints `shape` with `brush`. Returns how many cells changed.
///
/// Without `destructive`, a material brush only replaces space, except a
/// brush whose own material is space, which erases anything. Heat brushes
/// apply everywhere.
///
/// # Errors
///
/// Returns [`moonsbox_core::CoreError::UnknownMaterial`] if the brush
/// material is not registered. Nothing is painted in that case.
pub fn paint(
    grid: &mut Grid,
    registry: &MaterialRegistry,
    rng: &mut SimRng,
    shape: Shape,
    brush: Brush,
    destructive: bool,
) -> CoreResult<usize> {
    let mut changed = 0;
    match brush {
        Brush::Material(id) => {
            let material = registry.entry(id)?.material();
            apply(grid, shape, |grid, pos| {
                let fresh = material.create(id, rng);
                let erasing = fresh.flags.intersects(MaterialFlags::SPACE);
                let blocked = grid
                    .get(pos)
                    .is_some_and(|old| !old.flags.intersects(MaterialFlags::SPACE));
                if (erasing || destructive || !blocked) && grid.set(pos, fresh) {
                    changed += 1;
                }
            });
        }
        Brush::Heat(delta) => apply(grid, shape, |grid, pos| {
            if let Some(cell) = grid.get_mut(pos) {
                cell.temp = (cell.temp + delta).max(0.0);
                changed += 1;
            }
        }),
    }
    Ok(changed)
}

fn apply<F>(grid: &mut Grid, shape: Shape, factory: F)
where
    F: FnMut(&mut Grid, Point),
{
    match shape {
        Shape::Rect(rect) => raster::draw_rect(grid, rect, factory),
        Shape::Ellipse(rect) => raster::draw_ellipse(grid, rect, factory),
        Shape::Line {
            start,
            end,
            width,
            ends,
        } => raster::draw_line(grid, start, end, width, ends, factory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonsbox_core::{GridSize, PluginHost};
    use moonsbox_materials::{names, BuiltinMaterials};
    use rand::SeedableRng;

    struct Fixture {
        host: PluginHost,
        grid: Grid,
        rng: SimRng,
    }

    impl Fixture {
        fn new() -> Self {
            let mut host = PluginHost::new();
            host.load(Box::new(BuiltinMaterials::new())).unwrap();
            let mut rng = SimRng::seed_from_u64(3);
            let space = host.registry().id_of(names::SPACE).unwrap();
            let grid = host
                .registry()
                .new_grid(GridSize::new(6, 6), space, &mut rng)
                .unwrap();
            Self { host, grid, rng }
        }

        fn id(&self, name: &str) -> MaterialId {
            self.host.registry().id_of(name).unwrap()
        }

        fn paint(&mut self, shape: Shape, brush: Brush, destructive: bool) -> usize {
            paint(&mut self.grid, self.host.registry(), &mut self.rng, shape, brush, destructive).unwrap()
        }

        fn count(&self, id: MaterialId) -> usize {
            self.grid.cells().iter().filter(|c| c.material == id).count()
        }
    }

    #[test]
    fn test_non_destructive_keeps_matter() {
        let mut fx = Fixture::new();
        let wall = fx.id(names::UNBREAKABLE_WALL);
        let sand = fx.id(names::SAND);

        assert_eq!(fx.paint(Shape::Rect(Rect::new(0, 0, 2, 6)), Brush::Material(wall), false), 12);
        let painted = fx.paint(Shape::Rect(Rect::new(0, 0, 4, 6)), Brush::Material(sand), false);

        assert_eq!(painted, 12);
        assert_eq!(fx.count(wall), 12);
        assert_eq!(fx.count(sand), 12);
    }

    #[test]
    fn test_destructive_overwrites() {
        let mut fx = Fixture::new();
        let wall = fx.id(names::UNBREAKABLE_WALL);
        let sand = fx.id(names::SAND);

        fx.paint(Shape::Rect(Rect::new(0, 0, 2, 6)), Brush::Material(wall), false);
        fx.paint(Shape::Rect(Rect::new(0, 0, 4, 6)), Brush::Material(sand), true);

        assert_eq!(fx.count(wall), 0);
        assert_eq!(fx.count(sand), 24);
    }

    #[test]
    fn test_space_always_erases() {
        let mut fx = Fixture::new();
        let wall = fx.id(names::UNBREAKABLE_WALL);
        let space = fx.id(names::SPACE);

        fx.paint(Shape::Rect(Rect::new(0, 0, 6, 6)), Brush::Material(wall), false);
        let line = Shape::Line {
            start: Point::new(0, 0),
            end: Point::new(5, 0),
            width: 1,
            ends: LineEnds::Square,
        };
        assert_eq!(fx.paint(line, Brush::Material(space), false), 6);
        assert_eq!(fx.count(space), 6);
    }

    #[test]
    fn test_heat_clamps_at_absolute_zero() {
        let mut fx = Fixture::new();
        let all = Shape::Rect(Rect::new(0, 0, 6, 6));

        assert_eq!(fx.paint(all, Brush::heater(), false), 36);
        assert!(fx.grid.cells().iter().all(|c| c.temp == 400.0));

        for _ in 0..5 {
            fx.paint(all, Brush::cooler(), false);
        }
        assert!(fx.grid.cells().iter().all(|c| c.temp == 0.0));
    }

    #[test]
    fn test_ellipse_stays_inside_rect() {
        let mut fx = Fixture::new();
        let sand = fx.id(names::SAND);
        let rect = Rect::new(1, 1, 4, 4);

        let painted = fx.paint(Shape::Ellipse(rect), Brush::Material(sand), false);

        assert!(painted > 0 && painted < 16);
        assert!(fx
            .grid
            .iter()
            .filter(|(_, c)| c.material == sand)
            .all(|(pos, _)| rect.contains(pos)));
    }

    #[test]
    fn test_unknown_material_paints_nothing() {
        let mut fx = Fixture::new();
        let before = fx.grid.clone();
        let result = paint(
            &mut fx.grid,
            fx.host.registry(),
            &mut fx.rng,
            Shape::Rect(Rect::new(0, 0, 6, 6)),
            Brush::Material(MaterialId(999)),
            true,
        );
        assert!(result.is_err());
        assert_eq!(fx.grid, before);
    }
}
