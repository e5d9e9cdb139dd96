//! Heat exchange between neighbouring cells.

use moonsbox_core::{Point, SimContext};

// west, east, south, north
const EXCHANGE_ORDER: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Pulls the temperature of the cell at `pos` toward each in-bounds
/// von Neumann neighbour in turn:
///
/// `temp += (neighbour.temp - temp) * neighbour.thermal_conductivity * heat_capacity`
///
/// Only the cell at `pos` changes. Each step sees the result of the
/// previous one.
pub fn exchange(ctx: &mut SimContext<'_>, pos: Point) {
    let mut pulls = [None; 4];
    for (pull, (dx, dy)) in pulls.iter_mut().zip(EXCHANGE_ORDER) {
        *pull = ctx
            .get_cell(pos.offset(dx, dy))
            .map(|n| (n.temp, n.thermal_conductivity));
    }

    let Some(cell) = ctx.get_cell_mut(pos) else {
        return;
    };
    for (temp, conductivity) in pulls.into_iter().flatten() {
        cell.temp += (temp - cell.temp) * conductivity * cell.heat_capacity;
    }
}
