//! # Rasterization
//!
//! Shape enumerators that call a factory once per covered grid coordinate.
//!
//! A factory is any `FnMut(&mut Grid, Point)`. The grid is lent back to the
//! factory for each call, so it can `set` a fresh cell, tweak the existing
//! one, or do nothing at all. Coordinates outside the grid are never passed
//! to a factory.

use std::collections::HashSet;

use crate::geometry::{Point, Rect};
use crate::grid::Grid;

/// How the neighbourhood around each line point is shaped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineEnds {
    /// Every offset in `[-r, r] x [-r, r]`.
    Square,
    /// Only offsets with `dx² + dy² <= r²`.
    #[default]
    Round,
}

/// Calls `factory` at every coordinate of the grid, x outer, y inner.
pub fn fill<F>(grid: &mut Grid, factory: F)
where
    F: FnMut(&mut Grid, Point),
{
    let rect = grid.rect();
    for_each_in(grid, rect, factory);
}

/// Calls `factory` at every coordinate of `rect` clipped to the grid.
///
/// Empty rectangles cover nothing.
pub fn draw_rect<F>(grid: &mut Grid, rect: Rect, factory: F)
where
    F: FnMut(&mut Grid, Point),
{
    if let Some(clipped) = rect.intersect(grid.rect()) {
        for_each_in(grid, clipped, factory);
    }
}

/// Calls `factory` at every coordinate strictly inside the ellipse inscribed
/// in `rect`.
///
/// With `a = width / 2`, `b = height / 2` and `c = rect.center()`, a point
/// is covered iff `b²(x − cx)² + a²(y − cy)² < a²b²`. The test is evaluated
/// on doubled axes in 64-bit integers, so odd extents stay exact. Only
/// `rect ∩ grid` is traversed; no covered point lies outside `rect`.
pub fn draw_ellipse<F>(grid: &mut Grid, rect: Rect, mut factory: F)
where
    F: FnMut(&mut Grid, Point),
{
    let Some(clipped) = rect.intersect(grid.rect()) else {
        return;
    };
    let center = rect.center();
    let aa = i64::from(rect.width) * i64::from(rect.width);
    let bb = i64::from(rect.height) * i64::from(rect.height);
    let limit = aa * bb;

    for x in clipped.x..clipped.x1() {
        let dx = i64::from(x - center.x);
        for y in clipped.y..clipped.y1() {
            let dy = i64::from(y - center.y);
            if 4 * (bb * dx * dx + aa * dy * dy) < limit {
                factory(grid, Point::new(x, y));
            }
        }
    }
}

/// Gapless Bresenham walk from `start` to `end`, both inclusive.
///
/// Consecutive points differ by at most one on each axis. The dominant axis
/// is X only when `|Δx| > |Δy|`.
#[must_use]
pub fn line_points(start: Point, end: Point) -> Vec<Point> {
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    let sx = if start.x < end.x { 1 } else { -1 };
    let sy = if start.y < end.y { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(dy) as usize + 1);
    let mut cur = start;

    // error terms are doubled so the half step stays integral
    if dx > dy {
        let mut error = dx;
        while cur.x != end.x {
            points.push(cur);
            cur.x += sx;
            error -= 2 * dy;
            if error < 0 {
                cur.y += sy;
                error += 2 * dx;
            }
        }
    } else {
        let mut error = dy;
        while cur.y != end.y {
            points.push(cur);
            cur.y += sy;
            error -= 2 * dx;
            if error < 0 {
                cur.x += sx;
                error += 2 * dy;
            }
        }
    }
    points.push(cur);
    points
}

/// Draws a `width`-wide line from `start` to `end`.
///
/// Each point of [`line_points`] is expanded to a neighbourhood of radius
/// `max(0, width / 2)` shaped by `ends`. Every covered in-bounds coordinate
/// reaches `factory` exactly once, in first-visit order, even where the
/// neighbourhoods of adjacent points overlap.
pub fn draw_line<F>(
    grid: &mut Grid,
    start: Point,
    end: Point,
    width: i32,
    ends: LineEnds,
    mut factory: F,
) where
    F: FnMut(&mut Grid, Point),
{
    let radius = (width / 2).max(0);
    let mut visited = HashSet::new();

    for center in line_points(start, end) {
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if ends == LineEnds::Round && dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let pos = center.offset(dx, dy);
                if grid.bounds(pos) && visited.insert(pos) {
                    factory(grid, pos);
                }
            }
        }
    }
}

fn for_each_in<F>(grid: &mut Grid, rect: Rect, mut factory: F)
where
    F: FnMut(&mut Grid, Point),
{
    for x in rect.x..rect.x1() {
        for y in rect.y..rect.y1() {
            factory(grid, Point::new(x, y));
        }
    }
}
