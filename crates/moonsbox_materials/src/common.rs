//! Helpers shared by the stock materials.

use moonsbox_core::{
    AuxBlock, AuxError, CoreError, CoreResult, MaterialData, MaterialId, Point, Rgba, SimContext,
};

/// How a cell moves after its update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Motion {
    /// Does not move.
    Still,
    /// Falls and piles, sinks through liquids.
    Powder,
    /// Falls and piles, floats on liquids.
    Ash,
    /// Falls and spreads.
    Liquid,
    /// Sinks and spreads into space only.
    HeavyGas,
    /// Rises and spreads into space only.
    LightGas,
}

impl Motion {
    /// Moves the cell at `pos`. Returns where it ended up.
    pub(crate) fn apply(self, ctx: &mut SimContext<'_>, pos: Point) -> Point {
        let moved = match self {
            Self::Still => None,
            Self::Powder => ctx.fall_sand(pos),
            Self::Ash => ctx.fall_ash(pos),
            Self::Liquid => ctx.fall_liquid(pos),
            Self::HeavyGas => ctx.fall_gas(pos),
            Self::LightGas => ctx.rise_gas(pos),
        };
        moved.unwrap_or(pos)
    }
}

/// Resolves a sibling material by name.
pub(crate) fn require(ctx: &SimContext<'_>, name: &str) -> CoreResult<MaterialId> {
    ctx.material_id(name).ok_or_else(|| CoreError::unknown_name(name))
}

/// Replaces the cell at `pos` with a fresh `name` cell at temperature `temp`.
pub(crate) fn convert(ctx: &mut SimContext<'_>, pos: Point, name: &str, temp: f32) -> CoreResult<()> {
    let id = require(ctx, name)?;
    ctx.spawn(pos, id)?;
    if let Some(cell) = ctx.get_cell_mut(pos) {
        cell.temp = temp;
    }
    Ok(())
}

/// Replaces the cell at `pos` with a fresh `name` cell at its default
/// temperature.
pub(crate) fn replace(ctx: &mut SimContext<'_>, pos: Point, name: &str) -> CoreResult<()> {
    let id = require(ctx, name)?;
    ctx.spawn(pos, id)?;
    Ok(())
}

/// Linear position of `temp` between `low` and `high` (unclamped).
pub(crate) fn heat_factor(temp: f32, low: f32, high: f32) -> f32 {
    (temp - low) / (high - low)
}

/// Blends between two colors by temperature.
pub(crate) fn glow(temp: f32, low: f32, high: f32, cold: Rgba, hot: Rgba) -> Rgba {
    Rgba::blend(cold, hot, heat_factor(temp, low, high))
}

/// Reads an `i32` counter from the first aux bytes.
pub(crate) fn ttl(cell: &MaterialData) -> i32 {
    cell.aux.unpack::<i32>().unwrap_or(0)
}

/// Stores an `i32` counter in the aux block.
pub(crate) fn set_ttl(cell: &mut MaterialData, ttl: i32) {
    cell.aux = AuxBlock::pack(&ttl).unwrap_or(AuxBlock::EMPTY);
}

/// Decodes a counter written as 4 little-endian bytes.
pub(crate) fn ttl_aux(bytes: &[u8]) -> Result<AuxBlock, AuxError> {
    let raw: [u8; 4] = bytes
        .try_into()
        .map_err(|_| AuxError::bad_length(4, bytes.len()))?;
    let mut cell = MaterialData::default();
    set_ttl(&mut cell, i32::from_le_bytes(raw));
    Ok(cell.aux)
}

/// Decodes a fixed-size aux payload written verbatim.
pub(crate) fn fixed_aux(bytes: &[u8], len: usize) -> Result<AuxBlock, AuxError> {
    if bytes.len() != len {
        return Err(AuxError::bad_length(len, bytes.len()));
    }
    AuxBlock::from_bytes(bytes).ok_or_else(|| AuxError::bad_length(len, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glow_clamps() {
        let cold = Rgba::new(0, 0, 0, 0);
        let hot = Rgba::new(255, 255, 255, 255);
        assert_eq!(glow(100.0, 400.0, 1200.0, cold, hot), cold);
        assert_eq!(glow(5000.0, 400.0, 1200.0, cold, hot), hot);
    }

    #[test]
    fn test_ttl_roundtrip() {
        let mut cell = MaterialData::default();
        set_ttl(&mut cell, -37);
        assert_eq!(ttl(&cell), -37);
    }

    #[test]
    fn test_ttl_aux_is_little_endian() {
        let block = ttl_aux(&(-3i32).to_le_bytes()).unwrap();
        assert_eq!(block.unpack::<i32>(), Some(-3));
        assert!(ttl_aux(&[0; 3]).is_err());
    }

    #[test]
    fn test_fixed_aux_length_checked() {
        assert!(fixed_aux(&[1, 2, 3, 4], 4).is_ok());
        assert_eq!(fixed_aux(&[1, 2], 4), Err(AuxError::bad_length(4, 2)));
    }
}
