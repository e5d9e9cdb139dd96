//! Space and the stationary materials.

use moonsbox_core::{
    AuxBlock, AuxError, CoreResult, Material, MaterialData, MaterialFlags, MaterialId,
    MaterialRegistry, Point, Rgba, SimContext, SimRng,
};
use rand::Rng;

use crate::common::{glow, replace, Motion};
use crate::names;

/// Empty space. Painting it erases.
pub struct Space {
    pub(crate) ambient: f32,
}

impl Material for Space {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::SPACE, Rgba::TRANSPARENT, self.ambient, 0.3, 1.0)
    }
}

/// Inert white wall.
pub struct UnbreakableWall {
    pub(crate) ambient: f32,
}

impl Material for UnbreakableWall {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::SOLID, Rgba::rgb(0xFF, 0xFF, 0xFF), self.ambient, 0.6, 0.4)
    }
}

/// Deletes every movable cell that touches it.
pub struct BlackHole {
    pub(crate) ambient: f32,
}

impl Material for BlackHole {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::SOLID, Rgba::from_hex(0x1F1F_1FFF), self.ambient, 0.0, 0.0)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        for n in ctx.von_neumann_neighbours(pos).into_iter().flatten() {
            if n.cell.flags.intersects(MaterialFlags::MOVABLE) {
                replace(ctx, n.pos, names::SPACE)?;
            }
        }
        Ok(())
    }
}

/// Copies the first movable material that touches it and keeps emitting it.
///
/// The aux block holds the source material id; saves store its name.
pub struct Tap {
    pub(crate) ambient: f32,
}

impl Tap {
    fn source(cell: &MaterialData) -> MaterialId {
        MaterialId(cell.aux.unpack::<u32>().unwrap_or(0))
    }

    fn with_source(source: MaterialId) -> AuxBlock {
        AuxBlock::pack(&source.0).unwrap_or(AuxBlock::EMPTY)
    }
}

impl Material for Tap {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::SOLID, Rgba::from_hex(0x67A0_46FF), self.ambient, 0.2, 0.6)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(&cell) = ctx.get_cell(pos) else {
            return Ok(());
        };
        let source = Self::source(&cell);

        if source.is_null() {
            let first_movable = ctx
                .von_neumann_neighbours(pos)
                .into_iter()
                .flatten()
                .find(|n| n.cell.is_movable());
            if let (Some(n), Some(me)) = (first_movable, ctx.get_cell_mut(pos)) {
                me.aux = Self::with_source(n.cell.material);
            }
        } else if ctx.rng().gen_range(1..=6) == 6 {
            for n in ctx.von_neumann_neighbours(pos).into_iter().flatten() {
                if n.cell.flags.intersects(MaterialFlags::SPACE) {
                    ctx.spawn(n.pos, source)?;
                }
            }
        } else if ctx.rng().gen_range(1..=30) == 16 {
            for n in ctx.moore_neighbours(pos).into_iter().flatten() {
                if n.cell.material == cell.material {
                    if let Some(other) = ctx.get_cell_mut(n.pos) {
                        other.aux = Self::with_source(source);
                    }
                }
            }
        }
        Ok(())
    }

    fn aux_size(&self, cell: &MaterialData, registry: &MaterialRegistry) -> usize {
        registry.get(Self::source(cell)).map_or(0, |e| e.name().len())
    }

    fn serialize_aux(&self, cell: &MaterialData, registry: &MaterialRegistry, out: &mut [u8]) {
        if let Some(entry) = registry.get(Self::source(cell)) {
            out.copy_from_slice(entry.name().as_bytes());
        }
    }

    fn deserialize_aux(&self, bytes: &[u8], registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
        if bytes.is_empty() {
            return Ok(AuxBlock::EMPTY);
        }
        let name = std::str::from_utf8(bytes).map_err(|e| AuxError(format!("source name: {e}")))?;
        let source = registry
            .id_of(name)
            .ok_or_else(|| AuxError(format!("unknown source material '{name}'")))?;
        Ok(Self::with_source(source))
    }
}

/// Glass melts above 1773 K.
pub struct Glass {
    pub(crate) ambient: f32,
}

impl Glass {
    const MELTING: f32 = 1773.0;
    const COLD: Rgba = Rgba::from_hex(0x53D4_9820);
    const HOT: Rgba = Rgba::from_hex(0xFF88_0085);

    fn phase(temp: f32) -> MaterialFlags {
        if temp > Self::MELTING {
            MaterialFlags::LIQUID
        } else {
            MaterialFlags::SOLID
        }
    }

    fn color(temp: f32) -> Rgba {
        glow(temp, 400.0, Self::MELTING, Self::COLD, Self::HOT)
    }
}

impl Material for Glass {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        let temp = self.ambient;
        MaterialData::new(id, Self::phase(temp), Self::color(temp), temp, 0.5, 0.05)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        cell.flags = Self::phase(cell.temp);
        cell.color = Self::color(cell.temp);
        if cell.flags == MaterialFlags::LIQUID {
            Motion::Liquid.apply(ctx, pos);
        }
        Ok(())
    }
}
