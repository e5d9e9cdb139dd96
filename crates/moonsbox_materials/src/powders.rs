//! Granular and floating materials.

use bytemuck::{Pod, Zeroable};
use moonsbox_core::{
    AuxBlock, AuxError, CoreResult, Material, MaterialData, MaterialFlags, MaterialId,
    MaterialRegistry, Point, Rgba, SimContext, SimRng,
};
use rand::Rng;

use crate::common::{fixed_aux, glow, heat_factor, replace, set_ttl, ttl, ttl_aux, Motion};
use crate::names;

/// Sand state: whether it has ever melted, and its grain color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct SandAux {
    glass: u8,
    grain: Rgba,
}

// glass flag plus the grain color
const SAND_AUX_LEN: usize = 5;

/// Sand. Melts above 1973 K and sets as glass when it cools.
pub struct Sand {
    pub(crate) ambient: f32,
}

impl Sand {
    const MELTING: f32 = 1973.0;

    fn color(temp: f32, aux: SandAux) -> Rgba {
        if aux.glass != 0 {
            glow(temp, 400.0, Self::MELTING, Rgba::from_hex(0x9694_7755), Rgba::from_hex(0xFF88_0085))
        } else {
            glow(temp, 400.0, Self::MELTING, aux.grain, Rgba::from_hex(0xFF66_00AA))
        }
    }
}

impl Material for Sand {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let aux = SandAux {
            glass: 0,
            grain: Rgba::rgb(0xFF, rng.gen_range(0x99..=0xFF), 0),
        };
        MaterialData::new(id, MaterialFlags::BULK, Self::color(self.ambient, aux), self.ambient, 0.3, 0.1)
            .with_aux(AuxBlock::pack(&aux).unwrap_or(AuxBlock::EMPTY))
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        let mut aux: SandAux = cell.aux.unpack().unwrap_or_default();

        let (flags, motion) = if cell.temp > Self::MELTING {
            aux.glass = 1;
            (MaterialFlags::LIQUID, Motion::Liquid)
        } else if aux.glass == 0 {
            (MaterialFlags::BULK, Motion::Powder)
        } else {
            (MaterialFlags::SOLID, Motion::Still)
        };
        cell.flags = flags;
        cell.color = Self::color(cell.temp, aux);
        cell.aux = AuxBlock::pack(&aux).unwrap_or(AuxBlock::EMPTY);

        motion.apply(ctx, pos);
        Ok(())
    }

    fn aux_size(&self, _cell: &MaterialData, _registry: &MaterialRegistry) -> usize {
        SAND_AUX_LEN
    }

    fn serialize_aux(&self, cell: &MaterialData, _registry: &MaterialRegistry, out: &mut [u8]) {
        out.copy_from_slice(&cell.aux.0[..SAND_AUX_LEN]);
    }

    fn deserialize_aux(&self, bytes: &[u8], _registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
        fixed_aux(bytes, SAND_AUX_LEN)
    }
}

/// Soaks up neighbouring liquids until it is spent. Floats.
///
/// The aux block holds the remaining capacity.
pub struct Absorbent {
    pub(crate) ambient: f32,
}

impl Material for Absorbent {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let gray: u8 = rng.gen_range(0xDD..=0xFF);
        let yellow: u8 = rng.gen_range(0x11..=0x33);
        let mut cell = MaterialData::new(
            id,
            MaterialFlags::FLOAT,
            Rgba::rgb(gray, gray, gray - yellow),
            self.ambient,
            0.2,
            0.9,
        );
        set_ttl(&mut cell, rng.gen_range(0..=200));
        cell
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let mut life = match ctx.get_cell(pos) {
            Some(cell) => ttl(cell),
            None => return Ok(()),
        };

        for n in ctx.moore_neighbours(pos).into_iter().flatten() {
            if n.cell.flags.intersects(MaterialFlags::LIQUID) {
                replace(ctx, n.pos, names::SPACE)?;
                life -= 50;
            }
        }

        if life < 0 {
            return replace(ctx, pos, names::SPACE);
        }
        if let Some(cell) = ctx.get_cell_mut(pos) {
            set_ttl(cell, life - 1);
        }
        Motion::Ash.apply(ctx, pos);
        Ok(())
    }

    fn aux_size(&self, _cell: &MaterialData, _registry: &MaterialRegistry) -> usize {
        4
    }

    fn serialize_aux(&self, cell: &MaterialData, _registry: &MaterialRegistry, out: &mut [u8]) {
        out.copy_from_slice(&ttl(cell).to_le_bytes());
    }

    fn deserialize_aux(&self, bytes: &[u8], _registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
        ttl_aux(bytes)
    }
}

/// Light, translucent insulator. Floats.
pub struct Aerogel {
    pub(crate) ambient: f32,
}

impl Material for Aerogel {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let gray = rng.gen_range(0xAA..=0xBB);
        MaterialData::new(id, MaterialFlags::FLOAT, Rgba::new(gray, gray, gray, 0x25), self.ambient, 0.99, 0.01)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        Motion::Ash.apply(ctx, pos);
        Ok(())
    }
}

/// Frozen CO2. Powder below 195 K, heavy gas up to 250 K, gone above.
///
/// The aux block holds the opaque color the cell fades from.
pub struct DryIce;

impl DryIce {
    const FREEZING: f32 = 175.0;
    const SUBLIMATES: f32 = 250.0;

    fn color(temp: f32, base: Rgba) -> Rgba {
        let factor = 1.0 - heat_factor(temp, Self::FREEZING, Self::SUBLIMATES);
        Rgba {
            a: (factor * 255.0).clamp(0.0, 255.0) as u8,
            ..base
        }
    }

    fn base(cell: &MaterialData) -> Rgba {
        cell.aux.unpack().unwrap_or(cell.color)
    }
}

impl Material for DryIce {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let base = Rgba::blend(
            Rgba::from_hex(0xDBE2_EEFF),
            Rgba::from_hex(0xC2D9_DFFF),
            rng.gen::<f32>(),
        );
        let temp = Self::FREEZING;
        MaterialData::new(id, MaterialFlags::BULK, Self::color(temp, base), temp, 0.95, 1.0)
            .with_aux(AuxBlock::pack(&base).unwrap_or(AuxBlock::EMPTY))
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        if cell.temp > Self::SUBLIMATES {
            return replace(ctx, pos, names::SPACE);
        }

        let (flags, motion) = if cell.temp > 195.0 {
            (MaterialFlags::GAS, Motion::HeavyGas)
        } else {
            (MaterialFlags::BULK, Motion::Powder)
        };
        cell.flags = flags;
        cell.color = Self::color(cell.temp, Self::base(cell));
        motion.apply(ctx, pos);
        Ok(())
    }

    fn aux_size(&self, _cell: &MaterialData, _registry: &MaterialRegistry) -> usize {
        4
    }

    fn serialize_aux(&self, cell: &MaterialData, _registry: &MaterialRegistry, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::bytes_of(&Self::base(cell)));
    }

    fn deserialize_aux(&self, bytes: &[u8], _registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
        fixed_aux(bytes, 4)
    }
}
