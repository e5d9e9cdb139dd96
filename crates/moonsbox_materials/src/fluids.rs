//! Water and its phases, lava, propane and fire.

use moonsbox_core::{
    AuxBlock, AuxError, CoreResult, Material, MaterialData, MaterialFlags, MaterialId,
    MaterialRegistry, Point, Rgba, SimContext, SimRng,
};
use rand::Rng;

use crate::common::{convert, heat_factor, replace, set_ttl, ttl, ttl_aux, Motion};
use crate::names;

const WATER_HEAT_CAPACITY: f32 = 0.7;
const WATER_CONDUCTIVITY: f32 = 0.3;

/// Liquid water. Freezes below 270 K, boils above 375 K.
pub struct Water {
    pub(crate) ambient: f32,
}

impl Material for Water {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let color = Rgba::rgb(0, rng.gen_range(0x95..=0xBB), 0x99);
        MaterialData::new(id, MaterialFlags::LIQUID, color, self.ambient, WATER_HEAT_CAPACITY, WATER_CONDUCTIVITY)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(temp) = ctx.get_cell(pos).map(|c| c.temp) else {
            return Ok(());
        };
        if temp < 270.0 {
            convert(ctx, pos, names::ICE, temp)
        } else if temp > 375.0 {
            convert(ctx, pos, names::STEAM, temp)
        } else {
            Motion::Liquid.apply(ctx, pos);
            Ok(())
        }
    }
}

/// Frozen water. Melts above 275 K.
pub struct Ice;

impl Material for Ice {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(
            id,
            MaterialFlags::SOLID,
            Rgba::from_hex(0x66C8_E0B7),
            220.0,
            WATER_HEAT_CAPACITY,
            WATER_CONDUCTIVITY,
        )
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        match ctx.get_cell(pos).map(|c| c.temp) {
            Some(temp) if temp > 275.0 => convert(ctx, pos, names::WATER, temp),
            _ => Ok(()),
        }
    }
}

/// Water vapour. Condenses below 370 K.
pub struct Steam;

impl Material for Steam {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(
            id,
            MaterialFlags::GAS,
            Rgba::from_hex(0x28BB_C53D),
            420.0,
            WATER_HEAT_CAPACITY,
            WATER_CONDUCTIVITY,
        )
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        match ctx.get_cell(pos).map(|c| c.temp) {
            Some(temp) if temp < 370.0 => convert(ctx, pos, names::WATER, temp),
            Some(_) => {
                Motion::LightGas.apply(ctx, pos);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Molten rock. Flows above 400 K, solid below.
pub struct Lava;

impl Lava {
    const SOLIDIFIES: f32 = 400.0;

    fn color(temp: f32) -> Rgba {
        let factor = heat_factor(temp, Self::SOLIDIFIES, 1200.0);
        if factor > 0.5 {
            Rgba::blend(Rgba::from_hex(0xFF00_00FF), Rgba::from_hex(0xFFFF_00FF), (factor - 0.5) * 2.0)
        } else {
            Rgba::blend(Rgba::from_hex(0x4400_00FF), Rgba::from_hex(0xFF00_00FF), factor * 2.0)
        }
    }
}

impl Material for Lava {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::LIQUID, Self::color(1200.0), 1200.0, 0.8, 0.5)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        let molten = cell.temp > Self::SOLIDIFIES;
        cell.flags = if molten { MaterialFlags::LIQUID } else { MaterialFlags::SOLID };
        cell.color = Self::color(cell.temp);
        if molten {
            Motion::Liquid.apply(ctx, pos);
        }
        Ok(())
    }
}

/// Flammable gas with solid and liquid phases.
pub struct Propane {
    pub(crate) ambient: f32,
}

impl Propane {
    const IGNITES: f32 = 700.0;
    const FIRE_TEMP: f32 = 2800.0;
    const SOLID_COLOR: Rgba = Rgba::from_hex(0x6D8E_C9B8);
    const LIQUID_COLOR: Rgba = Rgba::from_hex(0x5376_B885);
    const GAS_COLOR: Rgba = Rgba::from_hex(0x385D_A345);

    fn ignite(ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        convert(ctx, pos, names::FIRE, Self::FIRE_TEMP)?;
        for n in ctx.moore_neighbours(pos).into_iter().flatten() {
            if n.cell.flags.intersects(MaterialFlags::GAS) {
                convert(ctx, n.pos, names::FIRE, Self::FIRE_TEMP)?;
            }
        }
        Ok(())
    }
}

impl Material for Propane {
    fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
        MaterialData::new(id, MaterialFlags::GAS, Self::GAS_COLOR, self.ambient, 0.3, 0.5)
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        if cell.temp > Self::IGNITES {
            return Self::ignite(ctx, pos);
        }

        let (flags, color) = if cell.flags.intersects(MaterialFlags::SOLID) {
            if cell.temp > 85.0 {
                (MaterialFlags::LIQUID, Self::LIQUID_COLOR)
            } else {
                (cell.flags, cell.color)
            }
        } else if cell.flags.intersects(MaterialFlags::LIQUID) {
            if cell.temp < 80.0 {
                (MaterialFlags::SOLID, Self::SOLID_COLOR)
            } else if cell.temp > 235.0 {
                (MaterialFlags::GAS, Self::GAS_COLOR)
            } else {
                (cell.flags, cell.color)
            }
        } else if cell.temp < 230.0 {
            (MaterialFlags::LIQUID, Self::LIQUID_COLOR)
        } else {
            (cell.flags, cell.color)
        };
        cell.flags = flags;
        cell.color = color;

        let motion = if flags.intersects(MaterialFlags::GAS) {
            Motion::LightGas
        } else if flags.intersects(MaterialFlags::LIQUID) {
            Motion::Liquid
        } else {
            Motion::Still
        };
        motion.apply(ctx, pos);
        Ok(())
    }
}

/// Short-lived flame. The aux block holds the remaining ticks.
pub struct Fire;

impl Fire {
    const MAX_TTL: i32 = 20;

    fn color(ttl: i32) -> Rgba {
        Rgba::blend(
            Rgba::from_hex(0xFF00_0044),
            Rgba::from_hex(0xFFFF_00FF),
            ttl as f32 / Self::MAX_TTL as f32,
        )
    }
}

impl Material for Fire {
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData {
        let life = rng.gen_range(0..=Self::MAX_TTL);
        let mut cell = MaterialData::new(id, MaterialFlags::GAS, Self::color(life), 1000.0, 1.0, 1.0);
        set_ttl(&mut cell, life);
        cell
    }

    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let Some(cell) = ctx.get_cell_mut(pos) else {
            return Ok(());
        };
        let life = ttl(cell);
        if life <= 0 {
            return replace(ctx, pos, names::SPACE);
        }
        set_ttl(cell, life - 1);
        cell.color = Self::color(life - 1);
        Motion::LightGas.apply(ctx, pos);
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
