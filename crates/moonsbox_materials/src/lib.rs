//! # MOONSBOX Materials
//!
//! The stock material pack, shipped as an ordinary plugin.
//!
//! ## Materials
//!
//! | Name | Phase | Behavior |
//! |------|-------|----------|
//! | Space | space | empty cell, painting it erases |
//! | Sand | bulk | falls; melts above 1973 K and sets as glass |
//! | Water | liquid | flows; freezes below 270 K, boils above 375 K |
//! | Ice | solid | melts above 275 K |
//! | Steam | gas | rises; condenses below 370 K |
//! | Unbreakable Wall | solid | inert |
//! | Lava | liquid | flows above 400 K, solid below |
//! | Black Hole | solid | deletes movable neighbours |
//! | Tap | solid | copies the first movable neighbour and emits it |
//! | Propane | gas | three phases, ignites above 700 K |
//! | Fire | gas | rises and burns out |
//! | Glass | solid | melts above 1773 K |
//! | Absorbent | float | soaks up liquids until spent |
//! | Aerogel | float | light insulator |
//! | Dry Ice | bulk | sublimates into heavy gas, then vanishes |
//!
//! Materials look each other up by name through the registry, so the pack
//! works no matter which ids it is given.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod common;
mod fluids;
mod powders;
mod solids;

use moonsbox_core::{CoreResult, Material, Plugin, PluginManifest, Registrar, Version, HOST_API_VERSION};

pub use fluids::{Fire, Ice, Lava, Propane, Steam, Water};
pub use powders::{Absorbent, Aerogel, DryIce, Sand};
pub use solids::{BlackHole, Glass, Space, Tap, UnbreakableWall};

/// Registered material names.
pub mod names {
    /// Empty cell.
    pub const SPACE: &str = "Space";
    /// Falling sand.
    pub const SAND: &str = "Sand";
    /// Liquid water.
    pub const WATER: &str = "Water";
    /// Frozen water.
    pub const ICE: &str = "Ice";
    /// Water vapour.
    pub const STEAM: &str = "Steam";
    /// Inert wall.
    pub const UNBREAKABLE_WALL: &str = "Unbreakable Wall";
    /// Molten rock.
    pub const LAVA: &str = "Lava";
    /// Deletes movable neighbours.
    pub const BLACK_HOLE: &str = "Black Hole";
    /// Emits whatever touched it first.
    pub const TAP: &str = "Tap";
    /// Flammable gas.
    pub const PROPANE: &str = "Propane";
    /// Flame.
    pub const FIRE: &str = "Fire";
    /// Glass.
    pub const GLASS: &str = "Glass";
    /// Liquid sponge.
    pub const ABSORBENT: &str = "Absorbent";
    /// Light insulator.
    pub const AEROGEL: &str = "Aerogel";
    /// Frozen CO2.
    pub const DRY_ICE: &str = "Dry Ice";
}

/// Temperature fresh cells start at unless a material has its own.
pub const DEFAULT_TEMP: f32 = 300.0;

/// Plugin name of the stock pack.
pub const PLUGIN_NAME: &str = "builtin";

/// Version every stock material is registered with.
pub const MATERIAL_VERSION: Version = Version::new(1, 0);

/// The stock material pack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuiltinMaterials {
    ambient: f32,
}

impl BuiltinMaterials {
    /// Pack whose materials start at [`DEFAULT_TEMP`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_default_temp(DEFAULT_TEMP)
    }

    /// Pack whose materials start at `ambient` kelvin.
    ///
    /// Materials with a fixed creation temperature (ice, lava, ...) ignore
    /// it.
    #[must_use]
    pub const fn with_default_temp(ambient: f32) -> Self {
        Self { ambient }
    }

    /// Creation temperature for ambient-temperature materials.
    #[must_use]
    pub const fn ambient(&self) -> f32 {
        self.ambient
    }

    fn materials(&self) -> Vec<(&'static str, Box<dyn Material>)> {
        let ambient = self.ambient;
        vec![
            (names::SPACE, Box::new(Space { ambient })),
            (names::SAND, Box::new(Sand { ambient })),
            (names::WATER, Box::new(Water { ambient })),
            (names::ICE, Box::new(Ice)),
            (names::STEAM, Box::new(Steam)),
            (names::UNBREAKABLE_WALL, Box::new(UnbreakableWall { ambient })),
            (names::LAVA, Box::new(Lava)),
            (names::BLACK_HOLE, Box::new(BlackHole { ambient })),
            (names::TAP, Box::new(Tap { ambient })),
            (names::PROPANE, Box::new(Propane { ambient })),
            (names::FIRE, Box::new(Fire)),
            (names::GLASS, Box::new(Glass { ambient })),
            (names::ABSORBENT, Box::new(Absorbent { ambient })),
            (names::AEROGEL, Box::new(Aerogel { ambient })),
            (names::DRY_ICE, Box::new(DryIce)),
        ]
    }
}

impl Default for BuiltinMaterials {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for BuiltinMaterials {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: PLUGIN_NAME.to_owned(),
            api_version: HOST_API_VERSION,
            version: Version::new(1, 0),
        }
    }

    fn init(&mut self, registrar: &mut Registrar<'_>) -> CoreResult<()> {
        let materials = self.materials();
        let count = materials.len();
        for (name, material) in materials {
            registrar.register_material(name, MATERIAL_VERSION, material)?;
        }
        tracing::debug!(count, ambient = self.ambient, "stock materials staged");
        Ok(())
    }
}
