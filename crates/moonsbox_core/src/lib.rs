//! # MOONSBOX Core
//!
//! Simulation core of the MOONSBOX falling-sand sandbox.
//!
//! ## Design Principles
//!
//! 1. **Materials own physics**: the core stores cells and dispatches updates,
//!    it never decides how sand falls or gas rises
//! 2. **Out of range is not an error**: every coordinate query returns `Option`
//! 3. **Explicit state**: the material registry is passed to whoever needs it
//! 4. **All-or-nothing loads**: a save is fully decoded before it can replace
//!    the live grid
//!
//! ## Core Components
//!
//! - `Grid`: column-first storage of `MaterialData` records
//! - `raster`: fill, rectangle, ellipse and capped line drawing via factories
//! - `plugin`: versioned plugin host, material registry, `SimContext`
//!   capability object and per-tick dispatch
//! - `save`: binary save format (`dump` / `load`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use moonsbox_core::{raster, run_tick, save, DumpOptions, GridSize, PluginHost, Rect, SimRng};
//! use rand::SeedableRng;
//!
//! let mut host = PluginHost::new();
//! host.load(Box::new(MyMaterials))?;
//! let registry = host.registry();
//! let space = registry.id_of("Space").unwrap();
//! let sand = registry.id_of("Sand").unwrap();
//!
//! let mut rng = SimRng::seed_from_u64(0);
//! let mut grid = registry.new_grid(GridSize::new(100, 100), space, &mut rng)?;
//! raster::draw_rect(&mut grid, Rect::new(10, 10, 5, 5), registry.factory(sand, &mut rng)?);
//! run_tick(&mut grid, registry, &mut rng)?;
//!
//! let bytes = save::dump(&grid, registry, DumpOptions::default())?;
//! let restored = save::load(&bytes, registry)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cell;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod plugin;
pub mod raster;
pub mod save;

pub use cell::{AuxBlock, MaterialData, MaterialFlags, MaterialId, Rgba, AUX_CAPACITY};
pub use error::{AuxError, CoreError, CoreResult};
pub use geometry::{GridSize, Point, Rect};
pub use grid::Grid;
pub use plugin::{
    run_tick, update_cell, Material, MaterialEntry, MaterialRegistry, Neighbour, Plugin,
    PluginHost, PluginManifest, Registrar, SimContext, TickStats, Version, HOST_API_VERSION,
};
pub use raster::LineEnds;
pub use save::{dump, load, DumpOptions, SAVE_MAGIC, SAVE_VERSION};

/// Deterministic random generator handed to materials.
///
/// ChaCha8 keeps worlds reproducible: same seed, same inputs, same world.
pub type SimRng = rand_chacha::ChaCha8Rng;
