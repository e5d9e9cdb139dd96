//! # MOONSBOX Sim
//!
//! Drives a world: configuration, heat exchange, the tick loop, painting
//! and save files.
//!
//! ## Tick Order
//!
//! Column by column, bottom to top. Each cell exchanges heat with its
//! von Neumann neighbours (if enabled) immediately before its material's
//! update runs, so both see the results of every cell visited earlier in
//! the same tick.
//!
//! ## Example
//!
//! ```rust,ignore
//! use moonsbox_sim::{Brush, Point, SimConfig, Simulation};
//!
//! let config = SimConfig::from_file("moonsbox.toml")?;
//! let mut sim = Simulation::with_builtin(config)?;
//! let sand = sim.material_id("Sand").unwrap();
//!
//! sim.stroke(Point::new(10, 90), Point::new(90, 90), Brush::Material(sand))?;
//! for _ in 0..60 {
//!     sim.tick()?;
//! }
//! sim.save_to_file("world.sav")?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod brush;
pub mod config;
pub mod error;
pub mod render;
pub mod simulation;
pub mod thermal;

pub use brush::{Brush, Shape, HEAT_STEP};
pub use config::SimConfig;
pub use error::{SimError, SimResult};
pub use render::{thermal_color, RenderMode};
pub use simulation::Simulation;

pub use moonsbox_core::{GridSize, LineEnds, Point, Rect};
