//! # Plugin Boundary
//!
//! Materials are registered by plugins and looked up by id at dispatch
//! time. Built-in and third-party materials go through the same path.
//!
//! ## Lifecycle
//!
//! ```text
//! PluginHost::load(plugin)
//!     -> manifest().api_version checked against HOST_API_VERSION
//!     -> init(&mut Registrar)        materials staged
//!     -> commit                      ids assigned, registry extended
//! run_tick / update_cell
//!     -> registry.entry(cell.material).update(&mut SimContext, pos)
//! PluginHost::unload_all / drop
//!     -> exit() in reverse load order
//! ```
//!
//! ## Capabilities
//!
//! A material never sees the grid directly. [`SimContext`] offers reads,
//! writes, neighbourhood queries, spawning, the movement utilities and a
//! deterministic random generator.

mod api;
mod context;
mod dispatch;
mod host;
mod movement;
mod registry;

pub use api::{Material, Plugin, PluginManifest, Version, HOST_API_VERSION};
pub use context::{Neighbour, SimContext};
pub use dispatch::{run_tick, update_cell, TickStats};
pub use host::PluginHost;
pub use registry::{MaterialEntry, MaterialRegistry, Registrar};
