//! # Simulation Driver
//!
//! Owns the live grid, the plugin host and the random generator, and is
//! the only thing that mutates the world between ticks.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use moonsbox_core::{
    raster, save, update_cell, DumpOptions, Grid, GridSize, MaterialId, MaterialRegistry, Plugin,
    PluginHost, Point, Rect, SimContext, SimRng, TickStats,
};
use moonsbox_materials::BuiltinMaterials;
use rand::SeedableRng;

use crate::brush::{self, Brush, Shape};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::render::{self, RenderMode};
use crate::thermal;

/// A running world.
pub struct Simulation {
    config: SimConfig,
    host: PluginHost,
    grid: Grid,
    rng: SimRng,
    default_material: MaterialId,
    ticks: u64,
}

impl Simulation {
    /// Loads `plugins` in order and creates a grid filled with the
    /// configured default material.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] if `config` fails validation
    /// - [`SimError::Core`] if a plugin is rejected or the default material
    ///   is not registered by any of them
    pub fn new(config: SimConfig, plugins: Vec<Box<dyn Plugin>>) -> SimResult<Self> {
        config.validate()?;

        let mut host = PluginHost::new();
        for plugin in plugins {
            host.load(plugin)?;
        }

        let default_material = host
            .registry()
            .id_of(&config.default_material)
            .ok_or_else(|| moonsbox_core::CoreError::unknown_name(&config.default_material))?;
        let mut rng = SimRng::seed_from_u64(config.seed);
        let grid = host
            .registry()
            .new_grid(config.map_size(), default_material, &mut rng)?;

        tracing::info!(
            width = config.map_width,
            height = config.map_height,
            materials = host.registry().len(),
            seed = config.seed,
            "simulation created"
        );

        Ok(Self {
            config,
            host,
            grid,
            rng,
            default_material,
            ticks: 0,
        })
    }

    /// A simulation running only the stock materials, created at the
    /// configured default temperature.
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn with_builtin(config: SimConfig) -> SimResult<Self> {
        let builtin = BuiltinMaterials::with_default_temp(config.default_temp);
        Self::new(config, vec![Box::new(builtin)])
    }

    /// Advances the world by one tick.
    ///
    /// Cells are visited column by column, bottom to top. Each cell first
    /// exchanges heat with its neighbours (when enabled), then runs its
    /// material's update.
    ///
    /// # Errors
    ///
    /// Stops at the first failing update; cells already visited keep their
    /// new state.
    pub fn tick(&mut self) -> SimResult<TickStats> {
        let size = self.grid.size();
        let temp_exchange = self.config.temp_exchange;
        let mut ctx = SimContext::new(&mut self.grid, self.host.registry(), &mut self.rng);
        let mut stats = TickStats::default();

        for x in 0..size.width {
            for y in 0..size.height {
                let pos = Point::new(x, y);
                if temp_exchange {
                    thermal::exchange(&mut ctx, pos);
                }
                if update_cell(&mut ctx, pos)? {
                    stats.cells += 1;
                }
            }
        }

        self.ticks += 1;
        tracing::trace!(tick = self.ticks, cells = stats.cells, "tick complete");
        Ok(stats)
    }

    /// Paints `shape` with `brush`, honouring the destructive-drawing
    /// setting. Returns how many cells changed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] if the brush material is not registered.
    pub fn paint(&mut self, shape: Shape, brush: Brush) -> SimResult<usize> {
        let changed = brush::paint(
            &mut self.grid,
            self.host.registry(),
            &mut self.rng,
            shape,
            brush,
            self.config.drawing_destructive,
        )?;
        Ok(changed)
    }

    /// A single brush dab of the configured width and shape centered on
    /// `center`.
    ///
    /// # Errors
    ///
    /// As [`Self::paint`].
    pub fn dab(&mut self, center: Point, brush: Brush) -> SimResult<usize> {
        let width = self.config.drawing_width;
        let rect = Rect::centered(center, width, width);
        let shape = if self.config.drawing_circular {
            Shape::Ellipse(rect)
        } else {
            Shape::Rect(rect)
        };
        self.paint(shape, brush)
    }

    /// A brush stroke of the configured width and caps from `from` to `to`.
    ///
    /// # Errors
    ///
    /// As [`Self::paint`].
    pub fn stroke(&mut self, from: Point, to: Point, brush: Brush) -> SimResult<usize> {
        let shape = Shape::Line {
            start: from,
            end: to,
            width: self.config.drawing_width,
            ends: self.config.line_ends(),
        };
        self.paint(shape, brush)
    }

    /// Current interactive brush width.
    #[must_use]
    pub fn drawing_width(&self) -> i32 {
        self.config.drawing_width
    }

    /// Sets the interactive brush width, at least 1.
    pub fn set_drawing_width(&mut self, width: i32) {
        self.config.drawing_width = width.max(1);
    }

    /// Resizes the grid. The overlapping region is kept, new cells get the
    /// default material.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] for non-positive sizes; the grid is left
    /// unchanged.
    pub fn resize(&mut self, size: GridSize) -> SimResult<()> {
        let factory = self.host.registry().factory(self.default_material, &mut self.rng)?;
        self.grid.resize(size, factory)?;
        self.config.map_width = size.width;
        self.config.map_height = size.height;
        Ok(())
    }

    /// Refills every cell with fresh default material.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] if the default material is no longer
    /// registered.
    pub fn clear(&mut self) -> SimResult<()> {
        let factory = self.host.registry().factory(self.default_material, &mut self.rng)?;
        raster::fill(&mut self.grid, factory);
        tracing::debug!("grid cleared");
        Ok(())
    }

    /// Serializes the world.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] if a cell references an unregistered
    /// material.
    pub fn save(&self) -> SimResult<Vec<u8>> {
        let options = DumpOptions {
            compress: self.config.compress_saves,
        };
        Ok(save::dump(&self.grid, self.host.registry(), options)?)
    }

    /// Replaces the world with a decoded save.
    ///
    /// The live grid is only swapped once the whole blob decoded; on error
    /// it is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Core`] with the decode failure.
    pub fn load(&mut self, bytes: &[u8]) -> SimResult<()> {
        let grid = save::load(bytes, self.host.registry())?;
        let size = grid.size();
        self.grid = grid;
        self.config.map_width = size.width;
        self.config.map_height = size.height;
        Ok(())
    }

    /// Writes [`Self::save`] to `path`.
    ///
    /// The blob goes to a sibling temporary file first and is renamed into
    /// place, so an interrupted write never truncates an existing save.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] on file errors, otherwise as [`Self::save`].
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        let bytes = self.save()?;
        let tmp = temp_path(path);

        let mut file = File::create(&tmp).map_err(|e| SimError::io(&tmp, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| SimError::io(&tmp, e))?;
        drop(file);
        fs::rename(&tmp, path).map_err(|e| SimError::io(path, e))?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "world saved");
        Ok(())
    }

    /// Reads a save file and [`Self::load`]s it.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] on file errors, otherwise as [`Self::load`].
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| SimError::io(path, e))?;
        self.load(&bytes)?;
        tracing::info!(path = %path.display(), "world loaded");
        Ok(())
    }

    /// Runs every plugin's exit hook. Idempotent; also runs on drop.
    pub fn unload(&mut self) {
        self.host.unload_all();
    }

    /// A packed RGBA8 frame of the world, top row first.
    #[must_use]
    pub fn frame(&self, mode: RenderMode) -> Vec<u8> {
        render::frame(&self.grid, mode)
    }

    /// The live grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct access to the live grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Registered materials.
    #[must_use]
    pub fn registry(&self) -> &MaterialRegistry {
        self.host.registry()
    }

    /// Id registered under `name`.
    #[must_use]
    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.host.registry().id_of(name)
    }

    /// Material new and cleared cells are filled with.
    #[must_use]
    pub fn default_material(&self) -> MaterialId {
        self.default_material
    }

    /// The active configuration, including runtime changes to map size and
    /// brush width.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks run since creation.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.unload();
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
