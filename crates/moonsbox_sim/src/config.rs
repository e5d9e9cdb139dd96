//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field is optional; missing
//! fields take the defaults below.
//!
//! ```toml
//! map_width = 160
//! map_height = 120
//! default_temp = 300.0
//! temp_exchange = true
//! drawing_width = 3
//! drawing_circular = true
//! drawing_destructive = false
//! default_material = "Space"
//! seed = 7
//! compress_saves = true
//! ```

use std::fs;
use std::path::Path;

use moonsbox_core::{GridSize, LineEnds};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Driver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Grid width in cells.
    pub map_width: i32,
    /// Grid height in cells.
    pub map_height: i32,
    /// Creation temperature of ambient materials, in kelvin.
    pub default_temp: f32,
    /// Whether cells exchange heat with their neighbours each tick.
    pub temp_exchange: bool,
    /// Interactive brush width in cells.
    pub drawing_width: i32,
    /// Round brush (ellipse dabs, round line caps) instead of square.
    pub drawing_circular: bool,
    /// Painting overwrites everything, not only space.
    pub drawing_destructive: bool,
    /// Material new, cleared and resized cells are filled with.
    pub default_material: String,
    /// Seed of the simulation's random generator.
    pub seed: u64,
    /// LZ4-compress save files.
    pub compress_saves: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: 100,
            map_height: 100,
            default_temp: moonsbox_materials::DEFAULT_TEMP,
            temp_exchange: true,
            drawing_width: 1,
            drawing_circular: true,
            drawing_destructive: false,
            default_material: moonsbox_materials::names::SPACE.to_owned(),
            seed: 0,
            compress_saves: true,
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] on syntax errors, unknown keys or
    /// values that fail [`Self::validate`].
    pub fn from_toml_str(source: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> SimResult<String> {
        toml::to_string(self).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] naming the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        if !self.map_size().is_valid() {
            return Err(SimError::Config(format!(
                "map size {}x{} must be positive",
                self.map_width, self.map_height
            )));
        }
        if !self.default_temp.is_finite() || self.default_temp < 0.0 {
            return Err(SimError::Config(format!(
                "default_temp {} must be a finite, non-negative kelvin value",
                self.default_temp
            )));
        }
        if self.drawing_width < 1 {
            return Err(SimError::Config(format!(
                "drawing_width {} must be at least 1",
                self.drawing_width
            )));
        }
        if self.default_material.is_empty() {
            return Err(SimError::Config("default_material must not be empty".into()));
        }
        Ok(())
    }

    /// Grid size as configured.
    #[must_use]
    pub const fn map_size(&self) -> GridSize {
        GridSize::new(self.map_width, self.map_height)
    }

    /// Line caps matching the brush shape.
    #[must_use]
    pub const fn line_ends(&self) -> LineEnds {
        if self.drawing_circular {
            LineEnds::Round
        } else {
            LineEnds::Square
        }
    }
}
