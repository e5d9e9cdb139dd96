//! Traits and version types a plugin implements against.

use std::fmt;

use crate::cell::{AuxBlock, MaterialData, MaterialId};
use crate::error::{AuxError, CoreResult};
use crate::geometry::Point;
use crate::SimRng;

use super::context::SimContext;
use super::registry::{MaterialRegistry, Registrar};

/// A `(major, minor)` version pair.
///
/// Used for the plugin API, for plugin releases and for individual
/// materials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    /// Incompatible changes.
    pub major: u8,
    /// Backwards compatible additions.
    pub minor: u8,
}

impl Version {
    /// Creates a version.
    #[inline]
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Returns true if something built against `self` runs on `host`.
    ///
    /// Majors must match and the host must provide at least `self.minor`.
    #[inline]
    #[must_use]
    pub const fn is_compatible_with(self, host: Self) -> bool {
        self.major == host.major && self.minor <= host.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version of the plugin API this host implements.
pub const HOST_API_VERSION: Version = Version::new(1, 0);

/// What a plugin declares about itself before it is initialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginManifest {
    /// Display name, unique per host.
    pub name: String,
    /// Plugin API version the plugin was built against.
    pub api_version: Version,
    /// The plugin's own release version.
    pub version: Version,
}

/// A loadable bundle of materials.
///
/// The host reads the manifest, checks the API version, then calls `init`
/// exactly once. `exit` runs once when the host unloads the plugin.
pub trait Plugin {
    /// Static description of the plugin.
    fn manifest(&self) -> PluginManifest;

    /// Registers the plugin's materials.
    ///
    /// # Errors
    ///
    /// Any error rejects the whole plugin; none of its materials are kept.
    fn init(&mut self, registrar: &mut Registrar<'_>) -> CoreResult<()>;

    /// Called once on unload.
    fn exit(&mut self) {}
}

/// Behavior of one registered material.
///
/// Cells only store a [`MaterialId`]; the dispatcher looks the material up
/// in the registry each time it needs it.
pub trait Material: Send + Sync {
    /// Builds a fresh cell of this material.
    ///
    /// `id` is the id the registry assigned to this material.
    fn create(&self, id: MaterialId, rng: &mut SimRng) -> MaterialData;

    /// Advances the cell at `pos` by one tick.
    ///
    /// The update may touch any cell reachable through `ctx`, not only its
    /// own.
    ///
    /// # Errors
    ///
    /// Errors abort the tick in progress.
    fn update(&self, ctx: &mut SimContext<'_>, pos: Point) -> CoreResult<()> {
        let _ = (ctx, pos);
        Ok(())
    }

    /// Number of bytes `serialize_aux` writes for `cell`.
    fn aux_size(&self, cell: &MaterialData, registry: &MaterialRegistry) -> usize {
        let _ = (cell, registry);
        0
    }

    /// Writes the persistent form of `cell.aux` into `out`.
    ///
    /// `out` is exactly `aux_size` bytes long.
    fn serialize_aux(&self, cell: &MaterialData, registry: &MaterialRegistry, out: &mut [u8]) {
        let _ = (cell, registry, out);
    }

    /// Rebuilds an aux block from bytes written by `serialize_aux`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuxError`] if the payload is not something this
    /// material writes. The default accepts only an empty payload.
    fn deserialize_aux(&self, bytes: &[u8], registry: &MaterialRegistry) -> Result<AuxBlock, AuxError> {
        let _ = registry;
        if bytes.is_empty() {
            Ok(AuxBlock::EMPTY)
        } else {
            Err(AuxError::bad_length(0, bytes.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_compatibility() {
        let host = Version::new(1, 2);
        assert!(Version::new(1, 0).is_compatible_with(host));
        assert!(Version::new(1, 2).is_compatible_with(host));
        assert!(!Version::new(1, 3).is_compatible_with(host));
        assert!(!Version::new(2, 0).is_compatible_with(host));
        assert!(!Version::new(0, 9).is_compatible_with(host));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(HOST_API_VERSION.to_string(), "1.0");
    }
}
