//! Material registry and the registration handle given to plugins.

use std::collections::HashMap;
use std::fmt;

use crate::cell::{MaterialData, MaterialId};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{GridSize, Point};
use crate::grid::Grid;
use crate::SimRng;

use super::api::{Material, Version};

/// One registered material.
pub struct MaterialEntry {
    id: MaterialId,
    name: String,
    version: Version,
    plugin: String,
    material: Box<dyn Material>,
}

impl MaterialEntry {
    /// Assigned id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> MaterialId {
        self.id
    }

    /// Registered name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Material version, stored in saves.
    #[inline]
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Name of the plugin that registered the material.
    #[inline]
    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The material's behavior.
    #[inline]
    #[must_use]
    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }
}

impl fmt::Debug for MaterialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

/// Every material known to the host.
///
/// Ids are handed out from 1 in registration order and never reused. The
/// registry is append-only: entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    entries: Vec<MaterialEntry>,
    by_name: HashMap<String, MaterialId>,
}

impl MaterialRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered materials.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a material up by id.
    #[must_use]
    pub fn get(&self, id: MaterialId) -> Option<&MaterialEntry> {
        if id.is_null() {
            return None;
        }
        self.entries.get(id.0 as usize - 1)
    }

    /// Looks a material up by id, failing with `UnknownMaterial`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownMaterial`] for unregistered ids, the null
    /// id included.
    pub fn entry(&self, id: MaterialId) -> CoreResult<&MaterialEntry> {
        self.get(id).ok_or_else(|| CoreError::unknown_id(id.0))
    }

    /// Id registered under `name`.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.entries.iter()
    }

    /// Builds a fresh cell of material `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownMaterial`] for unregistered ids.
    pub fn create(&self, id: MaterialId, rng: &mut SimRng) -> CoreResult<MaterialData> {
        Ok(self.entry(id)?.material.create(id, rng))
    }

    /// A paint factory that installs fresh cells of material `id`.
    ///
    /// The result plugs into every rasterizer in [`crate::raster`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownMaterial`] for unregistered ids.
    pub fn factory<'a>(
        &'a self,
        id: MaterialId,
        rng: &'a mut SimRng,
    ) -> CoreResult<impl FnMut(&mut Grid, Point) + 'a> {
        let material = self.entry(id)?.material();
        Ok(move |grid: &mut Grid, pos: Point| {
            grid.set(pos, material.create(id, rng));
        })
    }

    /// Creates a grid filled with fresh cells of material `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownMaterial`] for unregistered ids and
    /// [`CoreError::InvalidSize`] for degenerate sizes.
    pub fn new_grid(&self, size: GridSize, id: MaterialId, rng: &mut SimRng) -> CoreResult<Grid> {
        Grid::new(size, self.factory(id, rng)?)
    }

    fn check_name(&self, name: &str) -> CoreResult<()> {
        if self.by_name.contains_key(name) {
            return Err(CoreError::DuplicateMaterial(name.to_owned()));
        }
        Ok(())
    }

    fn push(&mut self, staged: StagedMaterial, plugin: &str) -> MaterialId {
        let id = MaterialId(self.entries.len() as u32 + 1);
        tracing::debug!(
            id = id.0,
            name = %staged.name,
            version = %staged.version,
            plugin,
            "material registered"
        );
        self.by_name.insert(staged.name.clone(), id);
        self.entries.push(MaterialEntry {
            id,
            name: staged.name,
            version: staged.version,
            plugin: plugin.to_owned(),
            material: staged.material,
        });
        id
    }
}

struct StagedMaterial {
    name: String,
    version: Version,
    material: Box<dyn Material>,
}

/// Registration handle passed to [`super::Plugin::init`].
///
/// Materials are staged and only committed to the registry once `init`
/// returns successfully, so a failing plugin leaves no trace.
pub struct Registrar<'a> {
    registry: &'a mut MaterialRegistry,
    plugin: String,
    staged: Vec<StagedMaterial>,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(registry: &'a mut MaterialRegistry, plugin: &str) -> Self {
        Self {
            registry,
            plugin: plugin.to_owned(),
            staged: Vec::new(),
        }
    }

    /// Registers a material and returns the id it will be known by.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateMaterial`] if `name` is already taken,
    /// by an earlier plugin or by this one.
    pub fn register_material(
        &mut self,
        name: &str,
        version: Version,
        material: Box<dyn Material>,
    ) -> CoreResult<MaterialId> {
        self.registry.check_name(name)?;
        if self.staged.iter().any(|s| s.name == name) {
            return Err(CoreError::DuplicateMaterial(name.to_owned()));
        }
        self.staged.push(StagedMaterial {
            name: name.to_owned(),
            version,
            material,
        });
        Ok(MaterialId((self.registry.len() + self.staged.len()) as u32))
    }

    /// Materials registered by earlier plugins.
    #[must_use]
    pub fn registry(&self) -> &MaterialRegistry {
        self.registry
    }

    pub(crate) fn commit(self) -> Vec<MaterialId> {
        let Self {
            registry,
            plugin,
            staged,
        } = self;
        staged
            .into_iter()
            .map(|material| registry.push(material, &plugin))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{MaterialFlags, Rgba};
    use rand::SeedableRng;

    struct Plain(MaterialFlags);

    impl Material for Plain {
        fn create(&self, id: MaterialId, _rng: &mut SimRng) -> MaterialData {
            MaterialData::new(id, self.0, Rgba::rgb(1, 2, 3), 300.0, 0.5, 0.5)
        }
    }

    fn registry_with(names: &[&str]) -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        let mut registrar = Registrar::new(&mut registry, "test");
        for name in names {
            registrar
                .register_material(name, Version::new(1, 0), Box::new(Plain(MaterialFlags::SPACE)))
                .unwrap();
        }
        registrar.commit();
        registry
    }

    #[test]
    fn test_ids_start_at_one() {
        let registry = registry_with(&["Space", "Sand"]);
        assert_eq!(registry.id_of("Space"), Some(MaterialId(1)));
        assert_eq!(registry.id_of("Sand"), Some(MaterialId(2)));
        assert_eq!(registry.entry(MaterialId(2)).unwrap().name(), "Sand");
        assert!(registry.get(MaterialId::NULL).is_none());
        assert!(registry.get(MaterialId(3)).is_none());
    }

    #[test]
    fn test_registrar_predicts_ids() {
        let mut registry = registry_with(&["Space"]);
        let mut registrar = Registrar::new(&mut registry, "more");
        let id = registrar
            .register_material("Water", Version::new(1, 0), Box::new(Plain(MaterialFlags::LIQUID)))
            .unwrap();
        assert_eq!(registrar.commit(), vec![id]);
        assert_eq!(registry.id_of("Water"), Some(id));
        assert_eq!(registry.entry(id).unwrap().plugin(), "more");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = registry_with(&["Space"]);
        let mut registrar = Registrar::new(&mut registry, "dup");
        let err = registrar
            .register_material("Space", Version::new(1, 0), Box::new(Plain(MaterialFlags::SPACE)))
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateMaterial("Space".into()));

        registrar
            .register_material("Fog", Version::new(1, 0), Box::new(Plain(MaterialFlags::GAS)))
            .unwrap();
        assert!(registrar
            .register_material("Fog", Version::new(1, 0), Box::new(Plain(MaterialFlags::GAS)))
            .is_err());
    }

    #[test]
    fn test_unknown_id_errors() {
        let registry = registry_with(&["Space"]);
        let mut rng = SimRng::seed_from_u64(1);
        assert_eq!(
            registry.create(MaterialId(9), &mut rng).unwrap_err(),
            CoreError::unknown_id(9)
        );
        assert!(registry.factory(MaterialId::NULL, &mut rng).is_err());
    }

    #[test]
    fn test_new_grid_uses_material() {
        let registry = registry_with(&["Space"]);
        let mut rng = SimRng::seed_from_u64(1);
        let grid = registry
            .new_grid(GridSize::new(3, 2), MaterialId(1), &mut rng)
            .unwrap();
        assert!(grid.cells().iter().all(|c| c.material == MaterialId(1)));
        assert_eq!(grid.cells().len(), 6);
    }
}
