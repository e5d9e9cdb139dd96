//! Plugin loading and unloading.

use crate::cell::MaterialId;
use crate::error::{CoreError, CoreResult};

use super::api::{Plugin, PluginManifest, HOST_API_VERSION};
use super::registry::{MaterialRegistry, Registrar};

struct LoadedPlugin {
    manifest: PluginManifest,
    plugin: Box<dyn Plugin>,
    materials: Vec<MaterialId>,
}

/// Owns the loaded plugins and the material registry they populate.
///
/// Plugins are unloaded in reverse load order, either explicitly through
/// [`PluginHost::unload_all`] or when the host is dropped. Materials stay
/// registered after unload so existing grids remain resolvable.
#[derive(Default)]
pub struct PluginHost {
    registry: MaterialRegistry,
    plugins: Vec<LoadedPlugin>,
}

impl PluginHost {
    /// Creates a host with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The material registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    /// Checks a plugin's API version, then initializes it.
    ///
    /// Returns the ids of the materials the plugin registered. A rejected
    /// plugin is dropped without its `exit` hook running and the host is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`CoreError::VersionMismatch`] if the plugin targets an API this
    ///   host does not provide.
    /// - Whatever the plugin's `init` returned.
    pub fn load(&mut self, mut plugin: Box<dyn Plugin>) -> CoreResult<Vec<MaterialId>> {
        let manifest = plugin.manifest();

        if !manifest.api_version.is_compatible_with(HOST_API_VERSION) {
            tracing::warn!(
                plugin = %manifest.name,
                api = %manifest.api_version,
                host_api = %HOST_API_VERSION,
                "plugin rejected: incompatible api version"
            );
            return Err(CoreError::VersionMismatch {
                subject: format!("plugin '{}' api", manifest.name),
                found: manifest.api_version.to_string(),
                supported: format!("{}.0..={HOST_API_VERSION}", HOST_API_VERSION.major),
            });
        }

        let mut registrar = Registrar::new(&mut self.registry, &manifest.name);
        if let Err(err) = plugin.init(&mut registrar) {
            tracing::warn!(plugin = %manifest.name, error = %err, "plugin init failed");
            return Err(err);
        }
        let materials = registrar.commit();

        tracing::info!(
            plugin = %manifest.name,
            version = %manifest.version,
            materials = materials.len(),
            "plugin loaded"
        );
        self.plugins.push(LoadedPlugin {
            manifest,
            plugin,
            materials: materials.clone(),
        });
        Ok(materials)
    }

    /// Manifests of the loaded plugins, in load order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginManifest> {
        self.plugins.iter().map(|p| &p.manifest)
    }

    /// Materials registered by the plugin called `name`.
    #[must_use]
    pub fn materials_of(&self, name: &str) -> Option<&[MaterialId]> {
        self.plugins
            .iter()
            .find(|p| p.manifest.name == name)
            .map(|p| p.materials.as_slice())
    }

    /// Runs every plugin's `exit` hook, last loaded first.
    ///
    /// Calling it again is a no-op.
    pub fn unload_all(&mut self) {
        while let Some(mut loaded) = self.plugins.pop() {
            loaded.plugin.exit();
            tracing::info!(plugin = %loaded.manifest.name, "plugin unloaded");
        }
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.unload_all();
    }
}
