//! Module resolution for plugin executables

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use panorama_plugin_api::{PluginEntry, PluginModule};

use super::AssetPaths;
use crate::error::LoaderError;

/// Resolves a module specifier to an imported module
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn import(&self, specifier: &str) -> Result<PluginModule, LoaderError>;
}

/// Modules linked into the host at build time
///
/// Each module is registered under its conventional specifier
/// (`/plugins/{id}/{id}.js`), so the loader resolves it exactly as it would
/// resolve a module served over the network.
#[derive(Debug, Default)]
pub struct StaticModuleRegistry {
    modules: RwLock<HashMap<String, PluginModule>>,
    imports: Mutex<Vec<String>>,
}

impl StaticModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, module: PluginModule) {
        tracing::debug!(specifier = module.specifier(), "Module registered");
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(module.specifier().to_string(), module);
    }

    /// Register a plugin's entry under the conventional specifier
    pub fn register_plugin(&self, plugin_id: &str, export: &str, entry: Arc<dyn PluginEntry>) {
        let specifier = AssetPaths::for_plugin(plugin_id).module;
        self.register(PluginModule::new(specifier).with_export(export, entry));
    }

    pub fn with_plugin(self, plugin_id: &str, entry: Arc<dyn PluginEntry>) -> Self {
        self.register_plugin(plugin_id, "start", entry);
        self
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(specifier)
    }

    /// Every specifier imported so far, in order
    pub fn imports(&self) -> Vec<String> {
        self.imports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ModuleResolver for StaticModuleRegistry {
    async fn import(&self, specifier: &str) -> Result<PluginModule, LoaderError> {
        self.imports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(specifier.to_string());
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(specifier)
            .cloned()
            .ok_or_else(|| LoaderError::ModuleNotFound(specifier.to_string()))
    }
}
