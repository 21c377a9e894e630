//! Plugin loader
//!
//! Locates a plugin's stylesheet and module by convention, builds an isolated
//! mount point for it and invokes the module's entry operation. The loader is
//! stateless: "load at most once" is enforced by the caller's mount record.
//!
//! Boot sequence for one mount:
//!
//! 1. arm a one-shot `plugin:hostReady` listener, publish `plugin:loading`
//! 2. wait for the host to acknowledge; the host arms its navigation
//!    listener before acknowledging, so registration can never be missed
//! 3. attach a shadow boundary to `#plugin-host-{id}` with a
//!    `#plugin-wrapper` container inside
//! 4. fetch the stylesheet and import the module concurrently
//! 5. only once both exist, adopt the stylesheet and call the entry

mod assets;
mod modules;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use panorama_plugin_api::{
    ENTRY_EXPORTS, MountContainer, PluginHandle, PluginModule, PluginStartupConfig,
};
use tokio::sync::oneshot;

pub use assets::{Asset, AssetSource, DirAssetSource, HttpAssetSource, MemoryAssetSource};
pub use modules::{ModuleResolver, StaticModuleRegistry};

use crate::dom::{Document, ShadowRoot, Stylesheet};
use crate::error::LoaderError;
use crate::events::{EventBus, HostReady, Loading, PluginRef};

/// Id of the container element inside every plugin boundary
pub const WRAPPER_ID: &str = "plugin-wrapper";

/// Id of the host element a plugin's boundary is attached to
pub fn mount_point_id(plugin_id: &str) -> String {
    format!("plugin-host-{plugin_id}")
}

/// Conventional asset locations for a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub style: String,
    pub module: String,
}

impl AssetPaths {
    pub const PREFIX: &'static str = "/plugins/";

    pub fn for_plugin(plugin_id: &str) -> Self {
        Self {
            style: format!("{}{plugin_id}/style.css", Self::PREFIX),
            module: format!("{}{plugin_id}/{plugin_id}.js", Self::PREFIX),
        }
    }
}

/// Loader timeouts
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Bound on fetching the stylesheet and importing the module
    pub load_timeout: Duration,
    /// Bound on waiting for the host's `plugin:hostReady`
    pub ready_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(30),
            ready_timeout: Duration::from_secs(1),
        }
    }
}

/// A plugin that has been mounted at least once
pub struct MountedPlugin {
    pub plugin_id: String,
    /// Export the entry was found under
    pub entry_name: &'static str,
    pub module: PluginModule,
    pub shadow: ShadowRoot,
    pub container: MountContainer,
    pub handle: Box<dyn PluginHandle>,
}

impl std::fmt::Debug for MountedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedPlugin")
            .field("plugin_id", &self.plugin_id)
            .field("entry_name", &self.entry_name)
            .field("module", &self.module)
            .field("mounted", &self.handle.is_mounted())
            .finish()
    }
}

/// Loads plugins into isolated mount points
#[derive(Clone)]
pub struct PluginLoader {
    assets: Arc<dyn AssetSource>,
    modules: Arc<dyn ModuleResolver>,
    config: LoaderConfig,
}

impl PluginLoader {
    pub fn new(
        assets: Arc<dyn AssetSource>,
        modules: Arc<dyn ModuleResolver>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            assets,
            modules,
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Mount a plugin for the first time
    ///
    /// `#plugin-host-{id}` must already exist in `document`.
    pub async fn load(
        &self,
        document: &Document,
        bus: &EventBus,
        plugin_id: &str,
        base_path: &str,
    ) -> Result<MountedPlugin, LoaderError> {
        let paths = AssetPaths::for_plugin(plugin_id);
        tracing::info!(plugin = %plugin_id, module = %paths.module, "Loading plugin");

        self.announce(bus, plugin_id).await?;

        let shadow = document.attach_shadow(&mount_point_id(plugin_id))?;
        let container = MountContainer::new(WRAPPER_ID);
        shadow.append_container(container.clone());

        let fetch = async {
            tokio::try_join!(self.assets.fetch(&paths.style), self.modules.import(&paths.module))
        };
        let (style, module) = tokio::time::timeout(self.config.load_timeout, fetch)
            .await
            .map_err(|_| LoaderError::Timeout {
                plugin_id: plugin_id.to_string(),
                timeout: self.config.load_timeout,
            })??;

        let (entry_name, _) = module.entry().ok_or_else(|| LoaderError::EntryMissing {
            specifier: module.specifier().to_string(),
            expected: ENTRY_EXPORTS.join(", "),
        })?;

        shadow.adopt_stylesheet(Stylesheet::new(&paths.style, style.text()));
        let handle = self.start(bus, &module, &container, plugin_id, base_path)?;

        tracing::info!(plugin = %plugin_id, entry = entry_name, "Plugin mounted");
        Ok(MountedPlugin {
            plugin_id: plugin_id.to_string(),
            entry_name,
            module,
            shadow,
            container,
            handle,
        })
    }

    /// Mount an already-imported plugin again after it was unloaded
    ///
    /// Reuses the retained module and boundary; nothing is fetched.
    pub async fn remount(
        &self,
        bus: &EventBus,
        plugin: &MountedPlugin,
        base_path: &str,
    ) -> Result<Box<dyn PluginHandle>, LoaderError> {
        tracing::info!(plugin = %plugin.plugin_id, "Remounting plugin");
        self.announce(bus, &plugin.plugin_id).await?;
        plugin.container.clear();
        self.start(bus, &plugin.module, &plugin.container, &plugin.plugin_id, base_path)
    }

    /// Publish LOADING and wait for the host to acknowledge it
    async fn announce(&self, bus: &EventBus, plugin_id: &str) -> Result<(), LoaderError> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let expected = plugin_id.to_string();
        let ready = bus.subscribe_once::<HostReady>(
            move |r| r.plugin_id == expected,
            move |_| {
                if let Some(tx) = tx.lock().unwrap_or_else(|e| e.into_inner()).take() {
                    let _ = tx.send(());
                }
            },
        );

        bus.emit::<Loading>(PluginRef::new(plugin_id));

        match tokio::time::timeout(self.config.ready_timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            _ => {
                ready.unsubscribe();
                tracing::warn!(plugin = %plugin_id, "Host did not acknowledge plugin:loading");
                Err(LoaderError::HostNotListening {
                    plugin_id: plugin_id.to_string(),
                    waited: self.config.ready_timeout,
                })
            }
        }
    }

    fn start(
        &self,
        bus: &EventBus,
        module: &PluginModule,
        container: &MountContainer,
        plugin_id: &str,
        base_path: &str,
    ) -> Result<Box<dyn PluginHandle>, LoaderError> {
        let (_, entry) = module.entry().ok_or_else(|| LoaderError::EntryMissing {
            specifier: module.specifier().to_string(),
            expected: ENTRY_EXPORTS.join(", "),
        })?;

        container.hand_over(plugin_id);
        let config = PluginStartupConfig::new(plugin_id, base_path);
        entry
            .start(container.clone(), config, bus.port())
            .map_err(|source| LoaderError::Start {
                plugin_id: plugin_id.to_string(),
                source,
            })
    }
}
