//! Process-wide host context
//!
//! Built once at startup. Wires the bus, document, composer and shell
//! together and tears them down in [`HostContext::dispose`].

use std::sync::Arc;

use crate::config::PanoramaConfig;
use crate::dom::Document;
use crate::error::ShellError;
use crate::events::EventBus;
use crate::loader::{AssetSource, ModuleResolver, PluginLoader};
use crate::navigation::{Menu, MenuSink, NavigationComposer, SlotTable};
use crate::shell::{Route, Shell};

pub struct HostContext {
    config: PanoramaConfig,
    bus: EventBus,
    document: Document,
    composer: NavigationComposer,
    shell: Shell,
}

impl HostContext {
    pub fn new(
        config: PanoramaConfig,
        assets: Arc<dyn AssetSource>,
        modules: Arc<dyn ModuleResolver>,
    ) -> Self {
        let bus = EventBus::new();
        let document = Document::new();
        let slots = SlotTable::new(&config.plugins);

        let composer =
            NavigationComposer::attach(bus.clone(), slots.clone(), config.composer_config());
        let loader = PluginLoader::new(assets, modules, config.loader_config());
        let shell = Shell::new(
            bus.clone(),
            document.clone(),
            loader,
            slots,
            &config.shell.base_path,
            config.plugins.clone(),
        );

        tracing::info!(
            base_path = %config.shell.base_path,
            plugins = config.plugins.len(),
            "Host context initialized"
        );

        Self {
            config,
            bus,
            document,
            composer,
            shell,
        }
    }

    pub fn config(&self) -> &PanoramaConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn composer(&self) -> &NavigationComposer {
        &self.composer
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub async fn navigate(&self, path: &str) -> Result<Route, ShellError> {
        self.shell.navigate(path).await
    }

    pub fn menu(&self) -> Menu {
        self.composer.compose()
    }

    pub fn render(&self, sink: &mut dyn MenuSink) {
        sink.render(&self.menu());
    }

    /// Unload every plugin and detach all listeners
    pub fn dispose(&self) {
        self.shell.dispose();
        self.composer.dispose();
        self.bus.dispose();
        tracing::info!("Host context disposed");
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("bus", &self.bus)
            .field("shell", &self.shell)
            .finish()
    }
}
