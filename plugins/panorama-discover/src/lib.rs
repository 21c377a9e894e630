//! panorama-discover - sample plugin for the panorama host
//!
//! Renders a small catalogue UI into its mount container, registers its
//! navigation tree with the host and follows navigation requests addressed
//! to it. Every mount is an independent instance; nothing is global.

pub mod router;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use panorama_plugin_api::signal::{InitNavigation, Navigate, Unload};
use panorama_plugin_api::{
    ListenerId, MountContainer, PluginEntry, PluginError, PluginHandle, PluginModule,
    PluginNavigate, PluginNavigationInit, PluginStartupConfig, SignalKind, SignalPort,
    SignalPortExt,
};

pub use router::{DiscoverRoute, TITLE_ID, navigation};

/// Identifier the host knows this plugin by
pub const PLUGIN_ID: &str = "discover";

/// The plugin's entry operation
#[derive(Debug, Default, Clone, Copy)]
pub struct Discover;

impl Discover {
    /// Module as published under `/plugins/discover/discover.js`
    pub fn module() -> PluginModule {
        PluginModule::new(format!("/plugins/{PLUGIN_ID}/{PLUGIN_ID}.js"))
            .with_export("start", Arc::new(Discover))
    }
}

impl PluginEntry for Discover {
    fn start(
        &self,
        container: MountContainer,
        config: PluginStartupConfig,
        bus: Arc<dyn SignalPort>,
    ) -> Result<Box<dyn PluginHandle>, PluginError> {
        if config.plugin_id.is_empty() {
            return Err(PluginError::config("plugin id is empty"));
        }

        let instance = Arc::new(Instance {
            config,
            container,
            bus: bus.clone(),
            route: Mutex::new(DiscoverRoute::Home),
            mounted: AtomicBool::new(true),
            listeners: Mutex::new(Vec::new()),
        });
        instance.render();

        let weak = Arc::downgrade(&instance);
        let on_navigate = bus.on::<Navigate>(move |nav| {
            if let Some(instance) = Weak::upgrade(&weak) {
                instance.handle_navigate(nav);
            }
        });

        let weak = Arc::downgrade(&instance);
        let on_unload = bus.on::<Unload>(move |r| {
            if let Some(instance) = Weak::upgrade(&weak)
                && r.plugin_id == instance.config.plugin_id
            {
                instance.teardown();
            }
        });

        instance.lock_listeners().extend([
            (SignalKind::Navigate, on_navigate),
            (SignalKind::Unload, on_unload),
        ]);

        tracing::info!(
            plugin = %instance.config.plugin_id,
            basename = %instance.config.basename,
            "Discover mounted"
        );

        bus.emit::<InitNavigation>(PluginNavigationInit {
            plugin_id: instance.config.plugin_id.clone(),
            items: navigation(),
        });

        Ok(Box::new(DiscoverHandle { instance }))
    }
}

struct Instance {
    config: PluginStartupConfig,
    container: MountContainer,
    bus: Arc<dyn SignalPort>,
    route: Mutex<DiscoverRoute>,
    mounted: AtomicBool,
    listeners: Mutex<Vec<(SignalKind, ListenerId)>>,
}

impl Instance {
    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SignalKind, ListenerId)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current(&self) -> DiscoverRoute {
        self.route.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn render(&self) {
        let route = self.current();
        self.container.render(route.render(&self.config));
    }

    fn handle_navigate(&self, nav: &PluginNavigate) {
        // stale or addressed to someone else
        if !self.mounted.load(Ordering::SeqCst) || !nav.is_addressed_to(&self.config.plugin_id) {
            return;
        }

        let route = DiscoverRoute::resolve(&nav.to);
        tracing::debug!(plugin = %self.config.plugin_id, to = %nav.to, route = ?route, "Navigating");
        *self.route.lock().unwrap_or_else(|e| e.into_inner()) = route;
        self.render();
    }

    fn teardown(&self) {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        let listeners: Vec<_> = self.lock_listeners().drain(..).collect();
        for (kind, id) in listeners {
            self.bus.unlisten(kind, id);
        }
        self.container.clear();
        tracing::info!(plugin = %self.config.plugin_id, "Discover unmounted");
    }
}

/// Handle to one mounted discover instance
pub struct DiscoverHandle {
    instance: Arc<Instance>,
}

impl DiscoverHandle {
    pub fn route(&self) -> DiscoverRoute {
        self.instance.current()
    }
}

impl PluginHandle for DiscoverHandle {
    fn plugin_id(&self) -> &str {
        &self.instance.config.plugin_id
    }

    fn unmount(&self) {
        self.instance.teardown();
    }

    fn is_mounted(&self) -> bool {
        self.instance.mounted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use panorama_plugin_api::{Listener, PluginDescriptor, PluginRef, Signal};

    use super::*;

    /// Minimal synchronous port for exercising the plugin in isolation
    #[derive(Default)]
    struct TestPort {
        listeners: Mutex<BTreeMap<SignalKind, Vec<(ListenerId, Listener)>>>,
        published: Mutex<Vec<Signal>>,
        next: Mutex<u64>,
    }

    impl SignalPort for TestPort {
        fn publish(&self, signal: Signal) -> usize {
            self.published.lock().unwrap().push(signal.clone());
            let targets: Vec<Listener> = self
                .listeners
                .lock()
                .unwrap()
                .get(&signal.kind())
                .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
                .unwrap_or_default();
            for target in &targets {
                target(&signal);
            }
            targets.len()
        }

        fn listen(&self, kind: SignalKind, listener: Listener) -> ListenerId {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let id = ListenerId(*next);
            self.listeners.lock().unwrap().entry(kind).or_default().push((id, listener));
            id
        }

        fn unlisten(&self, kind: SignalKind, id: ListenerId) -> bool {
            let mut listeners = self.listeners.lock().unwrap();
            let Some(list) = listeners.get_mut(&kind) else {
                return false;
            };
            let before = list.len();
            list.retain(|(l, _)| *l != id);
            before != list.len()
        }
    }

    impl TestPort {
        fn count(&self, kind: SignalKind) -> usize {
            self.listeners.lock().unwrap().get(&kind).map_or(0, Vec::len)
        }
    }

    fn mount() -> (Arc<TestPort>, MountContainer, Box<dyn PluginHandle>) {
        let port = Arc::new(TestPort::default());
        let container = MountContainer::new("plugin-wrapper");
        let handle = Discover
            .start(
                container.clone(),
                PluginStartupConfig::new(PLUGIN_ID, "/app"),
                port.clone(),
            )
            .unwrap();
        (port, container, handle)
    }

    fn title(container: &MountContainer) -> String {
        container.query_selector("#page-title").unwrap().text
    }

    fn discover() -> PluginDescriptor {
        PluginDescriptor::new(PLUGIN_ID, "Discover")
    }

    #[test]
    fn start_renders_home_and_registers_navigation() {
        let (port, container, handle) = mount();
        assert!(handle.is_mounted());
        assert_eq!(handle.plugin_id(), "discover");
        assert_eq!(title(&container), "Discover");

        let published = port.published.lock().unwrap();
        let inits: Vec<_> = published
            .iter()
            .filter_map(|s| match s {
                Signal::InitNavigation(init) => Some(init.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(inits.len(), 1);
        assert_eq!(inits[0].plugin_id, "discover");
        assert_eq!(inits[0].items, navigation());
    }

    #[test]
    fn addressed_navigate_changes_view() {
        let (port, container, _handle) = mount();
        port.emit::<Navigate>(PluginNavigate::to_plugin(discover(), "/browse"));
        assert_eq!(title(&container), "Browse");
    }

    #[test]
    fn navigate_for_other_plugin_is_ignored() {
        let (port, container, _handle) = mount();
        port.emit::<Navigate>(PluginNavigate::to_plugin(
            PluginDescriptor::new("stats", "Stats"),
            "/browse",
        ));
        port.emit::<Navigate>(PluginNavigate::to_host("/app/discover/browse"));
        assert_eq!(title(&container), "Discover");
    }

    #[test]
    fn unload_tears_down_and_ignores_stale_signals() {
        let (port, container, handle) = mount();
        port.emit::<Unload>(PluginRef::new("discover"));

        assert!(!handle.is_mounted());
        assert!(container.is_empty());
        assert_eq!(port.count(SignalKind::Navigate), 0);
        assert_eq!(port.count(SignalKind::Unload), 0);

        port.emit::<Navigate>(PluginNavigate::to_plugin(discover(), "/browse"));
        assert!(container.is_empty());
        handle.unmount();
    }

    #[test]
    fn unload_for_other_plugin_is_ignored() {
        let (port, _container, handle) = mount();
        port.emit::<Unload>(PluginRef::new("stats"));
        assert!(handle.is_mounted());
    }

    #[test]
    fn instances_are_independent() {
        let (port, first, first_handle) = mount();
        let second = MountContainer::new("plugin-wrapper");
        let _second_handle = Discover
            .start(
                second.clone(),
                PluginStartupConfig::new(PLUGIN_ID, "/app"),
                port.clone(),
            )
            .unwrap();

        first_handle.unmount();
        assert!(first.is_empty());
        assert_eq!(title(&second), "Discover");
    }

    #[test]
    fn module_exports_start() {
        let module = Discover::module();
        assert_eq!(module.specifier(), "/plugins/discover/discover.js");
        assert_eq!(module.entry().map(|(name, _)| name), Some("start"));
    }

    #[test]
    fn startup_config_round_trips_through_json() {
        let json = serde_json::json!({"pluginId": "discover", "basename": "/app/discover"});
        let config: PluginStartupConfig = serde_json::from_value(json).unwrap();
        assert!(!config.is_nested());
        assert_eq!(config.resolve("/test"), "/app/discover/test");
    }
}
