//! Host navigation composer
//!
//! Tracks each plugin slot through `Idle -> Loading -> Loaded(items)` from bus
//! signals and merges the host's static links with the registered plugin
//! trees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use panorama_plugin_api::{PluginDescriptor, PluginNavigate, PluginNavigationItem, join_path};

use super::menu::{LinkActivation, LinkMode, Menu, MenuEntry, NavLink, Trailing};
use super::slot::{MountRecord, SlotState, SlotTable};
use crate::config::HostLink;
use crate::events::{
    EventBus, HostReady, InitNavigation, LoadFailed, Loading, Navigate, PluginRef, Subscription,
    Unload,
};

/// What the composer renders
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub base_path: String,
    pub host_links: Vec<HostLink>,
    pub plugins: Vec<PluginDescriptor>,
    pub link_mode: LinkMode,
}

type Pending = Arc<Mutex<HashMap<String, Subscription>>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct NavigationComposer {
    bus: EventBus,
    slots: SlotTable,
    config: ComposerConfig,
    /// Armed once-listeners for INIT_NAVIGATION, keyed by plugin id
    pending: Pending,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NavigationComposer {
    /// Create a composer and subscribe it to the bus
    pub fn attach(bus: EventBus, slots: SlotTable, config: ComposerConfig) -> Self {
        let composer = Self {
            bus,
            slots,
            config,
            pending: Arc::new(Mutex::new(HashMap::new())),
            subscriptions: Mutex::new(Vec::new()),
        };
        let subscriptions = vec![
            composer.on_loading(),
            composer.on_unload(),
            composer.on_load_failed(),
        ];
        *lock(&composer.subscriptions) = subscriptions;
        composer
    }

    fn on_loading(&self) -> Subscription {
        let bus = self.bus.clone();
        let slots = self.slots.clone();
        let pending = self.pending.clone();

        self.bus.subscribe::<Loading>(move |r| {
            let plugin_id = r.plugin_id.as_str();
            let entered = slots.update(plugin_id, |record| {
                record.state = SlotState::Loading;
                record.last_error = None;
            });
            if entered.is_none() {
                tracing::debug!(plugin = %plugin_id, "LOADING for unconfigured plugin ignored");
                return;
            }

            let armed = {
                let slots = slots.clone();
                let pending = pending.clone();
                let expected = plugin_id.to_string();
                bus.subscribe_once::<InitNavigation>(
                    move |init| init.plugin_id == expected,
                    move |init| {
                        lock(&pending).remove(&init.plugin_id);
                        let count = init.items.len();
                        let applied = slots.update(&init.plugin_id, |record| {
                            if record.state == SlotState::Loading {
                                record.state = SlotState::Loaded(init.items.clone());
                                true
                            } else {
                                false
                            }
                        });
                        if applied == Some(true) {
                            tracing::info!(plugin = %init.plugin_id, items = count, "Navigation registered");
                        }
                    },
                )
            };
            if let Some(previous) = lock(&pending).insert(plugin_id.to_string(), armed) {
                previous.unsubscribe();
            }

            tracing::debug!(plugin = %plugin_id, "Slot loading, acknowledging");
            bus.emit::<HostReady>(PluginRef::new(plugin_id));
        })
    }

    fn on_unload(&self) -> Subscription {
        let slots = self.slots.clone();
        let pending = self.pending.clone();

        self.bus.subscribe::<Unload>(move |r| {
            if let Some(armed) = lock(&pending).remove(&r.plugin_id) {
                armed.unsubscribe();
            }
            if slots
                .update(&r.plugin_id, |record| record.state = SlotState::Idle)
                .is_some()
            {
                tracing::debug!(plugin = %r.plugin_id, "Slot unloaded");
            }
        })
    }

    fn on_load_failed(&self) -> Subscription {
        let slots = self.slots.clone();
        let pending = self.pending.clone();

        self.bus.subscribe::<LoadFailed>(move |failure| {
            let was_loading = slots.update(&failure.plugin_id, |record| {
                record.last_error = Some(failure.reason.clone());
                if record.state == SlotState::Loading {
                    record.state = SlotState::Idle;
                    true
                } else {
                    false
                }
            });
            if was_loading == Some(true)
                && let Some(armed) = lock(&pending).remove(&failure.plugin_id)
            {
                armed.unsubscribe();
            }
            tracing::warn!(plugin = %failure.plugin_id, reason = %failure.reason, "Plugin failed to load");
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn state(&self, plugin_id: &str) -> Option<SlotState> {
        self.slots.state(plugin_id)
    }

    pub fn record(&self, plugin_id: &str) -> Option<MountRecord> {
        self.slots.record(plugin_id)
    }

    /// Build the combined menu from the current slot states
    pub fn compose(&self) -> Menu {
        let mut entries: Vec<MenuEntry> = self
            .config
            .host_links
            .iter()
            .map(|link| MenuEntry::Link(self.plain_link(&link.label, &link.to, Trailing::None)))
            .collect();

        for plugin in &self.config.plugins {
            let route = plugin.mount_route(&self.config.base_path);
            let entry = match self.slots.state(&plugin.id).unwrap_or_default() {
                SlotState::Loaded(items) => MenuEntry::Section {
                    label: plugin.label.clone(),
                    children: self.plugin_entries(plugin, &route, &items, 1),
                    href: route,
                    depth: 0,
                    expanded: true,
                },
                SlotState::Loading => {
                    MenuEntry::Link(self.plain_link(&plugin.label, &route, Trailing::Busy))
                }
                SlotState::Idle => {
                    MenuEntry::Link(self.plain_link(&plugin.label, &route, Trailing::Chevron))
                }
            };
            entries.push(entry);
        }

        Menu { entries }
    }

    fn plain_link(&self, label: &str, href: &str, trailing: Trailing) -> NavLink {
        let activation = match self.config.link_mode {
            LinkMode::Document => LinkActivation::Navigate,
            LinkMode::Router => {
                let bus = self.bus.clone();
                LinkActivation::Intercept(Arc::new(move |to: &str| {
                    bus.emit::<Navigate>(PluginNavigate::to_host(to));
                }))
            }
        };
        NavLink {
            label: label.to_string(),
            to: href.to_string(),
            href: href.to_string(),
            depth: 0,
            trailing,
            activation,
        }
    }

    fn plugin_entries(
        &self,
        plugin: &PluginDescriptor,
        route: &str,
        items: &[PluginNavigationItem],
        depth: usize,
    ) -> Vec<MenuEntry> {
        items
            .iter()
            .map(|item| {
                let href = join_path(route, &item.to);
                if item.is_leaf() {
                    let bus = self.bus.clone();
                    let target = plugin.clone();
                    MenuEntry::Link(NavLink {
                        label: item.label.clone(),
                        to: item.to.clone(),
                        href,
                        depth,
                        trailing: Trailing::None,
                        activation: LinkActivation::Intercept(Arc::new(move |to: &str| {
                            bus.emit::<Navigate>(PluginNavigate::to_plugin(target.clone(), to));
                        })),
                    })
                } else {
                    MenuEntry::Section {
                        label: item.label.clone(),
                        href,
                        depth,
                        expanded: true,
                        children: self.plugin_entries(plugin, route, &item.children, depth + 1),
                    }
                }
            })
            .collect()
    }

    /// Detach every listener the composer holds
    pub fn dispose(&self) {
        for subscription in lock(&self.subscriptions).drain(..) {
            subscription.unsubscribe();
        }
        for (_, armed) in lock(&self.pending).drain() {
            armed.unsubscribe();
        }
    }
}

impl std::fmt::Debug for NavigationComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationComposer")
            .field("config", &self.config)
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use panorama_plugin_api::{LoadFailure, PluginNavigationInit, SignalKind};

    use super::*;
    use crate::navigation::menu::Activated;

    fn setup(link_mode: LinkMode) -> (EventBus, NavigationComposer) {
        let bus = EventBus::new();
        let plugins = vec![PluginDescriptor::new("discover", "Discover")];
        let slots = SlotTable::new(&plugins);
        let composer = NavigationComposer::attach(
            bus.clone(),
            slots,
            ComposerConfig {
                base_path: "/app".to_string(),
                host_links: vec![HostLink::new("Home", "/app/")],
                plugins,
                link_mode,
            },
        );
        (bus, composer)
    }

    fn init(items: Vec<PluginNavigationItem>) -> PluginNavigationInit {
        PluginNavigationInit {
            plugin_id: "discover".to_string(),
            items,
        }
    }

    #[test]
    fn loading_then_init_reaches_loaded() {
        let (bus, composer) = setup(LinkMode::Router);
        assert_eq!(composer.state("discover"), Some(SlotState::Idle));

        bus.emit::<Loading>(PluginRef::new("discover"));
        assert_eq!(composer.state("discover"), Some(SlotState::Loading));

        let items = vec![PluginNavigationItem::leaf("Home", "/")];
        bus.emit::<InitNavigation>(init(items.clone()));
        assert_eq!(composer.state("discover"), Some(SlotState::Loaded(items)));
    }

    #[test]
    fn loading_is_acknowledged_with_host_ready() {
        let (bus, _composer) = setup(LinkMode::Router);
        let acked = Arc::new(Mutex::new(Vec::new()));
        {
            let acked = acked.clone();
            bus.subscribe::<HostReady>(move |r| acked.lock().unwrap().push(r.plugin_id.clone()));
        }

        bus.emit::<Loading>(PluginRef::new("discover"));
        assert_eq!(*acked.lock().unwrap(), vec!["discover".to_string()]);
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 1);
    }

    #[test]
    fn init_without_loading_is_ignored() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<InitNavigation>(init(vec![PluginNavigationItem::leaf("Home", "/")]));
        assert_eq!(composer.state("discover"), Some(SlotState::Idle));
    }

    #[test]
    fn init_delivered_at_most_once_per_lifecycle() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));

        let first = vec![PluginNavigationItem::leaf("Home", "/")];
        bus.emit::<InitNavigation>(init(first.clone()));
        bus.emit::<InitNavigation>(init(vec![PluginNavigationItem::leaf("Other", "/other")]));

        assert_eq!(composer.state("discover"), Some(SlotState::Loaded(first)));
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 0);
    }

    #[test]
    fn init_for_other_plugin_does_not_consume_listener() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<InitNavigation>(PluginNavigationInit {
            plugin_id: "stats".to_string(),
            items: vec![],
        });
        assert_eq!(composer.state("discover"), Some(SlotState::Loading));
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 1);
    }

    #[test]
    fn loading_while_loaded_reenters_loading() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<InitNavigation>(init(vec![PluginNavigationItem::leaf("Home", "/")]));
        bus.emit::<Loading>(PluginRef::new("discover"));
        assert_eq!(composer.state("discover"), Some(SlotState::Loading));
    }

    #[test]
    fn unload_returns_to_idle_and_disarms() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<Unload>(PluginRef::new("discover"));
        assert_eq!(composer.state("discover"), Some(SlotState::Idle));
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 0);

        bus.emit::<InitNavigation>(init(vec![PluginNavigationItem::leaf("Home", "/")]));
        assert_eq!(composer.state("discover"), Some(SlotState::Idle));
    }

    #[test]
    fn load_failure_returns_to_idle_with_reason() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<LoadFailed>(LoadFailure {
            plugin_id: "discover".to_string(),
            reason: "404".to_string(),
        });

        let record = composer.record("discover").unwrap();
        assert_eq!(record.state, SlotState::Idle);
        assert_eq!(record.last_error.as_deref(), Some("404"));
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 0);
    }

    #[test]
    fn compose_falls_back_to_plain_link() {
        let (bus, composer) = setup(LinkMode::Router);
        let menu = composer.compose();
        assert_eq!(menu.entries.len(), 2);
        assert_eq!(menu.entries[0].label(), "Home");

        let discover = menu.link("Discover").unwrap();
        assert_eq!(discover.href, "/app/discover");
        assert_eq!(discover.trailing, Trailing::Chevron);

        bus.emit::<Loading>(PluginRef::new("discover"));
        let menu = composer.compose();
        assert_eq!(menu.link("Discover").unwrap().trailing, Trailing::Busy);
    }

    #[test]
    fn compose_expands_loaded_tree() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<InitNavigation>(init(vec![
            PluginNavigationItem::leaf("Home", "/"),
            PluginNavigationItem::leaf("Settings", "/settings").with_children(vec![
                PluginNavigationItem::leaf("Profile", "/settings/profile"),
            ]),
        ]));

        let menu = composer.compose();
        match menu.entry("Discover").unwrap() {
            MenuEntry::Section {
                expanded, children, ..
            } => {
                assert!(expanded);
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[1], MenuEntry::Section { label, .. } if label == "Settings"));
            }
            other => panic!("expected section, got {other:?}"),
        }

        let profile = menu.link_in("Discover", "Profile").unwrap();
        assert_eq!(profile.depth, 2);
        assert_eq!(profile.href, "/app/discover/settings/profile");
    }

    #[test]
    fn leaf_activation_publishes_addressed_navigate() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        bus.emit::<InitNavigation>(init(vec![PluginNavigationItem::leaf("Browse", "/browse")]));

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.subscribe::<Navigate>(move |nav| seen.lock().unwrap().push(nav.clone()));
        }

        let menu = composer.compose();
        let browse = menu.link_in("Discover", "Browse").unwrap();
        assert_eq!(browse.activate(), Activated::Intercepted("/browse".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].to, "/browse");
        assert!(seen[0].is_addressed_to("discover"));
    }

    #[test]
    fn plain_link_activation_follows_link_mode() {
        let (_, composer) = setup(LinkMode::Document);
        let menu = composer.compose();
        assert_eq!(
            menu.link("Discover").unwrap().activate(),
            Activated::Followed("/app/discover".to_string())
        );

        let (bus, composer) = setup(LinkMode::Router);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.subscribe::<Navigate>(move |nav| seen.lock().unwrap().push(nav.clone()));
        }
        composer.compose().link("Discover").unwrap().activate();
        assert_eq!(*seen.lock().unwrap(), vec![PluginNavigate::to_host("/app/discover")]);
    }

    #[test]
    fn dispose_detaches_listeners() {
        let (bus, composer) = setup(LinkMode::Router);
        bus.emit::<Loading>(PluginRef::new("discover"));
        composer.dispose();

        assert_eq!(bus.listener_count(SignalKind::Loading), 0);
        assert_eq!(bus.listener_count(SignalKind::Unload), 0);
        assert_eq!(bus.listener_count(SignalKind::InitNavigation), 0);

        bus.emit::<Unload>(PluginRef::new("discover"));
        assert_eq!(composer.state("discover"), Some(SlotState::Loading));
    }
}
