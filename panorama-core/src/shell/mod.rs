//! Host shell
//!
//! Owns the current location, activates plugin slots when their route is
//! visited and routes plugin-originated navigation requests.

pub mod router;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use panorama_plugin_api::{LoadFailure, MountContainer, PluginDescriptor, PluginNavigate, join_path};
use tokio::task::JoinHandle;

pub use router::{Route, Router};

use crate::dom::Document;
use crate::error::{LoaderError, ShellError};
use crate::events::{EventBus, LoadFailed, Navigate, PluginRef, Subscription, Unload};
use crate::loader::{MountedPlugin, PluginLoader, mount_point_id};
use crate::navigation::SlotTable;

enum MountSlot {
    /// A load or remount is in flight
    Mounting,
    Mounted(MountedPlugin),
    /// Torn down; module and boundary retained for remounting
    Unmounted(MountedPlugin),
    /// The first load failed; not retried
    Failed,
}

struct ShellInner {
    bus: EventBus,
    document: Document,
    loader: PluginLoader,
    slots: SlotTable,
    router: Router,
    plugins: Vec<PluginDescriptor>,
    mounts: Mutex<HashMap<String, MountSlot>>,
    location: Mutex<String>,
    history: Mutex<Vec<String>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    navigate_listener: Mutex<Option<Subscription>>,
    disposed: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ShellInner {
    fn set_location(&self, path: String) {
        let mut location = lock(&self.location);
        if *location != path {
            lock(&self.history).push(path.clone());
            *location = path;
        }
    }

    fn descriptor(&self, plugin_id: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id == plugin_id)
    }
}

/// The host shell; cloning yields another handle onto the same shell
#[derive(Clone)]
pub struct Shell {
    inner: Arc<ShellInner>,
}

impl Shell {
    pub fn new(
        bus: EventBus,
        document: Document,
        loader: PluginLoader,
        slots: SlotTable,
        base_path: &str,
        plugins: Vec<PluginDescriptor>,
    ) -> Self {
        let inner = Arc::new(ShellInner {
            bus,
            document,
            loader,
            slots,
            router: Router::new(base_path),
            plugins,
            mounts: Mutex::new(HashMap::new()),
            location: Mutex::new(base_path.to_string()),
            history: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            navigate_listener: Mutex::new(None),
            disposed: AtomicBool::new(false),
        });

        let listener = Self::listen_for_navigation(&inner);
        *lock(&inner.navigate_listener) = Some(listener);
        Self { inner }
    }

    fn listen_for_navigation(inner: &Arc<ShellInner>) -> Subscription {
        let weak: Weak<ShellInner> = Arc::downgrade(inner);

        inner.bus.subscribe::<Navigate>(move |nav| {
            let Some(inner) = weak.upgrade() else {
                return;
            };

            match &nav.plugin {
                Some(plugin) => {
                    let base = plugin.mount_route(inner.router.base_path());
                    inner.set_location(join_path(&base, &nav.to));
                }
                None => {
                    let shell = Shell {
                        inner: inner.clone(),
                    };
                    let to = nav.to.clone();
                    match tokio::runtime::Handle::try_current() {
                        Ok(handle) => {
                            let task = handle.spawn(async move {
                                if let Err(e) = shell.navigate(&to).await {
                                    tracing::warn!(path = %to, error = %e, "Navigation failed");
                                }
                            });
                            let mut tasks = lock(&inner.tasks);
                            tasks.retain(|t| !t.is_finished());
                            tasks.push(task);
                        }
                        Err(_) => {
                            tracing::warn!(path = %to, "No runtime to route navigation request");
                        }
                    }
                }
            }
        })
    }

    /// Navigate the host to `path`, activating a plugin slot if the route names one
    pub async fn navigate(&self, path: &str) -> Result<Route, ShellError> {
        if self.is_disposed() {
            return Err(ShellError::Disposed);
        }

        self.inner.set_location(path.to_string());
        let route = self.inner.router.resolve(path);
        tracing::debug!(path = %path, route = ?route, "Navigating");

        if let Route::Plugin { plugin_id, rest } = &route {
            let fresh = self.activate(plugin_id).await?;
            if !(fresh && rest == "/")
                && let Some(plugin) = self.inner.descriptor(plugin_id)
            {
                self.inner
                    .bus
                    .emit::<Navigate>(PluginNavigate::to_plugin(plugin.clone(), rest.clone()));
            }
        }
        Ok(route)
    }

    /// Ensure a plugin is mounted; returns true when this call mounted it
    ///
    /// Assets are fetched and the module imported only on the very first
    /// activation. After an unload the retained module is started again.
    pub async fn activate(&self, plugin_id: &str) -> Result<bool, ShellError> {
        let inner = &self.inner;
        if !inner.slots.contains(plugin_id) {
            return Err(ShellError::UnknownPlugin(plugin_id.to_string()));
        }

        if inner.slots.claim_mount(plugin_id) {
            lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Mounting);
            inner.document.ensure_element(&mount_point_id(plugin_id), "div");

            let result = inner
                .loader
                .load(&inner.document, &inner.bus, plugin_id, inner.router.base_path())
                .await;
            return match result {
                Ok(mounted) => {
                    lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Mounted(mounted));
                    Ok(true)
                }
                Err(source) => {
                    lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Failed);
                    Err(self.load_failed(plugin_id, source))
                }
            };
        }

        let retained = {
            let mut mounts = lock(&inner.mounts);
            match mounts.remove(plugin_id) {
                Some(MountSlot::Unmounted(plugin)) => {
                    mounts.insert(plugin_id.to_string(), MountSlot::Mounting);
                    plugin
                }
                Some(other) => {
                    mounts.insert(plugin_id.to_string(), other);
                    tracing::debug!(plugin = %plugin_id, "Already mounted, skipping load");
                    return Ok(false);
                }
                None => return Ok(false),
            }
        };

        let mut plugin = retained;
        match inner
            .loader
            .remount(&inner.bus, &plugin, inner.router.base_path())
            .await
        {
            Ok(handle) => {
                plugin.handle = handle;
                lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Mounted(plugin));
                Ok(true)
            }
            Err(source) => {
                lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Unmounted(plugin));
                Err(self.load_failed(plugin_id, source))
            }
        }
    }

    fn load_failed(&self, plugin_id: &str, source: LoaderError) -> ShellError {
        tracing::error!(plugin = %plugin_id, error = %source, "Failed to load plugin");
        self.inner.bus.emit::<LoadFailed>(LoadFailure {
            plugin_id: plugin_id.to_string(),
            reason: source.to_string(),
        });
        ShellError::Load {
            plugin_id: plugin_id.to_string(),
            source,
        }
    }

    /// Tear a mounted plugin down; false if it was not mounted
    pub fn unload(&self, plugin_id: &str) -> Result<bool, ShellError> {
        let inner = &self.inner;
        if !inner.slots.contains(plugin_id) {
            return Err(ShellError::UnknownPlugin(plugin_id.to_string()));
        }

        let plugin = {
            let mut mounts = lock(&inner.mounts);
            match mounts.remove(plugin_id) {
                Some(MountSlot::Mounted(plugin)) => plugin,
                Some(other) => {
                    mounts.insert(plugin_id.to_string(), other);
                    return Ok(false);
                }
                None => return Ok(false),
            }
        };

        inner.bus.emit::<Unload>(PluginRef::new(plugin_id));
        plugin.handle.unmount();
        tracing::info!(plugin = %plugin_id, "Plugin unloaded");

        lock(&inner.mounts).insert(plugin_id.to_string(), MountSlot::Unmounted(plugin));
        Ok(true)
    }

    /// Wait for navigation requests routed from the bus to finish
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<_> = lock(&self.inner.tasks).drain(..).collect();
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "Navigation task failed");
                }
            }
        }
    }

    /// Routed navigation requests that have not finished yet
    pub fn in_flight(&self) -> usize {
        let mut tasks = lock(&self.inner.tasks);
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }

    pub fn location(&self) -> String {
        lock(&self.inner.location).clone()
    }

    pub fn history(&self) -> Vec<String> {
        lock(&self.inner.history).clone()
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    pub fn is_mounted(&self, plugin_id: &str) -> bool {
        matches!(lock(&self.inner.mounts).get(plugin_id), Some(MountSlot::Mounted(_)))
    }

    /// Ids of the plugins mounted right now
    pub fn mounted(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.inner.mounts)
            .iter()
            .filter(|(_, slot)| matches!(slot, MountSlot::Mounted(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// The container a plugin renders into, once it has been mounted
    pub fn container(&self, plugin_id: &str) -> Option<MountContainer> {
        match lock(&self.inner.mounts).get(plugin_id) {
            Some(MountSlot::Mounted(p)) | Some(MountSlot::Unmounted(p)) => Some(p.container.clone()),
            _ => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Unload every plugin and stop routing bus navigation
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(listener) = lock(&self.inner.navigate_listener).take() {
            listener.unsubscribe();
        }
        for plugin_id in self.mounted() {
            if let Err(e) = self.unload(&plugin_id) {
                tracing::warn!(plugin = %plugin_id, error = %e, "Failed to unload during dispose");
            }
        }
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("location", &self.location())
            .field("mounted", &self.mounted())
            .finish()
    }
}
