//! Per-plugin mount records

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use panorama_plugin_api::{PluginDescriptor, PluginNavigationItem};

/// Lifecycle state of one plugin slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<PluginNavigationItem>),
}

impl SlotState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
        }
    }
}

/// Host-side record for a configured plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub plugin_id: String,
    pub state: SlotState,
    /// Set the first time the plugin is activated; never reset
    pub mounted_once: bool,
    /// Reason of the most recent failed load
    pub last_error: Option<String>,
}

impl MountRecord {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            state: SlotState::Idle,
            mounted_once: false,
            last_error: None,
        }
    }
}

/// Mount records for every configured plugin, shared by composer and shell
///
/// The composer drives `state`; the shell owns `mounted_once`.
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    inner: Arc<Mutex<BTreeMap<String, MountRecord>>>,
}

impl SlotTable {
    pub fn new(plugins: &[PluginDescriptor]) -> Self {
        let records = plugins
            .iter()
            .map(|p| (p.id.clone(), MountRecord::new(&p.id)))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(records)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MountRecord>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, plugin_id: &str) -> bool {
        self.lock().contains_key(plugin_id)
    }

    pub fn record(&self, plugin_id: &str) -> Option<MountRecord> {
        self.lock().get(plugin_id).cloned()
    }

    pub fn state(&self, plugin_id: &str) -> Option<SlotState> {
        self.lock().get(plugin_id).map(|r| r.state.clone())
    }

    /// Apply `f` to a record; returns `None` for unknown plugins
    pub fn update<R>(&self, plugin_id: &str, f: impl FnOnce(&mut MountRecord) -> R) -> Option<R> {
        self.lock().get_mut(plugin_id).map(f)
    }

    /// Set `mounted_once`; true only for the call that set it
    pub fn claim_mount(&self, plugin_id: &str) -> bool {
        self.update(plugin_id, |record| !std::mem::replace(&mut record.mounted_once, true))
            .unwrap_or(false)
    }

    pub fn records(&self) -> Vec<MountRecord> {
        self.lock().values().cloned().collect()
    }
}
