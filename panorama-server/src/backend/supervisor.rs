//! Starts plugin backends and restarts them when their binary changes

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use panorama_core::{BackendConfig, ServerConfig};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{BackendError, LoadedPlugins, Manifest, ipc};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type WatchEvent = notify::Result<notify::Event>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// How long a fresh process has to answer `/manifest`
    pub ready_timeout: Duration,
    /// Quiet period after the last change before restarting
    pub debounce: Duration,
}

impl SupervisorSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            ready_timeout: Duration::from_millis(config.backend_ready_timeout_ms),
            debounce: Duration::from_millis(config.watch_debounce_ms),
        }
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// One plugin's backend process
#[derive(Debug)]
pub struct Backend {
    plugin_id: String,
    binary: PathBuf,
    socket: PathBuf,
    loaded: LoadedPlugins,
    ready_timeout: Duration,
    child: Option<Child>,
}

impl Backend {
    pub fn new(
        plugin_id: impl Into<String>,
        config: &BackendConfig,
        loaded: LoadedPlugins,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            binary: config.binary_path.clone(),
            socket: config.socket_path.clone(),
            loaded,
            ready_timeout,
            child: None,
        }
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn is_running(&mut self) -> bool {
        self.child
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }

    /// Replace any running process with a fresh one and wait for its manifest
    pub async fn restart(&mut self) -> Result<Manifest, BackendError> {
        self.stop().await;
        self.clear_socket().await;

        let child = Command::new(&self.binary)
            .arg(&self.socket)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;
        tracing::info!(plugin = %self.plugin_id, pid = ?child.id(), "Backend started");
        self.child = Some(child);

        match self.await_ready().await {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                self.stop().await;
                Err(e)
            }
        }
    }

    /// Kill the process, if any, and forget its manifest
    pub async fn stop(&mut self) {
        self.loaded.write().await.remove(&self.plugin_id);

        if let Some(mut child) = self.child.take() {
            match child.kill().await {
                Ok(()) => tracing::info!(plugin = %self.plugin_id, "Backend stopped"),
                Err(e) => {
                    tracing::warn!(plugin = %self.plugin_id, error = %e, "Failed to kill backend")
                }
            }
        }
    }

    async fn clear_socket(&self) {
        match tokio::fs::remove_file(&self.socket).await {
            Ok(()) => tracing::debug!(socket = %self.socket.display(), "Removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(socket = %self.socket.display(), error = %e, "Failed to remove socket")
            }
        }
    }

    /// Poll the socket until the manifest arrives, then record it
    async fn await_ready(&mut self) -> Result<Manifest, BackendError> {
        let started = Instant::now();
        let manifest = loop {
            match ipc::fetch_manifest(&self.socket).await {
                Ok(manifest) => break manifest,
                Err(BackendError::Manifest(e)) => return Err(BackendError::Manifest(e)),
                Err(e) => tracing::trace!(plugin = %self.plugin_id, error = %e, "Backend not ready"),
            }

            if let Some(child) = self.child.as_mut()
                && let Ok(Some(status)) = child.try_wait()
            {
                return Err(BackendError::Exited {
                    plugin_id: self.plugin_id.clone(),
                    status: status.to_string(),
                });
            }
            if started.elapsed() >= self.ready_timeout {
                return Err(BackendError::NotReady {
                    plugin_id: self.plugin_id.clone(),
                    waited_ms: self.ready_timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        if manifest.id != self.plugin_id {
            tracing::warn!(
                plugin = %self.plugin_id,
                reported = %manifest.id,
                "Backend manifest names another plugin"
            );
        }
        tracing::info!(plugin = %self.plugin_id, version = ?manifest.version, "Backend ready");
        self.loaded
            .write()
            .await
            .insert(self.plugin_id.clone(), manifest.clone());
        Ok(manifest)
    }
}

/// Owns one watch-and-restart task per configured backend
///
/// Dropping the supervisor aborts the tasks, which kills their processes.
pub struct BackendSupervisor {
    tasks: Vec<JoinHandle<()>>,
}

impl BackendSupervisor {
    pub fn start(
        backends: &BTreeMap<String, BackendConfig>,
        loaded: LoadedPlugins,
        settings: SupervisorSettings,
    ) -> Self {
        let tasks = backends
            .iter()
            .map(|(plugin_id, config)| {
                let backend =
                    Backend::new(plugin_id.clone(), config, loaded.clone(), settings.ready_timeout);
                tokio::spawn(supervise(backend, settings.debounce))
            })
            .collect();
        Self { tasks }
    }

    /// Number of supervised backends
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for BackendSupervisor {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn supervise(mut backend: Backend, debounce: Duration) {
    let (tx, mut rx) = mpsc::channel::<WatchEvent>(100);
    let _watcher = match watch_binary(&backend.binary, tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(
                plugin = %backend.plugin_id,
                error = %e,
                "Not watching backend binary, changes need a server restart"
            );
            None
        }
    };
    // Held so the channel stays open without a watcher
    let _tx = tx;

    if let Err(e) = backend.restart().await {
        tracing::warn!(plugin = %backend.plugin_id, error = %e, "Backend failed to start");
    }

    while let Some(event) = rx.recv().await {
        if !touches_binary(&event, &backend.binary) {
            continue;
        }
        tracing::debug!(plugin = %backend.plugin_id, "Backend binary changed, starting debounce");

        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(_)) => {}
                Ok(None) => return,
                Err(_) => break,
            }
        }

        tracing::info!(plugin = %backend.plugin_id, "Restarting backend");
        if let Err(e) = backend.restart().await {
            tracing::warn!(plugin = %backend.plugin_id, error = %e, "Backend restart failed");
        }
    }
}

/// Watch the directory holding `binary`; rebuilds replace the file itself
fn watch_binary(
    binary: &Path,
    tx: mpsc::Sender<WatchEvent>,
) -> Result<RecommendedWatcher, BackendError> {
    let dir = match binary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut watcher = recommended_watcher(move |event| {
        let _ = tx.blocking_send(event);
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    tracing::debug!(dir = %dir.display(), "Watching backend directory");
    Ok(watcher)
}

/// A create or modify event naming the binary's file
fn touches_binary(event: &WatchEvent, binary: &Path) -> bool {
    let Ok(event) = event else {
        return false;
    };
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    let Some(name) = binary.file_name() else {
        return false;
    };
    event.paths.iter().any(|path| path.file_name() == Some(name))
}
