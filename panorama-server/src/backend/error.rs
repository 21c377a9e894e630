//! Backend error types

use hyper::StatusCode;
use thiserror::Error;

/// Errors from starting, watching or talking to a plugin backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Nothing is listening on the backend socket
    #[error("cannot connect to {socket}: {source}")]
    Connect {
        socket: String,
        #[source]
        source: std::io::Error,
    },

    #[error("backend http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid backend request: {0}")]
    Request(#[from] hyper::http::Error),

    /// The backend answered with a non-success status
    #[error("backend returned {0}")]
    Status(StatusCode),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited before it served a manifest
    #[error("backend for {plugin_id} exited: {status}")]
    Exited { plugin_id: String, status: String },

    #[error("backend for {plugin_id} not ready after {waited_ms}ms")]
    NotReady { plugin_id: String, waited_ms: u64 },

    #[error("file watch failed: {0}")]
    Watch(#[from] notify::Error),

    /// Unix sockets are not available on this platform
    #[error("plugin backends need unix sockets")]
    Unsupported,
}
