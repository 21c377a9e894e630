//! Server error types

use thiserror::Error;

/// Errors that can occur in the panorama server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured asset or web directory is unusable
    #[error("invalid directory {path}: {reason}")]
    Directory { path: String, reason: String },

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
