//! Error types for mooring.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error
//! chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mooring operations.
pub type Result<T> = std::result::Result<T, MooringError>;

/// Main error type for mooring.
#[derive(Error, Debug)]
pub enum MooringError {
    // Environment errors: recoverable, the host displays them and the user
    // remediates (install the engine, start the daemon, plug in a network).
    #[error("Platform not supported: {platform}")]
    PlatformUnsupported { platform: String },

    #[error("No local IPv4 address found")]
    NoAddressFound,

    #[error("Container engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    // Image errors. InspectFailed is distinct from ImageNotFound: only a
    // not-found inspect result falls through to a pull; auth and transport
    // failures surface immediately.
    #[error("Image not found: {image}")]
    ImageNotFound { image: String },

    #[error("Failed to inspect image {image}: {reason}")]
    InspectFailed { image: String, reason: String },

    #[error("Failed to pull image {image}: {reason}")]
    PullFailed { image: String, reason: String },

    // Supervisor errors
    #[error("Failed to start stack: {reason}")]
    StackStartFailed { reason: String },

    // Control errors
    #[error("Operation already in progress: {operation}")]
    OperationInProgress { operation: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MooringError {
    /// Create an Internal error from any error type.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(err.to_string())
    }
}
