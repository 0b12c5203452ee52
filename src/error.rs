//! Error types shared across the profiling engine and the model store.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("failed to load {path:?} as {format}: {reason}")]
    Load {
        path: PathBuf,
        format: String,
        reason: String,
    },

    #[error("cannot determine source format for {0:?}; pass --format explicitly")]
    UnknownFormat(PathBuf),

    #[error("source format '{0}' is not supported by this build")]
    UnsupportedFormat(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("user {user} is not allowed to {action} resource {resource}")]
    AccessDenied {
        user: Uuid,
        action: &'static str,
        resource: Uuid,
    },

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("version clone failed: {0}")]
    CloneFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
