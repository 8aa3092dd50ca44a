//! Client-visible error taxonomy
//!
//! Every failure leaving the bridge is exactly one of these kinds. The
//! generic I/O variant carries the backend's native error text prefixed
//! with the name of the primitive that failed.

use backend_api::{BackendError, ErrorCode};
use thiserror::Error;

/// Errors surfaced to the host framework
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A path segment exists but has the wrong type
    #[error("Path conflict: {0}")]
    PathConflict(String),

    /// Path translation failed (too long or malformed authority)
    #[error("Translation error: {0}")]
    Translation(String),

    /// A name could not be resolved during an ownership change
    #[error("Identity error: {0}")]
    Identity(String),

    /// Any other backend failure, carrying its native error text
    #[error("I/O error: {0}")]
    Io(String),
}

impl BridgeError {
    /// Generic I/O failure naming the backend primitive that failed
    pub(crate) fn io(op: &str, err: &BackendError) -> Self {
        Self::Io(format!("{}: {}", op, err))
    }
}

/// Default mapping from a backend failure to the taxonomy
///
/// Call sites with stricter contracts (exclusive create, read-side
/// open) apply their own mapping instead.
pub(crate) fn map_backend(op: &str, err: BackendError) -> BridgeError {
    match err.code {
        ErrorCode::NotFound => BridgeError::NotFound(format!("{}: {}", op, err)),
        ErrorCode::AlreadyExists => BridgeError::AlreadyExists(format!("{}: {}", op, err)),
        ErrorCode::TooLong => BridgeError::Translation(format!("{}: {}", op, err)),
        _ => BridgeError::io(op, &err),
    }
}
