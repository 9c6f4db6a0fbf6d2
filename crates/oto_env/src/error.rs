//! Failure taxonomy for the emulated environment.
//!
//! Adapters convert driver/filesystem errors into these kinds at their
//! boundary; the host's terminal handler is the single place the rest is
//! caught and rendered. Nothing below that boundary terminates the process.

use http::StatusCode;
use thiserror::Error;

/// Relational query failure. Carries the underlying driver message so a
/// caller can translate it uniformly, whichever call path raised it.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query failed: {0}")]
    Failed(String),

    #[error("unsupported parameter type: {0}")]
    UnsupportedParam(&'static str),

    #[error("database handle closed")]
    Closed,
}

/// Blob storage failure. Absence is its own kind; a missing entry must
/// never be conflated with a permission or disk error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no such object: {key}")]
    NotFound { key: String },

    #[error("io at {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Request/response conversion failure inside the bridge. Always rendered
/// as a JSON 500 at the host boundary, never a crash.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("inbound request: {0}")]
    Inbound(String),

    #[error("outbound response: {0}")]
    Outbound(String),
}

/// What a hosted router's `fetch` can fail with. The host maps it to an
/// HTTP status at its terminal boundary.
#[derive(Error, Debug)]
pub enum EdgeError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl EdgeError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Status the host renders for this failure. Absence maps to 404; every
    /// other kind is a 500-class outcome.
    pub fn http_status(&self) -> StatusCode {
        match self {
            EdgeError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
