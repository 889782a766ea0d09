//! Error types for the cache backends
//!
//! Provides unified error handling using thiserror. A missing or expired
//! entry is never an error: every backend reports it as `Ok(None)`.

use std::path::PathBuf;

use thiserror::Error;

// == Object Store Error ==
/// Failure reported by a remote object store client.
///
/// `NotFound` must be kept distinguishable from every other failure, since the
/// remote cache turns it into a cache miss.
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// The bucket holds no object under the requested key
    #[error("No such key: {0}")]
    NotFound(String),

    /// Any other client, transport or service failure
    #[error("Object store request failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ObjectStoreError {
    /// Wraps an arbitrary client error as a non-not-found failure.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ObjectStoreError::Other(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectStoreError::NotFound(_))
    }
}

// == Cache Error Enum ==
/// Unified error type for all cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure other than "does not exist" on the lookup path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata file could not be encoded or decoded
    #[error("Invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Remote object store failure other than a missing key
    #[error("Remote store error: {0}")]
    Remote(#[from] ObjectStoreError),

    /// Construction-time configuration problem
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Attaches the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache backends.
pub type Result<T> = std::result::Result<T, CacheError>;
