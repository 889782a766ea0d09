//! Cache Module
//!
//! One get/set/invalidate contract over three storage backends, so callers
//! can stack them (memory, then disk, then remote) without branching on type.

mod disk;
mod entry;
mod memory;
mod remote;
mod stats;
mod throttle;

#[cfg(test)]
mod property_tests;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use disk::{DiskCache, ExpiryMode};
pub use entry::{BinaryData, DiskEntry, Ttl, BLOB_EXTENSION, METADATA_EXTENSION};
pub use memory::MemoryCache;
pub use remote::{ObjectStore, RemoteObjectCache, StoredObject};
pub use stats::CacheStats;
pub use throttle::Throttle;

// == Cache Trait ==
/// Contract shared by every backend.
///
/// `get` yields `Ok(None)` for a key that is absent or expired; errors are
/// reserved for unexpected I/O or remote failures. `set` returns what a
/// subsequent `get` of the same key would return.
#[async_trait]
pub trait Cache: Send + Sync {
    /// What callers store
    type Value: Send + 'static;
    /// What lookups hand back
    type Entry: Send + 'static;

    async fn get(&self, key: &str) -> Result<Option<Self::Entry>>;

    async fn set(&self, key: &str, value: Self::Value) -> Result<Self::Entry>;

    async fn invalidate(&self, key: &str) -> Result<()>;
}
