//! Tiercache - composable TTL caches
//!
//! Memory, local disk and remote object store backends behind one
//! get/set/invalidate contract, with time-based expiry and throttled cleanup.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    BinaryData, Cache, CacheStats, DiskCache, DiskEntry, ExpiryMode, MemoryCache, ObjectStore,
    RemoteObjectCache, StoredObject, Throttle, Ttl,
};
pub use config::{DiskCacheConfig, RemoteCacheConfig};
pub use error::{CacheError, ObjectStoreError, Result};
pub use tasks::spawn_sweep_task;
