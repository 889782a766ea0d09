//! Cache Entry Module
//!
//! Value and bookkeeping types shared by the backends.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{CacheError, Result};

/// File extension of the raw payload file.
pub const BLOB_EXTENSION: &str = "blob";
/// File extension of the JSON metadata file.
pub const METADATA_EXTENSION: &str = "metadata";

// == Binary Data ==
/// Opaque payload plus string metadata, stored by the disk and remote caches.
///
/// An empty `metadata` map stands for "no metadata".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryData {
    pub data: Vec<u8>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl BinaryData {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds one metadata pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// == Disk Entry ==
/// Locator of a disk-backed entry: the blob and metadata file paths.
///
/// Returned instead of the payload so callers can stream the blob file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiskEntry {
    pub blob_file: PathBuf,
    pub metadata_file: PathBuf,
}

impl DiskEntry {
    /// Builds the locator of `key` under `folder`. The key is used verbatim.
    pub fn locate(folder: &Path, key: &str) -> Self {
        Self {
            blob_file: folder.join(format!("{key}.{BLOB_EXTENSION}")),
            metadata_file: folder.join(format!("{key}.{METADATA_EXTENSION}")),
        }
    }

    /// Reads the payload and metadata back into memory.
    pub async fn load(&self) -> Result<BinaryData> {
        let data = tokio::fs::read(&self.blob_file)
            .await
            .map_err(|e| CacheError::io(&self.blob_file, e))?;
        let raw = tokio::fs::read(&self.metadata_file)
            .await
            .map_err(|e| CacheError::io(&self.metadata_file, e))?;
        let metadata = serde_json::from_slice(&raw)?;
        Ok(BinaryData { data, metadata })
    }
}

// == Ttl ==
/// Lifetime policy of the memory cache.
///
/// Either one duration for every entry, or a supplier evaluated against the
/// stored value each time its age is checked.
pub enum Ttl<V> {
    Fixed(Duration),
    PerValue(Arc<dyn Fn(&V) -> Duration + Send + Sync>),
}

impl<V> Ttl<V> {
    pub fn per_value<F>(supplier: F) -> Self
    where
        F: Fn(&V) -> Duration + Send + Sync + 'static,
    {
        Ttl::PerValue(Arc::new(supplier))
    }

    /// Effective lifetime of `value`.
    pub fn of(&self, value: &V) -> Duration {
        match self {
            Ttl::Fixed(ttl) => *ttl,
            Ttl::PerValue(supplier) => supplier(value),
        }
    }
}

impl<V> From<Duration> for Ttl<V> {
    fn from(ttl: Duration) -> Self {
        Ttl::Fixed(ttl)
    }
}

impl<V> Clone for Ttl<V> {
    fn clone(&self) -> Self {
        match self {
            Ttl::Fixed(ttl) => Ttl::Fixed(*ttl),
            Ttl::PerValue(supplier) => Ttl::PerValue(Arc::clone(supplier)),
        }
    }
}

impl<V> fmt::Debug for Ttl<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Fixed(ttl) => f.debug_tuple("Fixed").field(ttl).finish(),
            Ttl::PerValue(_) => f.write_str("PerValue(..)"),
        }
    }
}

// == Memory Entry ==
/// A value held by the memory cache, stamped with its insertion time.
#[derive(Debug, Clone)]
pub(crate) struct MemoryEntry<V> {
    pub(crate) value: V,
    pub(crate) inserted_at: Instant,
}

impl<V> MemoryEntry<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    // == Is Expired ==
    /// An entry is expired once its full TTL has elapsed: `age >= ttl`.
    pub(crate) fn is_expired(&self, ttl: &Ttl<V>, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl.of(&self.value)
    }
}
