//! Remote Object Cache Module
//!
//! Stores each entry as one object in a remote bucket. Existence and expiry
//! are left entirely to the store; this layer only shapes requests and
//! translates "no such key" into a miss.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::entry::BinaryData;
use crate::cache::Cache;
use crate::config::RemoteCacheConfig;
use crate::error::{ObjectStoreError, Result};

// == Stored Object ==
/// Body and user metadata of a fetched object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    /// `None` when the store returned no metadata block at all
    pub metadata: Option<BTreeMap<String, String>>,
}

// == Object Store Trait ==
/// Minimal client surface of a remote object store (S3 and the like).
///
/// Implementations must report a missing key as `ObjectStoreError::NotFound`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> std::result::Result<StoredObject, ObjectStoreError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: BTreeMap<String, String>,
    ) -> std::result::Result<(), ObjectStoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> std::result::Result<(), ObjectStoreError>;
}

// == Remote Object Cache ==
/// Cache backend over an `ObjectStore`, one object per key at `prefix + key`.
pub struct RemoteObjectCache<S> {
    store: Arc<S>,
    config: RemoteCacheConfig,
}

impl<S> Clone for RemoteObjectCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: ObjectStore> RemoteObjectCache<S> {
    pub fn new(store: Arc<S>, config: RemoteCacheConfig) -> Self {
        Self { store, config }
    }

    /// Full object key of a cache key.
    pub fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl<S: ObjectStore + 'static> Cache for RemoteObjectCache<S> {
    type Value = BinaryData;
    type Entry = BinaryData;

    async fn get(&self, key: &str) -> Result<Option<BinaryData>> {
        let object_key = self.object_key(key);
        match self.store.get_object(&self.config.bucket, &object_key).await {
            Ok(object) => Ok(Some(BinaryData {
                data: object.body,
                metadata: object.metadata.unwrap_or_default(),
            })),
            Err(e) if e.is_not_found() => {
                debug!(bucket = %self.config.bucket, key = %object_key, "remote miss");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: BinaryData) -> Result<BinaryData> {
        let object_key = self.object_key(key);
        self.store
            .put_object(
                &self.config.bucket,
                &object_key,
                value.data.clone(),
                value.metadata.clone(),
            )
            .await?;
        Ok(value)
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let object_key = self.object_key(key);
        self.store
            .delete_object(&self.config.bucket, &object_key)
            .await?;
        Ok(())
    }
}
