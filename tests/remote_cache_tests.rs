//! Integration Tests for the Remote Object Cache
//!
//! Runs the cache against an in-memory object store that mimics a bucket
//! service, including its "no such key" and transport failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tiercache::{
    BinaryData, Cache, CacheError, ObjectStore, ObjectStoreError, RemoteCacheConfig,
    RemoteObjectCache, StoredObject,
};

// == Fake Object Store ==

#[derive(Default)]
struct FakeStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    unavailable: AtomicBool,
}

impl FakeStore {
    fn check_available(&self) -> Result<(), ObjectStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ObjectStoreError::other("service unavailable"))
        } else {
            Ok(())
        }
    }

    async fn keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self.objects.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, ObjectStoreError> {
        self.check_available()?;
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), ObjectStoreError> {
        self.check_available()?;
        let metadata = (!metadata.is_empty()).then_some(metadata);
        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), key.to_string()), StoredObject { body, metadata });
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.check_available()?;
        self.objects
            .lock()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// == Helper Functions ==

fn create_cache(prefix: &str) -> (Arc<FakeStore>, RemoteObjectCache<FakeStore>) {
    let store = Arc::new(FakeStore::default());
    let cache = RemoteObjectCache::new(
        Arc::clone(&store),
        RemoteCacheConfig::new("cache-bucket").with_prefix(prefix),
    );
    (store, cache)
}

// == Tests ==

#[tokio::test]
async fn test_set_then_get_returns_payload_and_metadata() {
    let (_, cache) = create_cache("");
    let value = BinaryData::new("one").with_metadata("spanish", "uno");

    let stored = cache.set("1", value.clone()).await.unwrap();
    assert_eq!(stored, value);
    assert_eq!(cache.get("1").await.unwrap(), Some(value));
}

#[tokio::test]
async fn test_get_never_written_key_is_miss() {
    let (_, cache) = create_cache("");
    assert_eq!(cache.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_other_remote_errors_propagate() {
    let (store, cache) = create_cache("");
    store.unavailable.store(true, Ordering::SeqCst);

    assert!(matches!(cache.get("k").await, Err(CacheError::Remote(_))));
    assert!(matches!(
        cache.set("k", BinaryData::new("v")).await,
        Err(CacheError::Remote(_))
    ));
    assert!(matches!(cache.invalidate("k").await, Err(CacheError::Remote(_))));
}

#[tokio::test]
async fn test_prefix_is_prepended_to_keys() {
    let (store, cache) = create_cache("tiles/");
    cache.set("a", BinaryData::new("x")).await.unwrap();

    assert_eq!(cache.object_key("a"), "tiles/a");
    assert_eq!(
        store.keys().await,
        vec![("cache-bucket".to_string(), "tiles/a".to_string())]
    );
}

#[tokio::test]
async fn test_absent_metadata_reads_as_empty() {
    let (_, cache) = create_cache("");
    cache.set("bare", BinaryData::new("x")).await.unwrap();

    let value = cache.get("bare").await.unwrap().unwrap();
    assert!(value.metadata.is_empty());
    assert_eq!(value.data, b"x");
}

#[tokio::test]
async fn test_invalidate_deletes_object() {
    let (store, cache) = create_cache("p/");
    cache.set("gone", BinaryData::new("x")).await.unwrap();

    cache.invalidate("gone").await.unwrap();

    assert_eq!(cache.get("gone").await.unwrap(), None);
    assert!(store.keys().await.is_empty());
}

#[tokio::test]
async fn test_overwrite_replaces_object() {
    let (_, cache) = create_cache("");
    cache.set("k", BinaryData::new("first")).await.unwrap();
    cache
        .set("k", BinaryData::new("second").with_metadata("v", "2"))
        .await
        .unwrap();

    assert_eq!(
        cache.get("k").await.unwrap(),
        Some(BinaryData::new("second").with_metadata("v", "2"))
    );
}
