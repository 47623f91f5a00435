//! In-memory object store
//!
//! Keeps buckets in a map and talks to the local filesystem for the file side
//! of each transfer. Tests use it to drive the engine without a network:
//! page size and per-key failures are configurable, and every attempted key
//! and every `connect` call is recorded.

use super::{ObjectListing, ObjectStore, StoreConnector, StoreError, StoreResult, DEFAULT_PAGE_SIZE};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Default)]
struct Shared {
    buckets: RwLock<Buckets>,
    failing_keys: RwLock<HashSet<String>>,
    attempts: Mutex<Vec<String>>,
    connections: AtomicUsize,
}

/// Object store backed by process memory
///
/// Clones share the same buckets, so a test can keep one handle for
/// assertions while the engine works through others.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    page_size: usize,
}

impl MemoryStore {
    /// Create an empty store with the default page size
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Limit how many keys one listing call returns
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create an empty bucket
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets_mut().entry(bucket.to_string()).or_default();
    }

    /// Store an object, creating the bucket if needed
    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) {
        self.buckets_mut()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
    }

    /// Read an object back
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// All keys of a bucket in lexicographic order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every transfer touching `key` fail with a network error
    pub fn fail_on(&self, key: &str) {
        self.shared
            .failing_keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
    }

    /// Keys passed to get/put so far, in call order
    pub fn attempted_keys(&self) -> Vec<String> {
        self.attempts().clone()
    }

    /// Number of clients handed out by `connect`
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    fn buckets(&self) -> RwLockReadGuard<'_, Buckets> {
        self.shared.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn buckets_mut(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.shared.buckets.write().unwrap_or_else(|e| e.into_inner())
    }

    fn attempts(&self) -> MutexGuard<'_, Vec<String>> {
        self.shared.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_attempt(&self, key: &str) -> StoreResult<()> {
        self.attempts().push(key.to_string());

        let failing = self
            .shared
            .failing_keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key);
        if failing {
            return Err(StoreError::Network(format!("injected failure for {}", key)));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectListing> {
        let buckets = self.buckets();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;

        // The token is the last key of the previous page
        let mut matching = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| match &continuation_token {
                Some(after) => key.as_str() > after.as_str(),
                None => true,
            });

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let next_token = match matching.next() {
            Some(_) => keys.last().cloned(),
            None => None,
        };

        Ok(ObjectListing { keys, next_token })
    }

    async fn get_object_to_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> StoreResult<()> {
        self.record_attempt(key)?;

        let data = self.get(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        tokio::fs::write(local_path, data).await?;
        Ok(())
    }

    async fn put_object_from_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> StoreResult<()> {
        self.record_attempt(key)?;

        if !self.buckets().contains_key(bucket) {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }
        let data = tokio::fs::read(local_path).await?;
        self.put(bucket, key, &data);
        Ok(())
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    type Store = MemoryStore;

    async fn connect(&self) -> StoreResult<MemoryStore> {
        self.shared.connections.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_listing_pages_follow_tokens() {
        let store = MemoryStore::new().with_page_size(2);
        for key in ["m/a", "m/b", "m/c", "other/d"] {
            store.put("bucket", key, b"x");
        }

        let first = store.list_objects("bucket", "m/", None).await.unwrap();
        assert_eq!(first.keys, vec!["m/a", "m/b"]);
        assert!(first.is_truncated());

        let second = store
            .list_objects("bucket", "m/", first.next_token)
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["m/c"]);
        assert!(!second.is_truncated());
    }

    #[tokio::test]
    async fn test_exact_page_is_not_truncated() {
        let store = MemoryStore::new().with_page_size(2);
        store.put("bucket", "m/a", b"x");
        store.put("bucket", "m/b", b"x");

        let page = store.list_objects("bucket", "m/", None).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let store = MemoryStore::new();
        let err = store.list_objects("nope", "m/", None).await.unwrap_err();
        assert!(matches!(err, StoreError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_round_trip_through_files() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new();
        store.put("bucket", "m/a.bin", b"weights");

        let local = dir.path().join("a.bin");
        store.get_object_to_file("bucket", "m/a.bin", &local).await.unwrap();
        assert_eq!(std::fs::read(&local).unwrap(), b"weights");

        store.put_object_from_file(&local, "bucket", "copy/a.bin").await.unwrap();
        assert_eq!(store.get("bucket", "copy/a.bin").unwrap(), b"weights");
        assert_eq!(store.attempted_keys(), vec!["m/a.bin", "copy/a.bin"]);
    }

    #[tokio::test]
    async fn test_injected_failure_and_connections() {
        let store = MemoryStore::new();
        store.put("bucket", "m/a", b"x");
        store.fail_on("m/a");

        let client = store.connect().await.unwrap();
        let dir = tempdir().unwrap();
        let err = client
            .get_object_to_file("bucket", "m/a", &dir.path().join("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
        assert_eq!(store.connections(), 1);
        assert_eq!(store.attempted_keys(), vec!["m/a"]);
    }
}
