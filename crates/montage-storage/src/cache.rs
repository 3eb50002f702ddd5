//! Content-addressed blob cache and JSON helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Key-value blob store used to memoize expensive service results.
#[async_trait]
pub trait BlobCache: Send + Sync {
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Fetch a blob; `None` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;
}

/// Process-local cache, used for tests and single-run jobs.
#[derive(Debug, Default)]
pub struct InMemoryBlobCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl InMemoryBlobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobCache for InMemoryBlobCache {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self
            .entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false))
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .entries
            .read()
            .ok()
            .and_then(|e| e.get(key).cloned()))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Load and decode a JSON cache entry.
///
/// Returns `None` if:
/// - The key doesn't exist
/// - The download fails
/// - The payload doesn't decode (corrupt or stale data)
pub async fn load_json<T: DeserializeOwned>(cache: &dyn BlobCache, key: &str) -> Option<T> {
    let data = match cache.get(key).await {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!(key = %key, "Cache miss");
            return None;
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Cache read failed, treating as miss");
            return None;
        }
    };

    match serde_json::from_slice(&data) {
        Ok(value) => {
            debug!(key = %key, "Cache hit");
            Some(value)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Cache entry is corrupt, treating as miss");
            None
        }
    }
}

/// Encode `value` as JSON and write it under `key`.
pub async fn store_json<T: Serialize + ?Sized>(
    cache: &dyn BlobCache,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let data = serde_json::to_vec(value)?;
    debug!(key = %key, bytes = data.len(), "Writing cache entry");
    cache.put(key, data).await
}

/// Resource id without its file extension, used as a cache key stem.
pub fn resource_stem(resource_id: &str) -> &str {
    let name_start = resource_id.rfind('/').map_or(0, |i| i + 1);
    match resource_id[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &resource_id[..name_start + dot],
        _ => resource_id,
    }
}

/// Cache key for the shot-detection result of one video.
///
/// Format: `shot_clips/{detector_version}/{resource_stem}_clip_info.json`
pub fn shot_clip_cache_key(resource_id: &str, detector_version: &str) -> String {
    format!(
        "shot_clips/{}/{}_clip_info.json",
        detector_version,
        resource_stem(resource_id)
    )
}

/// Cache key for the sub-split pieces of one shot clip.
///
/// Format: `shot_splits/{parent_resource_stem}.json`
pub fn split_cache_key(parent_resource_id: &str) -> String {
    format!("shot_splits/{}.json", resource_stem(parent_resource_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        start: i64,
        end: i64,
    }

    #[test]
    fn test_resource_stem() {
        assert_eq!(resource_stem("videos/abc.mp4"), "videos/abc");
        assert_eq!(resource_stem("abc"), "abc");
        assert_eq!(resource_stem("dir.v2/abc"), "dir.v2/abc");
        assert_eq!(resource_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(resource_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(
            shot_clip_cache_key("v/abc.mp4", "det-2"),
            "shot_clips/det-2/v/abc_clip_info.json"
        );
        assert_eq!(split_cache_key("clip_7.mp4"), "shot_splits/clip_7.json");
    }

    #[tokio::test]
    async fn test_json_roundtrip_through_memory_cache() {
        let cache = InMemoryBlobCache::new();
        let entries = vec![Entry { start: 0, end: 10 }];
        store_json(&cache, "k", &entries).await.unwrap();

        let loaded: Option<Vec<Entry>> = load_json(&cache, "k").await;
        assert_eq!(loaded, Some(entries));
        assert_eq!(cache.write_count(), 1);
        assert!(cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let cache = InMemoryBlobCache::new();
        cache.put("k", b"not json".to_vec()).await.unwrap();
        let loaded: Option<Vec<Entry>> = load_json(&cache, "k").await;
        assert!(loaded.is_none());

        let missing: Option<Vec<Entry>> = load_json(&cache, "absent").await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_put_on_poisoned_lock_is_not_counted() {
        let cache = InMemoryBlobCache::new();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = cache.entries.write().unwrap();
                    panic!("writer panicked while holding the lock");
                })
                .join();
        });

        let err = cache.put("k", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, StorageError::LockPoisoned));
        assert_eq!(cache.write_count(), 0);
    }
}
