//! Segmented cache store for response snapshots
//!
//! The store is a map of named segments, each holding request identity →
//! response snapshot. Segments are created lazily on first write and deleted
//! only whole (lifecycle activation or a control-channel clear), never entry
//! by entry. Entry-level atomicity is all the store guarantees; concurrent
//! logical requests may interleave freely and last write wins.

use crate::models::ResponseSnapshot;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A cached response snapshot plus its insertion timestamp
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The captured response
    pub snapshot: ResponseSnapshot,
    /// When this entry was written
    pub stored_at: SystemTime,
}

/// Store statistics for introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub segments: usize,
    pub entries: usize,
    pub declared_bytes: u64,
}

/// Key/value persistence over named segments
pub struct CacheStore {
    segments: RwLock<HashMap<String, HashMap<String, StoredEntry>>>,
}

impl CacheStore {
    /// Create an empty CacheStore
    pub fn new() -> Self {
        CacheStore {
            segments: RwLock::new(HashMap::new()),
        }
    }

    /// Look up an entry by key within a segment
    ///
    /// # Arguments
    /// * `segment` - Segment name to search
    /// * `key` - Request identity key
    /// * `max_age` - Optional freshness bound; entries older than this count
    ///   as a miss
    ///
    /// # Returns
    /// The stored snapshot, or `None` on miss or staleness
    pub async fn lookup(
        &self,
        segment: &str,
        key: &str,
        max_age: Option<Duration>,
    ) -> Option<ResponseSnapshot> {
        let segments = self.segments.read().await;
        let entry = segments.get(segment)?.get(key)?;

        if let Some(max_age) = max_age {
            let age = SystemTime::now()
                .duration_since(entry.stored_at)
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                debug!(segment, key, age_secs = age.as_secs(), "cache entry stale");
                return None;
            }
        }

        debug!(segment, key, size = entry.snapshot.body.len(), "cache hit");
        Some(entry.snapshot.clone())
    }

    /// Look up a key across every segment, first match wins
    ///
    /// Used for the designated offline root entry, which may live in either
    /// the static or dynamic segment depending on how it was cached.
    pub async fn lookup_any(&self, key: &str) -> Option<ResponseSnapshot> {
        let segments = self.segments.read().await;
        for entries in segments.values() {
            if let Some(entry) = entries.get(key) {
                return Some(entry.snapshot.clone());
            }
        }
        None
    }

    /// Write an entry, creating the segment lazily and overwriting any
    /// previous value for the key
    pub async fn store(&self, segment: &str, key: &str, snapshot: ResponseSnapshot) {
        let mut segments = self.segments.write().await;
        let entries = segments.entry(segment.to_string()).or_default();
        debug!(segment, key, size = snapshot.body.len(), "cache write");
        entries.insert(
            key.to_string(),
            StoredEntry {
                snapshot,
                stored_at: SystemTime::now(),
            },
        );
    }

    /// Write a batch of entries into a segment under a single lock
    ///
    /// The whole batch becomes visible at once; a reader never observes a
    /// partially written batch. Callers are responsible for only handing over
    /// complete batches (install's all-or-nothing rule lives in the lifecycle
    /// manager, which drops the batch before this point on any fetch failure).
    pub async fn store_batch(&self, segment: &str, batch: Vec<(String, ResponseSnapshot)>) {
        let mut segments = self.segments.write().await;
        let entries = segments.entry(segment.to_string()).or_default();
        let now = SystemTime::now();
        debug!(segment, count = batch.len(), "cache batch write");
        for (key, snapshot) in batch {
            entries.insert(
                key,
                StoredEntry {
                    snapshot,
                    stored_at: now,
                },
            );
        }
    }

    /// Names of all existing segments
    pub async fn segment_names(&self) -> Vec<String> {
        self.segments.read().await.keys().cloned().collect()
    }

    /// Number of entries in a segment (0 if the segment does not exist)
    pub async fn entry_count(&self, segment: &str) -> usize {
        self.segments
            .read()
            .await
            .get(segment)
            .map(|e| e.len())
            .unwrap_or(0)
    }

    /// Delete a whole segment and all its entries
    ///
    /// # Returns
    /// `true` if the segment existed
    pub async fn delete_segment(&self, segment: &str) -> bool {
        let removed = self.segments.write().await.remove(segment).is_some();
        if removed {
            debug!(segment, "segment deleted");
        }
        removed
    }

    /// Delete every segment not named in the allow-list
    ///
    /// The enumeration and deletion happen under one write lock, so no reader
    /// observes a half-collected generation.
    ///
    /// # Returns
    /// The names of the segments that were deleted
    pub async fn retain_segments(&self, allow: &[String]) -> Vec<String> {
        let mut segments = self.segments.write().await;
        let doomed: Vec<String> = segments
            .keys()
            .filter(|name| !allow.contains(name))
            .cloned()
            .collect();
        for name in &doomed {
            segments.remove(name);
            warn!(segment = %name, "stale segment removed during activation");
        }
        doomed
    }

    /// Delete every segment unconditionally
    ///
    /// # Returns
    /// The number of segments deleted
    pub async fn clear_all(&self) -> usize {
        let mut segments = self.segments.write().await;
        let count = segments.len();
        segments.clear();
        debug!(count, "all segments cleared");
        count
    }

    /// Sum of declared content-lengths across every entry in every segment
    ///
    /// Entries without a parsable content-length header contribute 0.
    pub async fn total_declared_bytes(&self) -> u64 {
        let segments = self.segments.read().await;
        segments
            .values()
            .flat_map(|entries| entries.values())
            .map(|entry| entry.snapshot.declared_content_length())
            .sum()
    }

    /// Snapshot of current store statistics
    pub async fn stats(&self) -> StoreStats {
        let segments = self.segments.read().await;
        let entries = segments.values().map(|e| e.len()).sum();
        let declared_bytes = segments
            .values()
            .flat_map(|e| e.values())
            .map(|entry| entry.snapshot.declared_content_length())
            .sum();
        StoreStats {
            segments: segments.len(),
            entries,
            declared_bytes,
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    fn snapshot(body: &'static str, content_length: Option<&'static str>) -> ResponseSnapshot {
        let mut headers = HeaderMap::new();
        if let Some(len) = content_length {
            headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from_static(len));
        }
        ResponseSnapshot::new(StatusCode::OK, headers, Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = CacheStore::new();
        let snap = snapshot("hello", Some("5"));

        store.store("static-v1", "GET /k", snap.clone()).await;
        let got = store.lookup("static-v1", "GET /k", None).await.unwrap();

        assert_eq!(got.status, snap.status);
        assert_eq!(got.body, snap.body);
        assert_eq!(got.headers, snap.headers);
    }

    #[tokio::test]
    async fn test_miss() {
        let store = CacheStore::new();
        assert!(store.lookup("static-v1", "GET /missing", None).await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_same_key() {
        let store = CacheStore::new();
        store.store("static-v1", "GET /k", snapshot("old", None)).await;
        store.store("static-v1", "GET /k", snapshot("new", None)).await;

        assert_eq!(store.entry_count("static-v1").await, 1);
        let got = store.lookup("static-v1", "GET /k", None).await.unwrap();
        assert_eq!(got.body, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_stale_entry_is_a_miss() {
        let store = CacheStore::new();
        store.store("dynamic-v1", "GET /k", snapshot("x", None)).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        let fresh = store
            .lookup("dynamic-v1", "GET /k", Some(Duration::from_secs(60)))
            .await;
        assert!(fresh.is_some());

        let stale = store
            .lookup("dynamic-v1", "GET /k", Some(Duration::from_millis(1)))
            .await;
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_lookup_any_searches_all_segments() {
        let store = CacheStore::new();
        store.store("dynamic-v1", "GET /", snapshot("root", None)).await;

        assert!(store.lookup_any("GET /").await.is_some());
        assert!(store.lookup_any("GET /other").await.is_none());
    }

    #[tokio::test]
    async fn test_retain_segments_deletes_whole_generations() {
        let store = CacheStore::new();
        store.store("static-v1", "GET /a", snapshot("a", None)).await;
        store.store("dynamic-v1", "GET /b", snapshot("b", None)).await;
        store.store("static-v0", "GET /c", snapshot("c", None)).await;

        let allow = vec!["static-v1".to_string(), "dynamic-v1".to_string()];
        let deleted = store.retain_segments(&allow).await;

        assert_eq!(deleted, vec!["static-v0".to_string()]);
        let mut names = store.segment_names().await;
        names.sort();
        assert_eq!(names, vec!["dynamic-v1", "static-v1"]);
        assert!(store.lookup("static-v0", "GET /c", None).await.is_none());
    }

    #[tokio::test]
    async fn test_total_declared_bytes() {
        let store = CacheStore::new();
        store.store("static-v1", "GET /a", snapshot("a", Some("100"))).await;
        store.store("dynamic-v1", "GET /b", snapshot("b", Some("250"))).await;
        store.store("dynamic-v1", "GET /c", snapshot("c", None)).await;

        assert_eq!(store.total_declared_bytes().await, 350);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = CacheStore::new();
        store.store("static-v1", "GET /a", snapshot("a", Some("10"))).await;
        store.store("dynamic-v1", "GET /b", snapshot("b", Some("20"))).await;

        assert_eq!(store.clear_all().await, 2);
        assert_eq!(store.total_declared_bytes().await, 0);
        assert!(store.segment_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_write_visible_at_once() {
        let store = CacheStore::new();
        let batch = vec![
            ("GET /".to_string(), snapshot("root", None)),
            ("GET /posts".to_string(), snapshot("posts", None)),
        ];
        store.store_batch("static-v1", batch).await;

        assert_eq!(store.entry_count("static-v1").await, 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = CacheStore::new();
        store.store("static-v1", "GET /a", snapshot("a", Some("5"))).await;

        let stats = store.stats().await;
        assert_eq!(
            stats,
            StoreStats {
                segments: 1,
                entries: 1,
                declared_bytes: 5,
            }
        );
    }
}
