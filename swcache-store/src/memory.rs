//! In-memory cache storage.
//!
//! Fast, thread-safe storage suitable for tests and short-lived processes.
//! Also the working set behind [`FileCacheStorage`](crate::FileCacheStorage).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use swcache_core::error::Result;
use swcache_core::traits::{CacheStorage, CacheStore};
use swcache_core::types::{RequestKey, Response};

/// Stored entry with its insertion sequence.
#[derive(Debug)]
struct CacheEntry {
    response: Response,
    seq: u64,
}

/// One named in-memory cache.
///
/// Lookups hand out duplicates, so the stored body is never consumed.
#[derive(Debug)]
pub struct MemoryCache {
    name: String,
    created: u64,
    entries: RwLock<HashMap<RequestKey, CacheEntry>>,
    next_seq: AtomicU64,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sequence(name, 0)
    }

    fn with_sequence(name: impl Into<String>, created: u64) -> Self {
        Self {
            name: name.into(),
            created,
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Inserts without going through the async trait.
    pub fn insert(&self, key: RequestKey, response: Response) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.write().insert(key, CacheEntry { response, seq });
    }

    /// Inserts a batch under a single write lock.
    pub fn insert_all(&self, batch: Vec<(RequestKey, Response)>) {
        let mut entries = self.entries.write();
        for (key, response) in batch {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            entries.insert(key, CacheEntry { response, seq });
        }
    }

    /// Returns a duplicate of the stored response.
    pub fn get(&self, key: &RequestKey) -> Option<Response> {
        self.entries.read().get(key).map(|e| e.response.duplicate())
    }

    /// Removes an entry.
    pub fn remove(&self, key: &RequestKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Returns all entries as duplicates, in insertion order.
    pub fn snapshot(&self) -> Vec<(RequestKey, Response)> {
        let entries = self.entries.read();
        let mut ordered: Vec<_> = entries.iter().collect();
        ordered.sort_by_key(|(_, e)| e.seq);
        ordered
            .into_iter()
            .map(|(k, e)| (k.clone(), e.response.duplicate()))
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            entries: entries.len(),
            body_bytes: entries.values().map(|e| e.response.content_length()).sum(),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>> {
        Ok(self.get(key))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<()> {
        debug!(cache = %self.name, %key, status = response.status, "Storing response");
        self.insert(key, response);
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<()> {
        debug!(cache = %self.name, count = entries.len(), "Storing batch");
        self.insert_all(entries);
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        Ok(self.remove(key))
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        Ok(self.snapshot().into_iter().map(|(k, _)| k).collect())
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Stored entries
    pub entries: usize,
    /// Sum of stored body sizes
    pub body_bytes: usize,
}

/// In-memory set of named caches.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: DashMap<String, Arc<MemoryCache>>,
    next_created: AtomicU64,
}

impl MemoryCacheStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named cache without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<MemoryCache>> {
        self.caches.get(name).map(|c| c.value().clone())
    }

    /// Opens or creates the named cache, returning the concrete type.
    pub fn open_memory(&self, name: &str) -> Arc<MemoryCache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                let created = self.next_created.fetch_add(1, Ordering::SeqCst);
                debug!(cache = name, "Creating cache");
                Arc::new(MemoryCache::with_sequence(name, created))
            })
            .value()
            .clone()
    }

    /// Cache names in creation order.
    pub fn names(&self) -> Vec<String> {
        let mut caches: Vec<_> = self
            .caches
            .iter()
            .map(|c| (c.value().created, c.key().clone()))
            .collect();
        caches.sort();
        caches.into_iter().map(|(_, name)| name).collect()
    }

    /// Removes the named cache.
    pub fn remove(&self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    #[instrument(skip(self))]
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        let cache: Arc<dyn CacheStore> = self.open_memory(name);
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.caches.contains_key(name))
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.remove(name);
        if removed {
            debug!(cache = name, "Deleted cache");
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.names())
    }
}
