//! File-backed cache storage with persistence.
//!
//! Each named cache lives in its own file under a root directory and is
//! rewritten on every mutation, so the on-disk state always matches what the
//! router last stored.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use swcache_core::error::{Result, SwcacheError};
use swcache_core::traits::{CacheStorage, CacheStore};
use swcache_core::types::{Headers, RequestKey, Response, ResponseKind};

use crate::memory::{CacheStats, MemoryCache};

/// File format magic bytes
const MAGIC: &[u8; 4] = b"SWCS";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version
const HEADER_LEN: usize = 5;
/// Extension of cache files
const EXTENSION: &str = "swcs";

/// On-disk representation of one cache.
///
/// ```text
/// magic (4 bytes): "SWCS"
/// version (1 byte): 1
/// payload (variable): JSON CacheFile
/// ```
#[derive(Serialize, Deserialize)]
struct CacheFile {
    name: String,
    created_at: DateTime<Utc>,
    saved_at: DateTime<Utc>,
    entries: Vec<StoredRecord>,
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    key: RequestKey,
    status: u16,
    status_text: String,
    headers: Headers,
    kind: ResponseKind,
    #[serde(with = "hex")]
    body: Vec<u8>,
}

impl StoredRecord {
    fn from_entry(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            kind: response.kind,
            body: response.body.to_vec(),
        }
    }

    fn into_entry(self) -> (RequestKey, Response) {
        let mut response = Response::new(self.status, self.body).with_status_text(self.status_text);
        response.headers = self.headers;
        response.kind = self.kind;
        (self.key, response)
    }
}

/// One named cache persisted to a single file.
pub struct FileCache {
    path: PathBuf,
    created_at: DateTime<Utc>,
    memory: MemoryCache,
    save_lock: Mutex<()>,
    deleted: AtomicBool,
}

impl FileCache {
    fn empty(name: &str, path: PathBuf) -> Self {
        Self {
            path,
            created_at: Utc::now(),
            memory: MemoryCache::new(name),
            save_lock: Mutex::new(()),
            deleted: AtomicBool::new(false),
        }
    }

    /// Loads a cache from its file.
    #[instrument]
    async fn load(path: PathBuf) -> Result<Self> {
        let contents = fs::read(&path).await?;

        if contents.len() < HEADER_LEN {
            return Err(SwcacheError::CacheStorage(format!(
                "File too short: {}",
                path.display()
            )));
        }
        if &contents[0..4] != MAGIC {
            return Err(SwcacheError::CacheStorage(format!(
                "Invalid magic bytes: {}",
                path.display()
            )));
        }
        let version = contents[4];
        if version != VERSION {
            return Err(SwcacheError::VersionMismatch {
                expected: VERSION,
                actual: version,
            });
        }

        let file: CacheFile = serde_json::from_slice(&contents[HEADER_LEN..])?;
        let memory = MemoryCache::new(file.name.as_str());
        let count = file.entries.len();
        memory.insert_all(file.entries.into_iter().map(StoredRecord::into_entry).collect());

        debug!(cache = %file.name, count, "Loaded cache file");

        Ok(Self {
            path,
            created_at: file.created_at,
            memory,
            save_lock: Mutex::new(()),
            deleted: AtomicBool::new(false),
        })
    }

    /// Writes the current entries to disk (temp file, then rename).
    ///
    /// A cache deleted from its storage is never written again, even if a
    /// caller still holds it.
    #[instrument(skip(self), fields(cache = %self.memory.name()))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        if self.deleted.load(Ordering::SeqCst) {
            warn!("Skipping save of deleted cache");
            return Ok(());
        }

        let entries: Vec<StoredRecord> = self
            .memory
            .snapshot()
            .into_iter()
            .map(|(k, r)| StoredRecord::from_entry(k, r))
            .collect();
        let file = CacheFile {
            name: self.memory.name().to_string(),
            created_at: self.created_at,
            saved_at: Utc::now(),
            entries,
        };
        let serialized = serde_json::to_vec(&file)?;

        let mut contents = Vec::with_capacity(HEADER_LEN + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(VERSION);
        contents.extend_from_slice(&serialized);

        let temp_path = self.path.with_extension("tmp");
        let mut out = fs::File::create(&temp_path).await?;
        out.write_all(&contents).await?;
        out.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(count = file.entries.len(), "Cache saved");
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the cache was first created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns statistics.
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }
}

#[async_trait]
impl CacheStore for FileCache {
    fn name(&self) -> &str {
        self.memory.name()
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>> {
        Ok(self.memory.get(key))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<()> {
        self.memory.insert(key, response);
        self.save().await
    }

    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<()> {
        self.memory.insert_all(entries);
        self.save().await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        let removed = self.memory.remove(key);
        if removed {
            self.save().await?;
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        self.memory.keys().await
    }
}

/// Set of named caches stored under one directory.
pub struct FileCacheStorage {
    root: PathBuf,
    caches: DashMap<String, Arc<FileCache>>,
}

impl FileCacheStorage {
    /// Opens the storage at `root`, loading every cache file found there.
    ///
    /// The directory is created if it does not exist. Corrupt or
    /// foreign-version files never fail the storage; they load as empty caches.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        let caches = DashMap::new();
        let mut dir = fs::read_dir(&root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match FileCache::load(path.clone()).await {
                Ok(cache) => {
                    caches.insert(cache.name().to_string(), Arc::new(cache));
                }
                // An unreadable file becomes an empty cache under its file name,
                // so it can still be pruned or rewritten.
                Err(e) => match name_from_path(&path) {
                    Some(name) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Unreadable cache file, treating as empty"
                        );
                        caches.insert(name.clone(), Arc::new(FileCache::empty(&name, path)));
                    }
                    None => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Skipping unreadable cache file"
                        );
                    }
                },
            }
        }

        info!(root = %root.display(), count = caches.len(), "Opened file cache storage");
        Ok(Self { root, caches })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the named cache without creating it.
    pub fn get(&self, name: &str) -> Option<Arc<FileCache>> {
        self.caches.get(name).map(|c| c.value().clone())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", hex::encode(name.as_bytes()), EXTENSION))
    }
}

/// Cache name encoded in a cache file name.
fn name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

#[async_trait]
impl CacheStorage for FileCacheStorage {
    #[instrument(skip(self))]
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        if let Some(existing) = self.get(name) {
            let cache: Arc<dyn CacheStore> = existing;
            return Ok(cache);
        }

        let fresh = Arc::new(FileCache::empty(name, self.path_for(name)));
        let winner = self
            .caches
            .entry(name.to_string())
            .or_insert_with(|| fresh.clone())
            .value()
            .clone();

        if Arc::ptr_eq(&winner, &fresh) {
            debug!(cache = name, "Creating cache file");
            winner.save().await?;
        }

        let cache: Arc<dyn CacheStore> = winner;
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.caches.contains_key(name))
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<bool> {
        let Some((_, cache)) = self.caches.remove(name) else {
            return Ok(false);
        };

        let _guard = cache.save_lock.lock().await;
        cache.deleted.store(true, Ordering::SeqCst);
        match fs::remove_file(&cache.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        debug!(cache = name, "Deleted cache file");
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut caches: Vec<_> = self
            .caches
            .iter()
            .map(|c| (c.value().created_at, c.key().clone()))
            .collect();
        caches.sort();
        Ok(caches.into_iter().map(|(_, name)| name).collect())
    }
}
