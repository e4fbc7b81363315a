//! Platform capabilities the router runs against.
//!
//! The router never touches a global cache or network singleton. It is
//! handed implementations of these traits, which lets the same policy run
//! over in-memory storage in tests and file storage plus HTTP in the CLI.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Request, RequestKey, Response};

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORAGE TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// A set of named caches.
///
/// Implementations might use:
/// - In-memory maps (tests, short-lived processes)
/// - One file per cache on disk (CLI, persistent deployments)
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the named cache, creating it if absent.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>>;

    /// Returns true if a cache with this name exists.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Deletes the named cache. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Lists cache names in creation order.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// A single named cache mapping request keys to responses.
///
/// Each operation is atomic on its own; a read followed by a write is not.
/// Concurrent writers to the same key resolve last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name this store was opened under.
    fn name(&self) -> &str;

    /// Looks up a stored response, returning a fresh copy.
    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>>;

    /// Stores a response, replacing any previous entry for the key.
    async fn put(&self, key: RequestKey, response: Response) -> Result<()>;

    /// Stores several responses.
    ///
    /// The default writes one by one; backends that can should override this
    /// to make the whole batch visible at once.
    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<()> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    /// Removes an entry. Returns false if it did not exist.
    async fn delete(&self, key: &RequestKey) -> Result<bool>;

    /// Lists stored keys in insertion order.
    async fn keys(&self) -> Result<Vec<RequestKey>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for reaching the network.
///
/// An `Err` means the network itself was unreachable. HTTP error statuses are
/// ordinary responses and come back as `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs the request.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}
