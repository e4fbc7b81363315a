//! Test doubles shared by the router integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use swcache_core::{
    CacheStorage, CacheStore, Fetcher, RequestKey, Request, Response, Result, RouterConfig,
    SubresourceStrategy, SwcacheError,
};
use swcache_router::CacheRouter;
use swcache_store::MemoryCacheStorage;

pub const SCOPE: &str = "https://app.test/";

pub fn config() -> RouterConfig {
    RouterConfig::new(SCOPE).unwrap().with_version("027")
}

pub fn url(path: &str) -> url::Url {
    url::Url::parse(SCOPE).unwrap().join(path).unwrap()
}

pub fn key(path: &str) -> RequestKey {
    RequestKey::get(&url(path))
}

/// Network double: serves bodies by path, can go offline, can hold responses.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, (u16, String)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fetcher serving 200s for every default core asset.
    pub fn with_shell() -> Arc<Self> {
        let fetcher = Self::new();
        for asset in swcache_core::DEFAULT_CORE_ASSETS {
            let path = url(asset).path().to_string();
            fetcher.serve(&path, &format!("body of {}", path));
        }
        fetcher
    }

    pub fn serve(&self, path: &str, body: &str) {
        self.serve_status(path, 200, body);
    }

    pub fn serve_status(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Holds every following response until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(SwcacheError::FetchFailed {
                url: request.url.to_string(),
                reason: "offline".into(),
            });
        }

        let route = self.routes.lock().get(request.url.path()).cloned();
        Ok(match route {
            Some((status, body)) => Response::new(status, body),
            None => Response::new(404, "not found"),
        })
    }
}

/// Storage wrapper counting every call that reaches cache storage.
pub struct CountingStorage {
    pub inner: MemoryCacheStorage,
    touches: AtomicUsize,
}

impl CountingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCacheStorage::new(),
            touches: AtomicUsize::new(0),
        })
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    /// Names and bodies of every stored entry, for before/after comparisons.
    pub fn snapshot(&self) -> Vec<(String, Vec<(String, Vec<u8>)>)> {
        self.inner
            .names()
            .into_iter()
            .map(|name| {
                let entries = self
                    .inner
                    .get(&name)
                    .map(|cache| {
                        cache
                            .snapshot()
                            .into_iter()
                            .map(|(k, r)| (k.to_string(), r.body.to_vec()))
                            .collect()
                    })
                    .unwrap_or_default();
                (name, entries)
            })
            .collect()
    }

    fn touch(&self) {
        self.touches.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for CountingStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        self.touch();
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool> {
        self.touch();
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.touch();
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.touch();
        self.inner.keys().await
    }
}

/// Storage whose caches accept reads but refuse every write.
#[derive(Default)]
pub struct FullStorage {
    inner: MemoryCacheStorage,
}

struct FullCache {
    inner: Arc<dyn CacheStore>,
}

#[async_trait]
impl CacheStore for FullCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>> {
        self.inner.lookup(key).await
    }

    async fn put(&self, key: RequestKey, _response: Response) -> Result<()> {
        Err(SwcacheError::QuotaExceeded(key.to_string()))
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FullStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        let inner = self.inner.open(name).await?;
        let cache: Arc<dyn CacheStore> = Arc::new(FullCache { inner });
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }
}

/// Storage whose every operation fails.
#[derive(Default)]
pub struct BrokenStorage;

fn broken() -> SwcacheError {
    SwcacheError::CacheStorage("storage unavailable".into())
}

#[async_trait]
impl CacheStorage for BrokenStorage {
    async fn open(&self, _name: &str) -> Result<Arc<dyn CacheStore>> {
        Err(broken())
    }

    async fn has(&self, _name: &str) -> Result<bool> {
        Err(broken())
    }

    async fn delete(&self, _name: &str) -> Result<bool> {
        Err(broken())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Err(broken())
    }
}

/// Storage whose caches open and accept writes but fail every read.
#[derive(Default)]
pub struct UnreadableStorage {
    pub inner: MemoryCacheStorage,
}

struct UnreadableCache {
    inner: Arc<dyn CacheStore>,
}

#[async_trait]
impl CacheStore for UnreadableCache {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, _key: &RequestKey) -> Result<Option<Response>> {
        Err(broken())
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<()> {
        self.inner.put(key, response).await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>> {
        Err(broken())
    }
}

#[async_trait]
impl CacheStorage for UnreadableStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        let inner = self.inner.open(name).await?;
        let cache: Arc<dyn CacheStore> = Arc::new(UnreadableCache { inner });
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }
}

pub fn router_with(
    config: RouterConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
) -> CacheRouter {
    CacheRouter::new(config, storage, fetcher).unwrap()
}

pub fn strategy_config(strategy: SubresourceStrategy) -> RouterConfig {
    config().with_strategy(strategy)
}
