//! Caching strategies.
//!
//! Every strategy degrades the same way: a network failure falls back to
//! whatever the cache holds, and only when that is empty does the caller see
//! [`SwcacheError::NoResponse`]. Cache reads and writes are best-effort;
//! a failing store is logged and treated as a miss.

use std::sync::Arc;

use tracing::{debug, warn, Instrument};

use swcache_core::error::{Result, SwcacheError};
use swcache_core::traits::{CacheStorage, CacheStore, Fetcher};
use swcache_core::types::{Request, RequestKey, Response};

use crate::outcome::{ResponseSource, Revalidation, RoutedResponse};

/// Partial content (206) cannot be stored as a full response.
const STATUS_PARTIAL_CONTENT: u16 = 206;

/// Shared handles every strategy works with.
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) cache_name: String,
    pub(crate) storage: Arc<dyn CacheStorage>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
}

impl Context {
    async fn open_cache(&self) -> Option<Arc<dyn CacheStore>> {
        match self.storage.open(&self.cache_name).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(cache = %self.cache_name, error = %e, "Cache unavailable");
                None
            }
        }
    }
}

async fn lookup(cache: Option<&Arc<dyn CacheStore>>, key: &RequestKey) -> Option<Response> {
    let cache = cache?;
    match cache.lookup(key).await {
        Ok(hit) => hit,
        Err(e) => {
            warn!(%key, error = %e, "Cache lookup failed");
            None
        }
    }
}

fn is_storable(response: &Response) -> bool {
    !response.is_error() && response.status != STATUS_PARTIAL_CONTENT
}

/// Stores a duplicate of `response`; the original stays with the caller.
async fn store_copy(cache: &dyn CacheStore, key: RequestKey, response: &Response) {
    if !is_storable(response) {
        debug!(%key, status = response.status, "Not storing response");
        return;
    }
    if let Err(e) = cache.put(key.clone(), response.duplicate()).await {
        warn!(%key, error = %e, "Cache write failed; response still delivered");
    }
}

fn no_response(request: &Request) -> SwcacheError {
    SwcacheError::NoResponse(request.url.to_string())
}

/// Navigations: fresh page from the network, stored for later; offline, the
/// application shell stored under `fallback_key`.
pub(crate) async fn network_first_with_fallback(
    ctx: &Context,
    request: Request,
    fallback_key: &RequestKey,
) -> Result<RoutedResponse> {
    match ctx.fetcher.fetch(&request).await {
        Ok(fresh) => {
            if let Some(cache) = ctx.open_cache().await {
                store_copy(cache.as_ref(), RequestKey::get(&request.url), &fresh).await;
            }
            Ok(RoutedResponse::new(fresh, ResponseSource::Network))
        }
        Err(e) => {
            warn!(url = %request.url, error = %e, "Navigation offline, serving shell");
            let cache = ctx.open_cache().await;
            match lookup(cache.as_ref(), fallback_key).await {
                Some(shell) => Ok(RoutedResponse::new(shell, ResponseSource::Fallback)),
                None => Err(no_response(&request)),
            }
        }
    }
}

/// Starts the network fetch that refreshes `key`.
fn spawn_refresh(
    fetcher: Arc<dyn Fetcher>,
    cache: Option<Arc<dyn CacheStore>>,
    request: Request,
    key: RequestKey,
) -> Revalidation {
    let span = tracing::debug_span!("revalidate", url = %request.url);
    let handle = tokio::spawn(
        async move {
            let fresh = match fetcher.fetch(&request).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    debug!(error = %e, "Revalidation fetch failed");
                    return Err(e);
                }
            };
            if let Some(cache) = cache {
                store_copy(cache.as_ref(), key, &fresh).await;
            }
            Ok(fresh)
        }
        .instrument(span),
    );
    Revalidation::new(handle)
}

/// Cached copy at once if there is one; the network refreshes the entry
/// either way.
pub(crate) async fn stale_while_revalidate(
    ctx: &Context,
    request: Request,
) -> Result<RoutedResponse> {
    let key = RequestKey::get(&request.url);
    let cache = ctx.open_cache().await;
    let cached = lookup(cache.as_ref(), &key).await;

    let url = request.url.clone();
    let revalidation = spawn_refresh(ctx.fetcher.clone(), cache, request, key);

    if let Some(hit) = cached {
        debug!(%url, "Serving stale, revalidating");
        let routed = RoutedResponse::new(hit, ResponseSource::Cache);
        return Ok(routed.with_revalidation(revalidation));
    }

    match revalidation.into_handle().await {
        Ok(Ok(fresh)) => Ok(RoutedResponse::new(fresh, ResponseSource::Network)),
        Ok(Err(_)) => Err(SwcacheError::NoResponse(url.to_string())),
        Err(e) => Err(SwcacheError::InternalError(format!("Revalidation task failed: {}", e))),
    }
}

/// Cache only; the network is used to fill a miss.
pub(crate) async fn cache_first(ctx: &Context, request: Request) -> Result<RoutedResponse> {
    let key = RequestKey::get(&request.url);
    let cache = ctx.open_cache().await;

    if let Some(hit) = lookup(cache.as_ref(), &key).await {
        return Ok(RoutedResponse::new(hit, ResponseSource::Cache));
    }

    match ctx.fetcher.fetch(&request).await {
        Ok(fresh) => {
            if let Some(cache) = &cache {
                store_copy(cache.as_ref(), key, &fresh).await;
            }
            Ok(RoutedResponse::new(fresh, ResponseSource::Network))
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Cache miss while offline");
            Err(no_response(&request))
        }
    }
}

/// Network when reachable, cache otherwise.
pub(crate) async fn network_first(ctx: &Context, request: Request) -> Result<RoutedResponse> {
    let key = RequestKey::get(&request.url);

    match ctx.fetcher.fetch(&request).await {
        Ok(fresh) => {
            if let Some(cache) = ctx.open_cache().await {
                store_copy(cache.as_ref(), key, &fresh).await;
            }
            Ok(RoutedResponse::new(fresh, ResponseSource::Network))
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Network failed, trying cache");
            let cache = ctx.open_cache().await;
            match lookup(cache.as_ref(), &key).await {
                Some(hit) => Ok(RoutedResponse::new(hit, ResponseSource::Cache)),
                None => Err(no_response(&request)),
            }
        }
    }
}
