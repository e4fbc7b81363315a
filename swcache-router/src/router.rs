//! The cache router.

use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Origin;

use swcache_core::config::{RouterConfig, SubresourceStrategy};
use swcache_core::error::{Result, SwcacheError};
use swcache_core::traits::{CacheStorage, Fetcher};
use swcache_core::types::{Request, RequestKey, Response};

use crate::lifecycle::{ActivateReport, InstallReport, RouterState};
use crate::outcome::{Interception, PassReason, ResponseSource, Route, RoutedResponse};
use crate::strategy::{self, Context};

/// Offline caching router for one application version.
///
/// The router holds no global state: the cache storage and the network are
/// injected, and the only identity it carries is the cache name derived from
/// its [`RouterConfig`].
///
/// # Lifecycle
///
/// 1. [`install`](Self::install) stores every core asset, all or nothing.
/// 2. [`activate`](Self::activate) deletes every other cache.
/// 3. [`respond`](Self::respond) / [`handle_fetch`](Self::handle_fetch) route
///    requests. Routing does not depend on the lifecycle state.
pub struct CacheRouter {
    config: RouterConfig,
    origin: Origin,
    fallback_key: RequestKey,
    ctx: Context,
    state: RwLock<RouterState>,
}

impl CacheRouter {
    /// Creates a router after validating `config`.
    pub fn new(
        config: RouterConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let origin = config.origin();
        let fallback_key = RequestKey::get(&config.fallback_url()?);
        let ctx = Context {
            cache_name: config.cache_name(),
            storage,
            fetcher,
        };

        Ok(Self {
            config,
            origin,
            fallback_key,
            ctx,
            state: RwLock::new(RouterState::Parsed),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Name of the current cache.
    pub fn cache_name(&self) -> &str {
        &self.ctx.cache_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RouterState {
        *self.state.read()
    }

    /// Moves to `next` if the current state is one of `allowed`.
    fn transition(&self, allowed: &[RouterState], next: RouterState) -> Result<RouterState> {
        let mut state = self.state.write();
        if !allowed.contains(&*state) {
            let expected = allowed
                .iter()
                .map(RouterState::as_str)
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(SwcacheError::InvalidState {
                expected,
                actual: state.to_string(),
            });
        }
        let previous = *state;
        *state = next;
        Ok(previous)
    }

    fn set_state(&self, next: RouterState) {
        *self.state.write() = next;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fetches every core asset and stores them in the current cache.
    ///
    /// All or nothing: if any asset fails to fetch or answers with a non-ok
    /// status, nothing is stored and the router becomes
    /// [`Redundant`](RouterState::Redundant). Repeating a successful install
    /// with the same assets rewrites the same entries.
    #[instrument(skip(self), fields(cache = %self.ctx.cache_name))]
    pub async fn install(&self) -> Result<InstallReport> {
        self.transition(
            &[
                RouterState::Parsed,
                RouterState::Installed,
                RouterState::Activated,
                RouterState::Redundant,
            ],
            RouterState::Installing,
        )?;

        match self.populate().await {
            Ok(assets_cached) => {
                self.set_state(RouterState::Installed);
                info!(assets_cached, "Installed");
                Ok(InstallReport {
                    cache_name: self.ctx.cache_name.clone(),
                    assets_cached,
                    skip_waiting: true,
                })
            }
            Err(e) => {
                self.set_state(RouterState::Redundant);
                warn!(error = %e, "Install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize> {
        let urls = self.config.asset_urls()?;
        let fetches = self
            .config
            .core_assets
            .iter()
            .zip(urls)
            .map(|(asset, url)| self.fetch_asset(asset, url));
        let entries = try_join_all(fetches).await?;
        let count = entries.len();

        let cache = self.ctx.storage.open(&self.ctx.cache_name).await?;
        cache.put_all(entries).await?;
        Ok(count)
    }

    async fn fetch_asset(&self, asset: &str, url: url::Url) -> Result<(RequestKey, Response)> {
        let request = Request::get(url);
        let response = self
            .ctx
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| SwcacheError::InstallFailed {
                asset: asset.to_string(),
                reason: e.to_string(),
            })?;

        if !response.ok() {
            return Err(SwcacheError::BadAssetStatus {
                asset: asset.to_string(),
                status: response.status,
            });
        }

        debug!(asset, bytes = response.content_length(), "Fetched core asset");
        Ok((RequestKey::get(&request.url), response))
    }

    /// Deletes every cache except the current one and takes control.
    ///
    /// Only allowed once installed; a failed install can never activate.
    #[instrument(skip(self), fields(cache = %self.ctx.cache_name))]
    pub async fn activate(&self) -> Result<ActivateReport> {
        self.transition(&[RouterState::Installed], RouterState::Activating)?;

        match self.prune().await {
            Ok(deleted) => {
                self.set_state(RouterState::Activated);
                info!(deleted = deleted.len(), "Activated");
                Ok(ActivateReport {
                    cache_name: self.ctx.cache_name.clone(),
                    deleted,
                    clients_claimed: true,
                })
            }
            Err(e) => {
                self.set_state(RouterState::Installed);
                warn!(error = %e, "Activation failed");
                Err(e)
            }
        }
    }

    async fn prune(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .ctx
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != self.ctx.cache_name)
            .collect();

        try_join_all(stale.iter().map(|name| self.ctx.storage.delete(name))).await?;

        for name in &stale {
            debug!(stale = %name, "Deleted old cache");
        }
        Ok(stale)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERCEPTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Decides how a request is handled, without touching cache or network.
    pub fn route(&self, request: &Request) -> Route {
        if !request.method.is_get() {
            return Route::PassThrough(PassReason::NonGet);
        }
        if request.url.origin() != self.origin {
            return Route::PassThrough(PassReason::CrossOrigin);
        }
        if request.is_navigation() {
            return Route::Navigation;
        }
        Route::Subresource(self.config.subresource_strategy)
    }

    /// Intercepts a request.
    ///
    /// Requests the router does not handle are handed back untouched in
    /// [`Interception::PassThrough`]; the cache is never consulted for them.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn handle_fetch(&self, request: Request) -> Result<Interception> {
        let routed = match self.route(&request) {
            Route::PassThrough(reason) => {
                debug!(?reason, "Not intercepting");
                return Ok(Interception::PassThrough(request));
            }
            Route::Navigation => {
                strategy::network_first_with_fallback(&self.ctx, request, &self.fallback_key).await?
            }
            Route::Subresource(SubresourceStrategy::StaleWhileRevalidate) => {
                strategy::stale_while_revalidate(&self.ctx, request).await?
            }
            Route::Subresource(SubresourceStrategy::CacheFirst) => {
                strategy::cache_first(&self.ctx, request).await?
            }
            Route::Subresource(SubresourceStrategy::NetworkFirst) => {
                strategy::network_first(&self.ctx, request).await?
            }
        };

        debug!(source = %routed.source, status = routed.response.status, "Responded");
        Ok(Interception::Respond(routed))
    }

    /// Intercepts a request and always produces a response.
    ///
    /// Pass-through requests go straight to the network unmodified.
    pub async fn respond(&self, request: Request) -> Result<RoutedResponse> {
        match self.handle_fetch(request).await? {
            Interception::Respond(routed) => Ok(routed),
            Interception::PassThrough(request) => {
                let response = self.ctx.fetcher.fetch(&request).await?;
                Ok(RoutedResponse::new(response, ResponseSource::PassThrough))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use swcache_core::types::Method;
    use swcache_fetch::OfflineFetcher;
    use swcache_store::MemoryCacheStorage;
    use test_case::test_case;

    struct NeverStorage;

    #[async_trait]
    impl CacheStorage for NeverStorage {
        async fn open(&self, _: &str) -> Result<Arc<dyn swcache_core::CacheStore>> {
            unreachable!("routing must not open caches")
        }
        async fn has(&self, _: &str) -> Result<bool> {
            unreachable!()
        }
        async fn delete(&self, _: &str) -> Result<bool> {
            unreachable!()
        }
        async fn keys(&self) -> Result<Vec<String>> {
            unreachable!()
        }
    }

    fn router(strategy: SubresourceStrategy) -> CacheRouter {
        let config = RouterConfig::new("https://app.test/")
            .unwrap()
            .with_version("027")
            .with_strategy(strategy);
        CacheRouter::new(config, Arc::new(NeverStorage), Arc::new(OfflineFetcher)).unwrap()
    }

    fn request(method: Method, url: &str) -> Request {
        Request::new(method, url.parse().unwrap())
    }

    #[test_case(Method::Post ; "post")]
    #[test_case(Method::Put ; "put")]
    #[test_case(Method::Patch ; "patch")]
    #[test_case(Method::Delete ; "delete")]
    #[test_case(Method::Head ; "head")]
    fn test_route_non_get(method: Method) {
        let r = router(SubresourceStrategy::default());
        assert_eq!(
            r.route(&request(method, "https://app.test/api")),
            Route::PassThrough(PassReason::NonGet)
        );
    }

    #[test_case("https://proj.supabase.co/auth/v1/token" ; "other host")]
    #[test_case("http://app.test/index.html" ; "other scheme")]
    #[test_case("https://app.test:8443/index.html" ; "other port")]
    fn test_route_cross_origin(url: &str) {
        let r = router(SubresourceStrategy::default());
        assert_eq!(
            r.route(&request(Method::Get, url).navigate()),
            Route::PassThrough(PassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_route_navigation_and_subresource() {
        let r = router(SubresourceStrategy::CacheFirst);
        assert_eq!(
            r.route(&request(Method::Get, "https://app.test/runs/42").navigate()),
            Route::Navigation
        );
        assert_eq!(
            r.route(&request(Method::Get, "https://app.test/icon-192.png")),
            Route::Subresource(SubresourceStrategy::CacheFirst)
        );
    }

    #[tokio::test]
    async fn test_pass_through_never_opens_cache() {
        let r = router(SubresourceStrategy::default());
        let original = request(Method::Post, "https://app.test/api").with_body("{}");

        let outcome = r.handle_fetch(original).await.unwrap();
        match outcome {
            Interception::PassThrough(req) => {
                assert_eq!(req.method, Method::Post);
                assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
            }
            Interception::Respond(_) => panic!("POST must pass through"),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = RouterConfig::default().with_version("");
        let result = CacheRouter::new(
            config,
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(OfflineFetcher),
        );
        assert!(matches!(result, Err(SwcacheError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let r = router(SubresourceStrategy::default());
        let err = r.activate().await.unwrap_err();
        assert!(matches!(err, SwcacheError::InvalidState { .. }));
        assert_eq!(r.state(), RouterState::Parsed);
    }
}
