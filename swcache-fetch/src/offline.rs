//! A network that is never there.

use async_trait::async_trait;
use tracing::debug;

use swcache_core::error::{Result, SwcacheError};
use swcache_core::traits::Fetcher;
use swcache_core::types::{Request, Response};

/// Fetcher that fails every request as if the device were offline.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        debug!(url = %request.url, "Offline: refusing fetch");
        Err(SwcacheError::FetchFailed {
            url: request.url.to_string(),
            reason: "offline".into(),
        })
    }
}
