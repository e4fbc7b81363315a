//! What the router decided and what it answered with.

use std::fmt;

use tokio::task::JoinHandle;
use tracing::warn;

use swcache_core::error::Result;
use swcache_core::types::{Request, Response};
use swcache_core::SubresourceStrategy;

/// Why a request was left alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassReason {
    /// Not a GET; mutating requests are never cached.
    NonGet,
    /// Targets another origin (API, auth); never cached or served stale.
    CrossOrigin,
}

/// Routing decision for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted.
    PassThrough(PassReason),
    /// Page navigation: network first, shell fallback.
    Navigation,
    /// Same-origin GET sub-resource with the configured strategy.
    Subresource(SubresourceStrategy),
}

/// Where a routed response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fresh from the network.
    Network,
    /// Stored entry for the request itself.
    Cache,
    /// Offline application shell served to a navigation.
    Fallback,
    /// Not intercepted; fetched as-is.
    PassThrough,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
            ResponseSource::PassThrough => "pass-through",
        };
        f.write_str(s)
    }
}

/// Background refresh of a cache entry still running after the response
/// was handed back.
///
/// Awaiting [`Revalidation::settled`] extends the caller's lifetime until the
/// refresh finishes. Dropping it leaves the refresh running detached.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<Result<Response>>,
}

impl Revalidation {
    pub(crate) fn new(handle: JoinHandle<Result<Response>>) -> Self {
        Self { handle }
    }

    /// Waits for the refresh. Returns true if the network answered.
    pub async fn settled(self) -> bool {
        match self.handle.await {
            Ok(Ok(_)) => true,
            Ok(Err(_)) => false,
            Err(e) => {
                warn!(error = %e, "Revalidation task aborted");
                false
            }
        }
    }

    pub(crate) fn into_handle(self) -> JoinHandle<Result<Response>> {
        self.handle
    }
}

/// A response chosen by the router.
#[derive(Debug)]
pub struct RoutedResponse {
    /// The response to hand to the page
    pub response: Response,
    /// Where it came from
    pub source: ResponseSource,
    /// Pending refresh, for stale-while-revalidate cache hits
    pub revalidation: Option<Revalidation>,
}

impl RoutedResponse {
    pub(crate) fn new(response: Response, source: ResponseSource) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }

    pub(crate) fn with_revalidation(mut self, revalidation: Revalidation) -> Self {
        self.revalidation = Some(revalidation);
        self
    }
}

/// Result of intercepting one request.
#[derive(Debug)]
pub enum Interception {
    /// Not intercepted; the request is handed back unmodified.
    PassThrough(Request),
    /// The router answered.
    Respond(RoutedResponse),
}

impl Interception {
    /// True if the request was not intercepted.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Interception::PassThrough(_))
    }
}
