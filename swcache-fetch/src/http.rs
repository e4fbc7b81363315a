//! HTTP fetcher backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use swcache_core::error::{Result, SwcacheError};
use swcache_core::traits::Fetcher;
use swcache_core::types::{Headers, Request, Response};

/// HTTP fetcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout in seconds; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: concat!("swcache/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpFetcherConfig {
    /// Sets a request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Fetches requests over HTTP.
///
/// Transport failures become [`SwcacheError::FetchFailed`] or
/// [`SwcacheError::FetchTimeout`]. Any HTTP status, including 4xx and 5xx,
/// is a successful fetch.
pub struct HttpFetcher {
    config: HttpFetcherConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Creates a fetcher with custom configuration.
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let http_client = builder.build().map_err(|e| {
            SwcacheError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> SwcacheError {
        match self.config.timeout_seconds {
            Some(seconds) if err.is_timeout() => SwcacheError::FetchTimeout {
                url: url.to_string(),
                seconds,
            },
            _ => SwcacheError::FetchFailed {
                url: url.to_string(),
                reason: err.to_string(),
            },
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = request.url.as_str();
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| SwcacheError::ConfigError(format!("Invalid method: {}", e)))?;

        let mut builder = self.http_client.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Network fetch failed");
            self.map_error(url, e)
        })?;

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(|e| self.map_error(url, e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Fetched");

        let mut out = Response::new(status.as_u16(), body)
            .with_status_text(status.canonical_reason().unwrap_or_default());
        out.headers = headers;
        Ok(out)
    }
}
