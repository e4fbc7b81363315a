//! Router configuration.
//!
//! The cache version is configuration, never a literal edited per release:
//! it defaults to the build-time [`BUILD_CACHE_VERSION`] and can be
//! overridden at deploy time through `SWCACHE_VERSION`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::{Origin, Url};

use crate::constants::*;
use crate::error::{Result, SwcacheError};
use crate::types::RequestKey;

/// Scope used when none is configured.
const DEFAULT_SCOPE: &str = "http://localhost:8080/";

/// How same-origin GET sub-resources are served.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubresourceStrategy {
    /// Answer from cache at once, refresh the entry from the network in the background.
    #[default]
    StaleWhileRevalidate,
    /// Answer from cache; only go to the network (and fill the cache) on a miss.
    CacheFirst,
    /// Answer from the network; fall back to the cache when it is unreachable.
    NetworkFirst,
}

impl SubresourceStrategy {
    /// Kebab-case name used in config files and the environment.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubresourceStrategy::StaleWhileRevalidate => "stale-while-revalidate",
            SubresourceStrategy::CacheFirst => "cache-first",
            SubresourceStrategy::NetworkFirst => "network-first",
        }
    }
}

impl fmt::Display for SubresourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubresourceStrategy {
    type Err = SwcacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stale-while-revalidate" | "swr" => Ok(SubresourceStrategy::StaleWhileRevalidate),
            "cache-first" => Ok(SubresourceStrategy::CacheFirst),
            "network-first" => Ok(SubresourceStrategy::NetworkFirst),
            other => Err(SwcacheError::ConfigError(format!("Unknown strategy: {}", other))),
        }
    }
}

/// Configuration of one router instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Application scope; its origin is the application origin
    pub scope: Url,
    /// Cache name prefix, e.g. "route-stats-cache"
    pub cache_prefix: String,
    /// Cache version, e.g. "027"
    pub version: String,
    /// Paths fetched eagerly at install, relative to `scope`
    pub core_assets: Vec<String>,
    /// Document served to offline navigations, relative to `scope`
    pub fallback_path: String,
    /// Policy for same-origin GET sub-resources
    pub subresource_strategy: SubresourceStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            scope: Url::parse(DEFAULT_SCOPE).expect("default scope is a valid URL"),
            cache_prefix: DEFAULT_CACHE_PREFIX.into(),
            version: BUILD_CACHE_VERSION.into(),
            core_assets: DEFAULT_CORE_ASSETS.iter().map(|s| s.to_string()).collect(),
            fallback_path: DEFAULT_FALLBACK_PATH.into(),
            subresource_strategy: SubresourceStrategy::default(),
        }
    }
}

impl RouterConfig {
    /// Creates a configuration for the application served at `scope`.
    pub fn new(scope: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            scope: Url::parse(scope.as_ref())?,
            ..Default::default()
        })
    }

    /// Sets the cache version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replaces the core asset list.
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sub-resource strategy.
    pub fn with_strategy(mut self, strategy: SubresourceStrategy) -> Self {
        self.subresource_strategy = strategy;
        self
    }

    /// The current cache name: `{prefix}-v{version}`.
    pub fn cache_name(&self) -> String {
        format!("{}{}{}", self.cache_prefix, CACHE_VERSION_SEPARATOR, self.version)
    }

    /// The application origin (scheme, host, port).
    pub fn origin(&self) -> Origin {
        self.scope.origin()
    }

    /// Returns true if `url` shares the application origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin()
    }

    /// Resolves a path against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.scope.join(path)?)
    }

    /// Absolute URLs of the core assets, in manifest order.
    pub fn asset_urls(&self) -> Result<Vec<Url>> {
        self.core_assets.iter().map(|p| self.resolve(p)).collect()
    }

    /// Absolute URL of the navigation fallback document.
    pub fn fallback_url(&self) -> Result<Url> {
        self.resolve(&self.fallback_path)
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.scope.host().is_none() {
            return Err(SwcacheError::ConfigError(format!(
                "Scope must have a host: {}",
                self.scope
            )));
        }
        if self.cache_prefix.is_empty() || self.cache_prefix.chars().any(char::is_whitespace) {
            return Err(SwcacheError::ConfigError(format!(
                "Invalid cache prefix: {:?}",
                self.cache_prefix
            )));
        }
        if self.version.is_empty() || self.version.chars().any(char::is_whitespace) {
            return Err(SwcacheError::ConfigError(format!(
                "Invalid cache version: {:?}",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        for (path, url) in self.core_assets.iter().zip(self.asset_urls()?) {
            if !self.is_same_origin(&url) {
                return Err(SwcacheError::ConfigError(format!(
                    "Core asset is cross-origin: {}",
                    path
                )));
            }
            if !seen.insert(RequestKey::get(&url)) {
                return Err(SwcacheError::ConfigError(format!(
                    "Duplicate core asset: {}",
                    path
                )));
            }
        }

        if !self.is_same_origin(&self.fallback_url()?) {
            return Err(SwcacheError::ConfigError(format!(
                "Fallback is cross-origin: {}",
                self.fallback_path
            )));
        }

        Ok(())
    }

    /// Loads configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a variable lookup, starting from defaults.
    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match get(ENV_SCOPE) {
            Some(scope) => Self::new(scope)?,
            None => Self::default(),
        };

        if let Some(prefix) = get(ENV_CACHE_PREFIX) {
            config.cache_prefix = prefix;
        }
        if let Some(version) = get(ENV_VERSION) {
            config.version = version;
        }
        if let Some(assets) = get(ENV_ASSETS) {
            config.core_assets = assets
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(fallback) = get(ENV_FALLBACK) {
            config.fallback_path = fallback;
        }
        if let Some(strategy) = get(ENV_STRATEGY) {
            config.subresource_strategy = strategy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}
