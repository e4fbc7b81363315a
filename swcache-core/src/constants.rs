//! Constants for SWCACHE.
//!
//! Default cache naming, the core asset manifest of the application shell,
//! and the environment variable names the configuration layer reads.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE NAMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default prefix of the versioned cache name.
pub const DEFAULT_CACHE_PREFIX: &str = "route-stats-cache";

/// Separator placed between prefix and version in a cache name.
pub const CACHE_VERSION_SEPARATOR: &str = "-v";

/// Cache version baked in at build time.
///
/// Set `SWCACHE_CACHE_VERSION` when compiling a release to stamp it; falls
/// back to the crate version otherwise.
pub const BUILD_CACHE_VERSION: &str = match option_env!("SWCACHE_CACHE_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION SHELL
// ═══════════════════════════════════════════════════════════════════════════════

/// Paths fetched eagerly at install, relative to the application scope.
pub const DEFAULT_CORE_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.json",
    "./icon-180.png",
    "./icon-192.png",
    "./icon-512.png",
];

/// Document served to navigations when the network is unreachable.
pub const DEFAULT_FALLBACK_PATH: &str = "./index.html";

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Application scope URL (origin is derived from it).
pub const ENV_SCOPE: &str = "SWCACHE_SCOPE";

/// Cache name prefix.
pub const ENV_CACHE_PREFIX: &str = "SWCACHE_CACHE_PREFIX";

/// Deploy-time cache version override.
pub const ENV_VERSION: &str = "SWCACHE_VERSION";

/// Comma separated core asset list.
pub const ENV_ASSETS: &str = "SWCACHE_ASSETS";

/// Navigation fallback path.
pub const ENV_FALLBACK: &str = "SWCACHE_FALLBACK";

/// Sub-resource strategy name.
pub const ENV_STRATEGY: &str = "SWCACHE_STRATEGY";
