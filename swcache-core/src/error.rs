//! Error types for SWCACHE.
//!
//! This module provides a single error hierarchy using `thiserror`, shared by
//! the storage backends, the network fetchers, and the router itself.

use thiserror::Error;

/// Result type alias using `SwcacheError`.
pub type Result<T> = std::result::Result<T, SwcacheError>;

/// Main error type for all SWCACHE operations.
#[derive(Debug, Error)]
pub enum SwcacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The network fetch itself failed (offline, DNS, TLS, reset).
    #[error("Network fetch failed for '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Fetch timed out.
    #[error("Fetch timed out after {seconds}s: {url}")]
    FetchTimeout { url: String, seconds: u64 },

    /// Neither network nor cache could answer the request.
    #[error("No response available for {0}")]
    NoResponse(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A core asset could not be fetched during install.
    #[error("Install failed on asset '{asset}': {reason}")]
    InstallFailed { asset: String, reason: String },

    /// A core asset answered with a non-ok status during install.
    #[error("Install failed on asset '{asset}': bad status {status}")]
    BadAssetStatus { asset: String, status: u16 },

    /// Lifecycle step attempted from the wrong state.
    #[error("Invalid router state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Generic cache storage failure.
    #[error("Cache storage error: {0}")]
    CacheStorage(String),

    /// Storage refused the write for lack of space.
    #[error("Cache quota exceeded while storing {0}")]
    QuotaExceeded(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// On-disk format version mismatch.
    #[error("Storage format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE I/O ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SwcacheError {
    /// Returns true if this error is recoverable (the next request may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SwcacheError::FetchFailed { .. }
                | SwcacheError::FetchTimeout { .. }
                | SwcacheError::NoResponse(_)
                | SwcacheError::QuotaExceeded(_)
        )
    }

    /// Returns true if this error came from the network side.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            SwcacheError::FetchFailed { .. } | SwcacheError::FetchTimeout { .. }
        )
    }

    /// Returns true if this error came from cache storage.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            SwcacheError::CacheStorage(_)
                | SwcacheError::QuotaExceeded(_)
                | SwcacheError::VersionMismatch { .. }
                | SwcacheError::IoError(_)
        )
    }
}
