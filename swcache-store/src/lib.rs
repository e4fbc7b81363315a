//! # SWCACHE Store
//!
//! Cache storage backends for the SWCACHE router.
//!
//! This crate provides two implementations of
//! [`CacheStorage`](swcache_core::CacheStorage):
//!
//! - **Memory**: Named caches held in process memory
//! - **File**: Named caches persisted one file each under a root directory
//!
//! ## Example
//!
//! ```rust,ignore
//! use swcache_store::MemoryCacheStorage;
//!
//! let storage = MemoryCacheStorage::new();
//! let cache = storage.open("route-stats-cache-v027").await?;
//! cache.put(RequestKey::get(&url), Response::ok_with("shell")).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::{FileCache, FileCacheStorage};
pub use memory::{CacheStats, MemoryCache, MemoryCacheStorage};
