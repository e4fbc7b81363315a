//! # SWCACHE Core
//!
//! Core types, errors, traits, and configuration for the SWCACHE offline
//! caching router.
//!
//! This crate provides the foundational building blocks used by all other SWCACHE crates:
//!
//! - **Types**: Requests, responses, and the keys that identify cached entries
//! - **Errors**: One error enum shared by the store, fetch, and router layers
//! - **Constants**: Default cache naming and the core asset manifest
//! - **Traits**: Platform capabilities (cache storage, network fetch) the router runs against
//! - **Config**: Router configuration loaded from code, environment, or JSON
//!
//! ## Example
//!
//! ```rust
//! use swcache_core::{Request, RouterConfig};
//!
//! let config = RouterConfig::new("https://app.example.com/").unwrap();
//! let request = Request::get(config.scope.join("index.html").unwrap()).navigate();
//!
//! assert!(request.is_navigation());
//! assert!(config.is_same_origin(&request.url));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{RouterConfig, SubresourceStrategy};
pub use constants::*;
pub use error::{Result, SwcacheError};
pub use traits::*;
pub use types::*;
