//! # SWCACHE Fetch
//!
//! Implementations of [`Fetcher`](swcache_core::Fetcher), the router's view
//! of the network.
//!
//! - [`HttpFetcher`]: real HTTP via `reqwest`
//! - [`OfflineFetcher`]: always unreachable, for exercising offline paths

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod http;
mod offline;

pub use http::{HttpFetcher, HttpFetcherConfig};
pub use offline::OfflineFetcher;
