//! # SWCACHE Router
//!
//! Offline caching for a single web application.
//!
//! The [`CacheRouter`] owns the lifecycle of one versioned cache and decides,
//! for every outbound request, whether to answer from that cache, from the
//! network, or both:
//!
//! | Request                          | Handling                                    |
//! |----------------------------------|---------------------------------------------|
//! | method other than GET            | passed through untouched                    |
//! | different origin                 | passed through untouched                    |
//! | page navigation                  | network first, offline shell as fallback    |
//! | same-origin GET sub-resource     | configured strategy (stale-while-revalidate)|
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use swcache_router::CacheRouter;
//!
//! let router = CacheRouter::new(config, Arc::new(storage), Arc::new(fetcher))?;
//! router.install().await?;
//! router.activate().await?;
//!
//! let routed = router.respond(request).await?;
//! println!("{} from {}", routed.response.status, routed.source);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod lifecycle;
mod outcome;
mod router;
mod strategy;

pub use lifecycle::{ActivateReport, InstallReport, RouterState};
pub use outcome::{Interception, PassReason, ResponseSource, Revalidation, Route, RoutedResponse};
pub use router::CacheRouter;
