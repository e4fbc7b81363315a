//! Domain types for SWCACHE.
//!
//! - [`Request`]: An outbound request the router may intercept
//! - [`RequestKey`]: The identity a cached response is stored under
//! - [`Response`]: A response whose body must be duplicated before it is shared
//! - [`Headers`]: Ordered, case-insensitive header list

mod headers;
mod request;
mod response;

pub use headers::*;
pub use request::*;
pub use response::*;
