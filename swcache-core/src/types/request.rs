//! Outbound requests and the keys cached responses are stored under.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SwcacheError};
use crate::types::Headers;

// ═══════════════════════════════════════════════════════════════════════════════
// METHOD
// ═══════════════════════════════════════════════════════════════════════════════

/// HTTP request method.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// Any other token, stored upper-cased.
    Other(String),
}

impl Method {
    /// Returns the canonical upper-case token.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(s) => s,
        }
    }

    /// Returns true for GET, the only method the router ever caches.
    pub fn is_get(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = SwcacheError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(SwcacheError::ConfigError(format!("Invalid HTTP method: {:?}", s)));
        }
        Ok(match token.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        })
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl TryFrom<String> for Method {
    type Error = SwcacheError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// How the request was initiated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    /// Sub-resource fetch restricted to the same origin.
    SameOrigin,
    /// Sub-resource fetch allowed across origins.
    #[default]
    Cors,
    /// Opaque cross-origin sub-resource fetch.
    NoCors,
}

/// An outbound request.
#[derive(Clone, Debug)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Absolute target URL
    pub url: Url,
    /// Initiation mode; `Navigate` marks a page navigation
    pub mode: RequestMode,
    /// Request headers
    pub headers: Headers,
    /// Request body, if any
    pub body: Option<Bytes>,
}

impl Request {
    /// Creates a request with no headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Marks the request as a top-level navigation.
    pub fn navigate(mut self) -> Self {
        self.mode = RequestMode::Navigate;
        self
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns true for top-level page navigations.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity a cached response is stored under: method + URL.
///
/// The fragment is never part of the identity, matching how caches ignore
/// `#...` when looking up a request. Only GET keys can be built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    method: Method,
    url: Url,
}

impl RequestKey {
    /// Builds the key for a GET of `url`.
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: Method::Get,
            url,
        }
    }

    /// The key's method (always GET).
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The key's URL without fragment.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test_case("get", Method::Get)]
    #[test_case("POST", Method::Post)]
    #[test_case(" Delete ", Method::Delete)]
    #[test_case("purge", Method::Other("PURGE".into()))]
    fn test_method_parse(raw: &str, expected: Method) {
        assert_eq!(raw.parse::<Method>().unwrap(), expected);
    }

    #[test]
    fn test_method_parse_rejects_garbage() {
        assert!("".parse::<Method>().is_err());
        assert!("GE T".parse::<Method>().is_err());
    }

    #[test]
    fn test_key_strips_fragment() {
        let a = RequestKey::get(&url("https://app.test/index.html#top"));
        let b = RequestKey::get(&url("https://app.test/index.html"));
        assert_eq!(a, b);
        assert_eq!(a.url().as_str(), "https://app.test/index.html");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = RequestKey::get(&url("https://app.test/data.json?v=1"));
        let b = RequestKey::get(&url("https://app.test/data.json?v=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_navigate_builder() {
        let req = Request::get(url("https://app.test/")).navigate();
        assert!(req.is_navigation());
        assert!(!Request::get(url("https://app.test/")).is_navigation());
    }

    #[test]
    fn test_key_json_shape() {
        let key = RequestKey::get(&url("https://app.test/a.png"));
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["url"], "https://app.test/a.png");
    }

    proptest! {
        #[test]
        fn prop_fragment_never_affects_key(path in "[a-z]{1,12}", frag in "[a-z0-9]{0,12}") {
            let base = url(&format!("https://app.test/{}", path));
            let mut with_frag = base.clone();
            with_frag.set_fragment(Some(&frag));
            prop_assert_eq!(RequestKey::get(&base), RequestKey::get(&with_frag));
        }
    }
}
