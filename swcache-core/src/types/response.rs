//! Responses and how they are shared between the cache and the caller.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::Headers;

/// Whether a response carries content or stands for a network error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Ordinary response.
    #[default]
    Basic,
    /// Generic network-error response (status 0, empty body).
    Error,
}

/// A response.
///
/// A response body can be handed out once. `Response` is deliberately not
/// `Clone`: whoever needs to both store and return a response must call
/// [`Response::duplicate`] and give one copy to each side.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    /// Status code (0 for network errors)
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
    /// Basic or error
    pub kind: ResponseKind,
}

impl Response {
    /// Creates a basic response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Headers::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    /// Creates a 200 response.
    pub fn ok_with(body: impl Into<Bytes>) -> Self {
        Self::new(200, body).with_status_text("OK")
    }

    /// Creates the generic network-error response.
    pub fn error() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Headers::new(),
            body: Bytes::new(),
            kind: ResponseKind::Error,
        }
    }

    /// Sets the reason phrase.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// True for statuses in `200..=299`.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// True for the generic network-error response.
    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    /// Produces an independent copy with an identical body.
    pub fn duplicate(&self) -> Self {
        Self {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: self.kind,
        }
    }

    /// Consumes the response and returns its body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body length in bytes.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
