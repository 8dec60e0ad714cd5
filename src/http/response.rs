//! Response model used uniformly for live, cached and synthetic responses

use crate::http::Headers;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status returned by the synthetic offline response
pub const OFFLINE_STATUS: u16 = 503;

/// Where a response came from, relative to the requesting origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response readable through CORS
    Cors,
    /// Cross-origin response without CORS access
    Opaque,
    /// A redirect that was not followed
    OpaqueRedirect,
    /// Generated locally, never from the network
    Synthetic,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::OpaqueRedirect => "opaqueredirect",
            Self::Synthetic => "synthetic",
        };
        write!(f, "{}", name)
    }
}

/// Response snapshot: status, ordered headers, body bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: Headers,
    #[serde(skip)]
    pub body: Vec<u8>,
    pub kind: ResponseType,
}

impl Response {
    /// Create a same-origin response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
            kind: ResponseType::Basic,
        }
    }

    /// Builder-style header setter
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Builder-style response type setter
    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// Synthetic placeholder returned when neither network nor cache can answer
    pub fn offline(url: &str) -> Self {
        let body = format!(
            "Offline: {} is not available without a network connection.\n",
            url
        );
        Self::new(OFFLINE_STATUS, body)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_kind(ResponseType::Synthetic)
    }

    /// 2xx status
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response may be written to a cache generation.
    ///
    /// Partial content and anything not same-origin is passed through but
    /// never stored.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.status != 206 && self.kind == ResponseType::Basic
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    /// Body as UTF-8 text, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
