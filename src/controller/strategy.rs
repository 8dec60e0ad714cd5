//! Request classification for fetch interception

use crate::controller::Settings;
use crate::http::{Method, Request, Response};
use serde::Serialize;
use std::fmt;

/// How an intercepted request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Stored response if present, network otherwise
    CacheFirst,
    /// Network if reachable, stored response or offline fallback otherwise
    NetworkFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheFirst => write!(f, "cache-first"),
            Self::NetworkFirst => write!(f, "network-first"),
        }
    }
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    /// Active generation
    Cache,
    /// Live network
    Network,
    /// Cached root document standing in for an offline navigation
    OfflineDocument,
    /// Synthetic offline placeholder
    Offline,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::OfflineDocument => write!(f, "offline-document"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Response produced by the controller for an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
    pub strategy: Strategy,
}

/// Result of offering a request to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// Not intercepted; the caller goes to the network itself
    Passthrough,
    /// Answered by the controller
    Respond(Served),
}

impl FetchResponse {
    /// Served response, if the request was intercepted
    pub fn served(&self) -> Option<&Served> {
        match self {
            Self::Passthrough => None,
            Self::Respond(served) => Some(served),
        }
    }
}

/// Whether the controller intercepts `request` at all
pub fn intercepts(request: &Request, settings: &Settings) -> bool {
    request.method == Method::Get && settings.in_scope(&request.url)
}

/// Pick the strategy for an intercepted request.
///
/// Documents (HTML navigations, directory paths, configured extensions and
/// path fragments) go network-first; everything else cache-first.
pub fn classify(request: &Request, settings: &Settings) -> Strategy {
    let path = request.url.path();

    if request.accepts_html() || path.ends_with('/') {
        return Strategy::NetworkFirst;
    }

    let file_name = path.rsplit('/').next().unwrap_or("");
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        if settings
            .network_first_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
        {
            return Strategy::NetworkFirst;
        }
    }

    if settings
        .network_first_paths
        .iter()
        .any(|fragment| !fragment.is_empty() && path.contains(fragment.as_str()))
    {
        return Strategy::NetworkFirst;
    }

    Strategy::CacheFirst
}
