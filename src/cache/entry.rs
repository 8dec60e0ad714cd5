//! Cached entries and generation naming

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Stored response snapshot for one request key.
///
/// Entries are never patched: a newer response for the same key replaces the
/// whole entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    /// Request key (method + URL without fragment)
    pub key: String,
    /// URL the entry was stored for
    pub url: String,
    /// Response snapshot
    pub response: Response,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    /// Snapshot `response` for `request`
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            key: request.cache_key(),
            url: request.url.to_string(),
            response: response.clone(),
            stored_at: Utc::now(),
        }
    }

    /// Body size in bytes
    pub fn size(&self) -> u64 {
        self.response.body.len() as u64
    }
}

/// Bytes kept verbatim in generation names; everything else is percent-encoded
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Longest accepted version tag, in bytes
pub const MAX_VERSION_LEN: usize = 64;

/// Check that a version tag is usable.
///
/// Tags are opaque: any non-empty string without control characters and at
/// most [`MAX_VERSION_LEN`] bytes long.
pub fn validate_version(version: &str) -> ShellcacheResult<()> {
    let valid = !version.is_empty()
        && version.len() <= MAX_VERSION_LEN
        && !version.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(ShellcacheError::InvalidVersion(version.to_string()))
    }
}

/// Generation cache name for a version (`{prefix}-{version}`).
///
/// Characters other than ASCII alphanumerics and `.-_` are percent-encoded,
/// as is a leading `.`, so every name is a single safe path component.
pub fn generation_name(prefix: &str, version: &str) -> String {
    let mut encoded = utf8_percent_encode(version, NAME_ENCODE_SET).to_string();
    if encoded.starts_with('.') {
        encoded.replace_range(..1, "%2E");
    }

    if prefix.is_empty() {
        encoded
    } else {
        format!("{}-{}", prefix, encoded)
    }
}
