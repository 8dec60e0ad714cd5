//! Error types for shellcache
//!
//! All modules use `ShellcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for shellcache operations
pub type ShellcacheResult<T> = Result<T, ShellcacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellcacheError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    // Manifest and scope errors
    #[error("Invalid version tag {0:?}: must be 1-64 bytes without control characters")]
    InvalidVersion(String),

    #[error("Asset {asset} is outside registration scope {scope}")]
    AssetOutsideScope { asset: String, scope: String },

    #[error("Invalid asset path {asset}: {reason}")]
    InvalidAsset { asset: String, reason: String },

    // Lifecycle errors
    #[error("Required asset {url} could not be cached: {reason}")]
    RequiredAsset { url: String, reason: String },

    #[error("No active cache generation")]
    NoActiveGeneration,

    #[error("Invalid lifecycle transition for {version}: {from} -> {to}")]
    InvalidTransition {
        version: String,
        from: String,
        to: String,
    },

    #[error("Controller not registered for scope {0}")]
    NotRegistered(String),

    #[error("Handler failed for {event}: {reason}")]
    Handler { event: String, reason: String },

    // Network errors
    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    // Storage errors
    #[error("Cache storage error for {cache}: {reason}")]
    Storage { cache: String, reason: String },

    #[error("Cache quota exceeded for {cache}: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        cache: String,
        needed: u64,
        available: u64,
    },

    #[error("Cache generation not found: {0}")]
    CacheNotFound(String),

    // Journal errors
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),

    #[error("Invalid journal entry: {0}")]
    EntryInvalid(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error for a cache generation
    pub fn storage(cache: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            cache: cache.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::RequiredAsset { .. } | Self::QuotaExceeded { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion(_) => Some("Set [controller] version, or run: shellcache manifest hash <dir>"),
            Self::AssetOutsideScope { .. } => {
                Some("Use relative asset paths, or prefix them with the registration scope")
            }
            Self::RequiredAsset { .. } => Some("Check the origin is reachable, then run: shellcache install"),
            Self::NoActiveGeneration => Some("Run: shellcache install"),
            Self::QuotaExceeded { .. } => Some("Run: shellcache cache clear"),
            _ => None,
        }
    }
}
