//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache controller settings
    pub controller: ControllerConfig,

    /// Install-time asset manifest
    pub manifest: ManifestConfig,

    /// Fetch strategy selection
    pub strategy: StrategyConfig,

    /// Network settings
    pub network: NetworkConfig,

    /// Storage locations
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Origin the app shell is served from
    pub origin: String,

    /// Registration scope path; only requests under it are intercepted
    pub scope: String,

    /// Prefix for generation cache names (`{prefix}-{version}`)
    pub cache_prefix: String,

    /// Version tag; must change whenever any cached asset changes.
    /// Opaque, at most 64 bytes; characters outside `[A-Za-z0-9._-]` are
    /// percent-encoded in the cache name.
    pub version: String,

    /// Document served to offline navigations, relative to scope
    pub offline_document: String,

    /// Activate a freshly installed generation without waiting for clients
    pub skip_waiting_on_install: bool,

    /// Background sync tags that reach the sync handler
    pub sync_tags: Vec<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            scope: "/".to_string(),
            cache_prefix: "diario-de-bordo".to_string(),
            version: "v1.0".to_string(),
            offline_document: "index.html".to_string(),
            skip_waiting_on_install: false,
            sync_tags: vec!["sync-entries".to_string()],
        }
    }
}

/// Asset manifest: paths relative to scope, or absolute paths inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Install fails if any of these cannot be fetched
    pub required: Vec<String>,

    /// Missing ones are logged and skipped
    pub best_effort: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            required: vec![
                "./".to_string(),
                "index.html".to_string(),
                "style.css".to_string(),
                "script.js".to_string(),
                "manifest.json".to_string(),
            ],
            best_effort: vec![
                "icons/icon-192x192.png".to_string(),
                "icons/icon-512x512.png".to_string(),
            ],
        }
    }
}

/// Which requests use network-first instead of cache-first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// File extensions served network-first (documents)
    pub network_first_extensions: Vec<String>,

    /// Path fragments served network-first (e.g. runtime API data)
    pub network_first_paths: Vec<String>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            network_first_extensions: vec!["html".to_string()],
            network_first_paths: vec!["/api/".to_string()],
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Serve assets from this directory instead of the HTTP origin
    pub asset_dir: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            asset_dir: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// State directory override (caches, registration record, journal)
    pub dir: Option<PathBuf>,
}
