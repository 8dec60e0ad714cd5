//! Validated controller settings
//!
//! Built from the `[controller]` and `[strategy]` config sections. All asset
//! and request paths are resolved against the registration scope here, so the
//! rest of the controller only ever sees absolute, in-scope URLs.

use crate::config::Config;
use crate::error::{ShellcacheError, ShellcacheResult};
use url::Url;

/// Settings for one cache controller
#[derive(Debug, Clone)]
pub struct Settings {
    /// Origin the controller serves
    pub origin: Url,
    /// Registration scope path, always starting and ending with `/`
    pub scope: String,
    /// Prefix for generation cache names
    pub cache_prefix: String,
    /// Offline navigation fallback, relative to scope
    pub offline_document: String,
    /// Activate right after install, without waiting for clients
    pub skip_waiting_on_install: bool,
    /// Sync tags that reach the sync handler
    pub sync_tags: Vec<String>,
    /// Extensions served network-first
    pub network_first_extensions: Vec<String>,
    /// Path fragments served network-first
    pub network_first_paths: Vec<String>,
}

impl Settings {
    /// Default settings for `origin`, scoped to `/`
    pub fn new(origin: Url) -> Self {
        let controller = crate::config::schema::ControllerConfig::default();
        let strategy = crate::config::schema::StrategyConfig::default();
        Self {
            origin,
            scope: "/".to_string(),
            cache_prefix: controller.cache_prefix,
            offline_document: controller.offline_document,
            skip_waiting_on_install: controller.skip_waiting_on_install,
            sync_tags: controller.sync_tags,
            network_first_extensions: strategy.network_first_extensions,
            network_first_paths: strategy.network_first_paths,
        }
    }

    /// Build settings from the loaded configuration
    pub fn from_config(config: &Config) -> ShellcacheResult<Self> {
        let origin = parse_origin(&config.controller.origin)?;
        Ok(Self {
            origin,
            scope: normalize_scope(&config.controller.scope),
            cache_prefix: config.controller.cache_prefix.clone(),
            offline_document: config.controller.offline_document.clone(),
            skip_waiting_on_install: config.controller.skip_waiting_on_install,
            sync_tags: config.controller.sync_tags.clone(),
            network_first_extensions: config.strategy.network_first_extensions.clone(),
            network_first_paths: config.strategy.network_first_paths.clone(),
        })
    }

    /// Builder-style scope setter
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = normalize_scope(scope);
        self
    }

    /// Builder-style cache prefix setter
    pub fn with_cache_prefix(mut self, prefix: &str) -> Self {
        self.cache_prefix = prefix.to_string();
        self
    }

    /// Builder-style skip-waiting-on-install setter
    pub fn with_skip_waiting_on_install(mut self, enabled: bool) -> Self {
        self.skip_waiting_on_install = enabled;
        self
    }

    /// Absolute URL of the scope root
    pub fn scope_url(&self) -> Url {
        let mut url = self.origin.clone();
        url.set_path(&self.scope);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    /// Whether `url` is same-origin and under the scope path
    pub fn in_scope(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin() && url.path().starts_with(&self.scope)
    }

    /// Resolve an asset path to an absolute in-scope URL.
    ///
    /// Relative paths resolve against the scope. Absolute paths and full
    /// URLs must already point inside it.
    pub fn resolve(&self, asset: &str) -> ShellcacheResult<Url> {
        let asset = asset.trim();
        if asset.is_empty() {
            return Err(ShellcacheError::InvalidAsset {
                asset: asset.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let url = match Url::parse(asset) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.scope_url()
                    .join(asset)
                    .map_err(|e| ShellcacheError::InvalidAsset {
                        asset: asset.to_string(),
                        reason: e.to_string(),
                    })?
            }
            Err(e) => {
                return Err(ShellcacheError::InvalidAsset {
                    asset: asset.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if !self.in_scope(&url) {
            return Err(ShellcacheError::AssetOutsideScope {
                asset: asset.to_string(),
                scope: self.scope.clone(),
            });
        }
        Ok(url)
    }

    /// URL of the offline navigation fallback
    pub fn offline_document_url(&self) -> ShellcacheResult<Url> {
        self.resolve(&self.offline_document)
    }
}

/// Parse the configured origin, dropping any path
pub fn parse_origin(origin: &str) -> ShellcacheResult<Url> {
    let mut url = Url::parse(origin).map_err(|e| ShellcacheError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ShellcacheError::InvalidOrigin {
            origin: origin.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Ensure the scope starts and ends with `/`
fn normalize_scope(scope: &str) -> String {
    let trimmed = scope.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
