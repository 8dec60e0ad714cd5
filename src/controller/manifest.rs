//! Asset manifests and deploy version tags
//!
//! A deploy is a version tag plus the asset set that must be cached before
//! the generation counts as installed. The tag is the only signal that drives
//! install-vs-reuse; [`hash_directory`] derives one from asset contents.

use crate::cache::validate_version;
use crate::config::Config;
use crate::controller::Settings;
use crate::error::{ShellcacheError, ShellcacheResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Ordered asset paths, split by install-time failure policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    /// Install fails if any cannot be fetched
    pub required: Vec<String>,
    /// Failures are logged and skipped
    pub best_effort: Vec<String>,
}

impl AssetManifest {
    pub fn new(required: Vec<String>, best_effort: Vec<String>) -> Self {
        Self {
            required,
            best_effort,
        }
    }

    /// Resolve every path against the scope.
    ///
    /// Fails on the first asset outside the scope. Duplicate URLs are
    /// collapsed keeping the first occurrence; a URL listed as both required
    /// and best-effort is treated as required.
    pub fn resolve(&self, settings: &Settings) -> ShellcacheResult<ResolvedManifest> {
        let mut required: Vec<Url> = Vec::with_capacity(self.required.len());
        for asset in &self.required {
            let url = settings.resolve(asset)?;
            if !required.contains(&url) {
                required.push(url);
            }
        }

        let mut best_effort: Vec<Url> = Vec::with_capacity(self.best_effort.len());
        for asset in &self.best_effort {
            let url = settings.resolve(asset)?;
            if !required.contains(&url) && !best_effort.contains(&url) {
                best_effort.push(url);
            }
        }

        Ok(ResolvedManifest {
            required,
            best_effort,
        })
    }
}

/// Manifest with every path resolved to an absolute in-scope URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub required: Vec<Url>,
    pub best_effort: Vec<Url>,
}

/// One deploy of the app shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Version tag; a different tag means a new generation
    pub version: String,
    /// Assets to cache at install
    pub manifest: AssetManifest,
}

impl Deployment {
    /// Create a deployment, validating the version tag
    pub fn new(version: impl Into<String>, manifest: AssetManifest) -> ShellcacheResult<Self> {
        let version = version.into();
        validate_version(&version)?;
        Ok(Self { version, manifest })
    }

    /// Deployment described by `[controller] version` and `[manifest]`
    pub fn from_config(config: &Config) -> ShellcacheResult<Self> {
        Self::new(
            config.controller.version.clone(),
            AssetManifest::new(
                config.manifest.required.clone(),
                config.manifest.best_effort.clone(),
            ),
        )
    }
}

/// Collect regular files under `dir`, sorted by relative path
fn collect_files(dir: &Path, base: &Path, out: &mut Vec<PathBuf>) -> ShellcacheResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ShellcacheError::io(format!("reading directory {}", dir.display()), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| ShellcacheError::io("reading directory entry", e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| ShellcacheError::io(format!("inspecting {}", path.display()), e))?;

        if file_type.is_dir() {
            collect_files(&path, base, out)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(base) {
                out.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

/// Content hash of an asset directory, usable as a version tag.
///
/// Hashes every file's relative path and contents in sorted order with
/// SHA256, returning the first 12 hex chars. Same contents = same tag.
pub fn hash_directory(dir: &Path) -> ShellcacheResult<String> {
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for relative in &files {
        let contents = fs::read(dir.join(relative)).map_err(|e| {
            ShellcacheError::io(format!("reading asset {}", relative.display()), e)
        })?;
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }
    let result = hasher.finalize();

    debug!("Hashed {} files under {}", files.len(), dir.display());
    Ok(hex::encode(&result[..6]))
}
