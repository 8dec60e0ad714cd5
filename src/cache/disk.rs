//! On-disk cache storage
//!
//! Layout:
//!
//! ```text
//! {root}/{generation}/{sha256(key)}.json   entry metadata
//! {root}/{generation}/{sha256(key)}.body   response body
//! ```
//!
//! Both files are written to a temporary name and renamed into place, body
//! first, so a reader never sees metadata without its body.

use crate::cache::entry::CachedEntry;
use crate::cache::storage::CacheStorage;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Generations stored as directories under a root
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Create a storage rooted at `root` (created lazily)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn entry_stem(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> ShellcacheResult<()> {
        let dir = self.generation_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("creating cache dir {}", dir.display()), e))
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(fs::metadata(self.generation_dir(name))
            .await
            .is_ok_and(|m| m.is_dir()))
    }

    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellcacheError::io("reading cache root", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io("reading cache root entry", e))?
        {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        let dir = self.generation_dir(name);
        if !self.has(name).await? {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("removing cache dir {}", dir.display()), e))?;
        debug!("Removed cache dir {}", dir.display());
        Ok(true)
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellcacheResult<Option<CachedEntry>> {
        let stem = Self::entry_stem(&request.cache_key());
        let dir = self.generation_dir(name);
        let meta_path = dir.join(format!("{}.json", stem));

        let meta = match fs::read_to_string(&meta_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellcacheError::io(
                    format!("reading cache entry {}", meta_path.display()),
                    e,
                ))
            }
        };

        let mut entry: CachedEntry = serde_json::from_str(&meta)?;
        let body_path = dir.join(format!("{}.body", stem));
        match fs::read(&body_path).await {
            Ok(body) => entry.response.body = body,
            Err(e) => {
                warn!("Cache entry {} has no readable body: {}", entry.key, e);
                return Ok(None);
            }
        }

        Ok(Some(entry))
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellcacheResult<()> {
        if !self.has(name).await? {
            return Err(ShellcacheError::CacheNotFound(name.to_string()));
        }

        let entry = CachedEntry::new(request, response);
        let stem = Self::entry_stem(&entry.key);
        let dir = self.generation_dir(name);

        let body_path = dir.join(format!("{}.body", stem));
        Self::write_atomic(&body_path, &entry.response.body)
            .await
            .map_err(|e| ShellcacheError::storage(name, format!("writing body: {}", e)))?;

        let meta = serde_json::to_vec_pretty(&entry)?;
        let meta_path = dir.join(format!("{}.json", stem));
        Self::write_atomic(&meta_path, &meta)
            .await
            .map_err(|e| ShellcacheError::storage(name, format!("writing metadata: {}", e)))?;

        Ok(())
    }

    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>> {
        let dir = self.generation_dir(name);
        if !self.has(name).await? {
            return Err(ShellcacheError::CacheNotFound(name.to_string()));
        }

        let mut keys = vec![];
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading cache dir {}", dir.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io("reading cache dir entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path).await.ok();
                if let Some(content) = content {
                    if let Ok(cached) = serde_json::from_str::<CachedEntry>(&content) {
                        keys.push(cached.key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
