//! Cache storage abstraction
//!
//! A storage holds any number of named cache generations. Each generation is
//! an independent key-value map from request key to response snapshot.

use crate::cache::entry::CachedEntry;
use crate::error::ShellcacheResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Abstract cache storage interface
///
/// Implementations:
/// - [`MemoryStorage`](crate::cache::MemoryStorage): in-process, optional quota
/// - [`DiskStorage`](crate::cache::DiskStorage): one directory per generation
///
/// Every read and write is an independent operation. Concurrent writers to
/// the same key settle on last write wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a generation, creating it if it does not exist
    async fn open(&self, name: &str) -> ShellcacheResult<()>;

    /// Check whether a generation exists
    async fn has(&self, name: &str) -> ShellcacheResult<bool>;

    /// Snapshot of all generation names
    async fn keys(&self) -> ShellcacheResult<Vec<String>>;

    /// Delete a generation; returns whether it existed
    async fn delete(&self, name: &str) -> ShellcacheResult<bool>;

    /// Look up the entry stored for `request` in a generation.
    ///
    /// A missing generation is a miss, not an error.
    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellcacheResult<Option<CachedEntry>>;

    /// Store `response` for `request`, replacing any previous entry.
    ///
    /// Fails with `CacheNotFound` when the generation does not exist, so a
    /// deleted generation is never recreated by a late write.
    async fn put(&self, name: &str, request: &Request, response: &Response)
        -> ShellcacheResult<()>;

    /// Request keys stored in a generation
    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Handle to one opened generation
#[derive(Clone)]
pub struct Cache {
    name: String,
    storage: Arc<dyn CacheStorage>,
}

impl Cache {
    /// Open (or create) the generation `name`
    pub async fn open(storage: Arc<dyn CacheStorage>, name: &str) -> ShellcacheResult<Self> {
        storage.open(name).await?;
        Ok(Self {
            name: name.to_string(),
            storage,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for `request`, if any
    pub async fn match_request(&self, request: &Request) -> ShellcacheResult<Option<Response>> {
        Ok(self
            .storage
            .match_request(&self.name, request)
            .await?
            .map(|entry| entry.response))
    }

    /// Store a snapshot of `response` for `request`
    pub async fn put(&self, request: &Request, response: &Response) -> ShellcacheResult<()> {
        self.storage.put(&self.name, request, response).await
    }

    /// Stored request keys
    pub async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        self.storage.entries(&self.name).await
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("backend", &self.storage.backend_name())
            .finish()
    }
}
