//! In-process cache storage

use crate::cache::entry::CachedEntry;
use crate::cache::storage::CacheStorage;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Generations kept in memory, in creation order
#[derive(Default)]
pub struct MemoryStorage {
    generations: RwLock<Vec<(String, HashMap<String, CachedEntry>)>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    /// Unbounded in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory storage whose total body size may not exceed `quota_bytes`
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            generations: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total stored body bytes across all generations
    pub async fn usage(&self) -> u64 {
        let generations = self.generations.read().await;
        generations
            .iter()
            .flat_map(|(_, entries)| entries.values())
            .map(CachedEntry::size)
            .sum()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> ShellcacheResult<()> {
        let mut generations = self.generations.write().await;
        if !generations.iter().any(|(n, _)| n == name) {
            debug!("Creating in-memory cache {}", name);
            generations.push((name.to_string(), HashMap::new()));
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.generations.read().await.iter().any(|(n, _)| n == name))
    }

    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        Ok(self
            .generations
            .read()
            .await
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|(n, _)| n != name);
        Ok(generations.len() != before)
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellcacheResult<Option<CachedEntry>> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, entries)| entries.get(&request.cache_key()))
            .cloned())
    }

    async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> ShellcacheResult<()> {
        let entry = CachedEntry::new(request, response);
        let mut generations = self.generations.write().await;

        if let Some(quota) = self.quota_bytes {
            let key = entry.key.as_str();
            let used: u64 = generations
                .iter()
                .flat_map(|(n, entries)| entries.iter().map(move |(k, e)| (n, k, e)))
                .filter(|(n, k, _)| !(n.as_str() == name && k.as_str() == key))
                .map(|(_, _, e)| e.size())
                .sum();
            let available = quota.saturating_sub(used);
            if entry.size() > available {
                return Err(ShellcacheError::QuotaExceeded {
                    cache: name.to_string(),
                    needed: entry.size(),
                    available,
                });
            }
        }

        let (_, entries) = generations
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| ShellcacheError::CacheNotFound(name.to_string()))?;
        entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>> {
        let generations = self.generations.read().await;
        let (_, entries) = generations
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| ShellcacheError::CacheNotFound(name.to_string()))?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
