//! JSON-backed entry store

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::journal::Entry;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "diarioEntries", default)]
    entries: Vec<Entry>,
}

/// Entry list persisted as one JSON document.
///
/// Entries are kept newest-added first.
pub struct EntryStore {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl EntryStore {
    /// Open the store at `path`; a missing file is an empty journal
    pub async fn open(path: impl Into<PathBuf>) -> ShellcacheResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                entries: vec![],
            });
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading journal {}", path.display()), e))?;
        let document: Document = serde_json::from_str(&content)?;
        debug!("Loaded {} entries from {}", document.entries.len(), path.display());

        Ok(Self {
            path,
            entries: document.entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry and persist
    pub async fn add(&mut self, entry: Entry) -> ShellcacheResult<&Entry> {
        self.entries.insert(0, entry);
        self.save().await?;
        Ok(&self.entries[0])
    }

    /// All entries, most recent date first
    pub fn list(&self) -> Vec<&Entry> {
        let mut sorted: Vec<&Entry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    /// Entries dated `date`
    pub fn on_date(&self, date: NaiveDate) -> Vec<&Entry> {
        self.list().into_iter().filter(|e| e.date == date).collect()
    }

    /// Delete an entry by id and persist
    pub async fn delete(&mut self, id: &str) -> ShellcacheResult<Entry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ShellcacheError::EntryNotFound(id.to_string()))?;
        let removed = self.entries.remove(index);
        self.save().await?;
        Ok(removed)
    }

    async fn save(&self) -> ShellcacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellcacheError::io("creating journal directory", e))?;
        }

        let document = serde_json::json!({ "diarioEntries": &self.entries });
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, content).await.map_err(|e| {
            ShellcacheError::io(format!("writing journal {}", self.path.display()), e)
        })?;
        Ok(())
    }
}
