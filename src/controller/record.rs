//! Registration persistence
//!
//! The CLI runs one command per process, so the active generation is
//! recorded on disk after every change and restored on the next start.

use crate::error::{ShellcacheError, ShellcacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Persisted registration state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Registration scope
    pub scope: String,

    /// Origin the controller serves
    pub origin: String,

    /// Active version tag
    pub active_version: Option<String>,

    /// Cache name of the active generation
    pub cache_name: Option<String>,

    /// When the active generation was activated
    pub activated_at: Option<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// Load the record, `None` if nothing was registered yet
    pub async fn load(path: &Path) -> ShellcacheResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ShellcacheError::io(format!("reading registration {}", path.display()), e)
        })?;

        let record: RegistrationRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record
    pub async fn save(&self, path: &Path) -> ShellcacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShellcacheError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            ShellcacheError::io(format!("writing registration {}", path.display()), e)
        })?;

        Ok(())
    }

    /// Remove the record, if present
    pub async fn delete(path: &Path) -> ShellcacheResult<()> {
        if path.exists() {
            fs::remove_file(path).await.map_err(|e| {
                ShellcacheError::io(format!("deleting registration {}", path.display()), e)
            })?;
        }
        Ok(())
    }
}
