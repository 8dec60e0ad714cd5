//! Journal entries

use crate::error::{ShellcacheError, ShellcacheResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dated journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Day the entry is about
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// New entry; title and description are trimmed and must not be empty
    pub fn new(title: &str, description: &str, date: NaiveDate) -> ShellcacheResult<Self> {
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() {
            return Err(ShellcacheError::EntryInvalid("title is empty".to_string()));
        }
        if description.is_empty() {
            return Err(ShellcacheError::EntryInvalid(
                "description is empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            date,
            created_at: Utc::now(),
        })
    }
}
