//! Message and notification contract with page clients
//!
//! Client → controller: [`ControlMessage`], posted by a page.
//! Controller → clients: [`Notification`], broadcast to every open page.
//! Both serialize as tagged JSON so a page shell can exchange them verbatim.

use crate::error::ShellcacheResult;
use serde::{Deserialize, Serialize};

/// Control message sent by a page client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Activate the waiting generation now, regardless of open clients
    SkipWaiting,
    /// Add runtime-discovered URLs to the active generation
    Precache { urls: Vec<String> },
}

impl ControlMessage {
    /// Parse a message posted as JSON
    pub fn from_json(json: &str) -> ShellcacheResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Broadcast from the controller to every page client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    /// A generation finished installing
    Installed {
        version: String,
        summary: InstallSummary,
    },
    /// An installed generation is waiting; the page may post skip-waiting
    UpdateAvailable { version: String },
    /// A generation failed to install; the previous one keeps serving
    InstallFailed { version: String, reason: String },
    /// A generation became active
    Activated { version: String },
    /// Open clients are now controlled by `version`
    ControllerChanged { version: String },
    /// Network reachability changed while serving fetches
    Connectivity { online: bool },
}

/// Asset that could not be cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAsset {
    pub url: String,
    pub reason: String,
}

/// Result of an install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSummary {
    /// URLs stored in the generation
    pub cached: Vec<String>,
    /// Best-effort URLs that were skipped
    pub skipped: Vec<SkippedAsset>,
}

impl InstallSummary {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of a precache message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheSummary {
    /// Generation the URLs were added to
    pub cache_name: String,
    pub cached: Vec<String>,
    pub skipped: Vec<SkippedAsset>,
}

/// Reply to a control message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Version that was activated, if anything was waiting or installing
    SkipWaiting { activated: Option<String> },
    /// Precache result
    Precached(PrecacheSummary),
}
