//! Generation lifecycle states

use crate::controller::messages::InstallSummary;
use crate::error::{ShellcacheError, ShellcacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one cache generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Filling the generation from the asset manifest
    Installing,
    /// Installed, waiting for the previous generation's clients to close
    Installed,
    /// Deleting stale generations and claiming clients
    Activating,
    /// Serving fetches
    Activated,
    /// Failed to install or superseded
    Redundant,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: Self) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Installing | Installed | Activating | Activated, Redundant)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// A cache generation and where it is in its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Version tag
    pub version: String,
    /// Storage cache name
    pub cache_name: String,
    /// Current state
    pub state: LifecycleState,
    /// Install result, once installed
    pub summary: Option<InstallSummary>,
    /// When the generation entered its current state
    pub updated_at: DateTime<Utc>,
}

impl Generation {
    /// A generation entering `installing`
    pub fn installing(version: &str, cache_name: &str) -> Self {
        Self {
            version: version.to_string(),
            cache_name: cache_name.to_string(),
            state: LifecycleState::Installing,
            summary: None,
            updated_at: Utc::now(),
        }
    }

    /// A generation restored straight into `activated` from persisted state
    pub fn restored(version: &str, cache_name: &str) -> Self {
        Self {
            version: version.to_string(),
            cache_name: cache_name.to_string(),
            state: LifecycleState::Activated,
            summary: None,
            updated_at: Utc::now(),
        }
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: LifecycleState) -> ShellcacheResult<StateChange> {
        if !self.state.can_transition_to(next) {
            return Err(ShellcacheError::InvalidTransition {
                version: self.version.clone(),
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(StateChange {
            version: self.version.clone(),
            state: next,
            at: self.updated_at,
        })
    }

    /// Trace record for the current state
    pub fn current(&self) -> StateChange {
        StateChange {
            version: self.version.clone(),
            state: self.state,
            at: self.updated_at,
        }
    }
}

/// One entry of the controller's state trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub version: String,
    pub state: LifecycleState,
    pub at: DateTime<Utc>,
}
