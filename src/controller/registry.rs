//! Controller registrations by scope
//!
//! At most one controller exists per scope. Registering a deployment against
//! a scope that already has a controller reuses it, so repeated page loads
//! of the same deploy are no-ops.

use crate::controller::manifest::Deployment;
use crate::controller::service::{CacheController, RegisterOutcome};
use crate::error::{ShellcacheError, ShellcacheResult};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::debug;

/// Scope → controller map
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: Mutex<HashMap<String, CacheController>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> &'static ControllerRegistry {
        static REGISTRY: OnceLock<ControllerRegistry> = OnceLock::new();
        REGISTRY.get_or_init(ControllerRegistry::new)
    }

    /// Register `deployment` under the controller for its scope, creating
    /// the controller with `init` if the scope is new.
    pub async fn register<F>(
        &self,
        init: F,
        deployment: &Deployment,
    ) -> ShellcacheResult<(CacheController, RegisterOutcome)>
    where
        F: FnOnce() -> CacheController,
    {
        let controller = {
            let mut controllers = self.controllers.lock().await;
            let candidate = init();
            let scope = candidate.settings().scope.clone();
            controllers
                .entry(scope.clone())
                .or_insert_with(|| {
                    debug!("New registration for scope {}", scope);
                    candidate
                })
                .clone()
        };

        let outcome = controller.register(deployment).await?;
        Ok((controller, outcome))
    }

    /// Controller registered for `scope`
    pub async fn get(&self, scope: &str) -> Option<CacheController> {
        self.controllers.lock().await.get(scope).cloned()
    }

    /// Drop the controller for `scope`
    pub async fn unregister(&self, scope: &str) -> ShellcacheResult<CacheController> {
        self.controllers
            .lock()
            .await
            .remove(scope)
            .ok_or_else(|| ShellcacheError::NotRegistered(scope.to_string()))
    }

    pub async fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = self.controllers.lock().await.keys().cloned().collect();
        scopes.sort();
        scopes
    }
}
