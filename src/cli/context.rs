//! Controller setup shared by commands
//!
//! Each CLI invocation builds a fresh controller over the on-disk caches and
//! restores the active generation from the registration record.

use crate::cache::DiskStorage;
use crate::cli::args::SourceArgs;
use crate::config::{Config, ConfigManager};
use crate::controller::{CacheController, RegistrationRecord, Settings};
use crate::error::ShellcacheResult;
use crate::network::{DirFetcher, Fetcher, HttpFetcher, OfflineFetcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Pick the fetcher for this invocation
pub fn fetcher(source: &SourceArgs, config: &Config, settings: &Settings) -> Arc<dyn Fetcher> {
    if source.offline {
        return Arc::new(OfflineFetcher);
    }

    match source.asset_dir.as_ref().or(config.network.asset_dir.as_ref()) {
        Some(dir) => Arc::new(DirFetcher::new(dir.clone(), &settings.origin, &settings.scope)),
        None => Arc::new(HttpFetcher::new(
            &settings.origin,
            Duration::from_secs(config.network.timeout_secs),
        )),
    }
}

/// Build the controller and restore the recorded active generation
pub async fn open_controller(
    config: &Config,
    source: &SourceArgs,
) -> ShellcacheResult<CacheController> {
    let settings = Settings::from_config(config)?;
    let fetcher = fetcher(source, config, &settings);
    debug!("Using {} fetcher", fetcher.fetcher_name());

    let storage = Arc::new(DiskStorage::new(ConfigManager::caches_dir(config)));
    let controller = CacheController::new(settings, storage, fetcher);

    let path = ConfigManager::registration_path(config);
    if let Some(record) = RegistrationRecord::load(&path).await? {
        let settings = controller.settings();
        let same_registration =
            record.scope == settings.scope && record.origin == settings.origin.as_str();

        match record.active_version {
            Some(version) if same_registration => {
                if !controller.restore(&version).await? {
                    warn!("Recorded generation {} is missing from storage", version);
                }
            }
            Some(version) => debug!(
                "Ignoring record for {} at {}{}",
                version, record.origin, record.scope
            ),
            None => {}
        }
    }

    Ok(controller)
}

/// Persist the controller's active generation
pub async fn save_record(controller: &CacheController, config: &Config) -> ShellcacheResult<()> {
    let snapshot = controller.snapshot().await;
    let settings = controller.settings();
    let record = RegistrationRecord {
        scope: settings.scope.clone(),
        origin: settings.origin.to_string(),
        active_version: snapshot.active.as_ref().map(|g| g.version.clone()),
        cache_name: snapshot.active.as_ref().map(|g| g.cache_name.clone()),
        activated_at: snapshot.active.as_ref().map(|g| g.updated_at),
    };
    record.save(&ConfigManager::registration_path(config)).await
}
