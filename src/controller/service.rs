//! The cache controller
//!
//! One `CacheController` owns every piece of mutable lifecycle state for a
//! registration scope. Handles are cheap clones of the same inner state.
//!
//! Lifecycle work (install, activate, messages, sync, push) is serialized by
//! a single async lock, so those handlers never overlap. Fetch handling only
//! reads a snapshot of the active generation and never waits on lifecycle
//! work.

use crate::cache::{generation_name, validate_version, Cache, CacheStorage};
use crate::controller::clients::{ClientTable, PageClient};
use crate::controller::dispatch::{Dispatcher, Event, EventKind, EventOutcome, Handler};
use crate::controller::lifecycle::{Generation, LifecycleState, StateChange};
use crate::controller::manifest::{Deployment, ResolvedManifest};
use crate::controller::messages::{
    ControlMessage, InstallSummary, MessageOutcome, Notification, PrecacheSummary, SkippedAsset,
};
use crate::controller::strategy::{classify, intercepts, FetchResponse, ResponseSource, Served, Strategy};
use crate::controller::sync::{NoopSync, SyncHandler};
use crate::controller::Settings;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use crate::network::Fetcher;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

/// Max state changes kept in the trace
const TRACE_CAPACITY: usize = 256;

/// Notifications buffered per client before the oldest are dropped
const NOTIFICATION_CAPACITY: usize = 64;

/// Result of registering a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Version already active or waiting; nothing was fetched
    Unchanged { version: String },
    /// Installed and activated
    Activated {
        version: String,
        summary: InstallSummary,
    },
    /// Installed, waiting for the previous generation's clients
    Waiting {
        version: String,
        summary: InstallSummary,
    },
}

impl RegisterOutcome {
    pub fn version(&self) -> &str {
        match self {
            Self::Unchanged { version }
            | Self::Activated { version, .. }
            | Self::Waiting { version, .. } => version,
        }
    }
}

/// Point-in-time view of a controller
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub scope: String,
    pub installing: Option<Generation>,
    pub waiting: Option<Generation>,
    pub active: Option<Generation>,
    pub clients: usize,
}

#[derive(Default)]
struct Registration {
    installing: Option<Generation>,
    waiting: Option<Generation>,
    active: Option<Generation>,
    trace: VecDeque<StateChange>,
}

impl Registration {
    fn record(&mut self, change: StateChange) {
        if self.trace.len() == TRACE_CAPACITY {
            self.trace.pop_front();
        }
        self.trace.push_back(change);
    }

    /// Open clients still held by the active generation
    fn active_clients(&self, clients: &ClientTable) -> usize {
        self.active
            .as_ref()
            .map_or(0, |active| clients.count_of(&active.version))
    }

    fn retire(&mut self, mut generation: Generation) {
        if let Ok(change) = generation.transition(LifecycleState::Redundant) {
            self.record(change);
        }
    }
}

struct Inner {
    settings: Settings,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    sync: Arc<dyn SyncHandler>,
    dispatcher: Dispatcher,
    registration: RwLock<Registration>,
    /// Open clients; taken after `registration` when both are needed
    clients: ClientTable,
    lifecycle: Mutex<()>,
    skip_waiting: AtomicBool,
    online: AtomicBool,
    notifier: broadcast::Sender<Notification>,
}

/// Builder for [`CacheController`]
pub struct ControllerBuilder {
    settings: Settings,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    sync: Arc<dyn SyncHandler>,
    dispatcher: Dispatcher,
}

impl ControllerBuilder {
    /// Replace the no-op sync/push handler
    pub fn sync_handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.sync = handler;
        self
    }

    /// Override the handler for one event kind
    pub fn handler(mut self, kind: EventKind, handler: Handler) -> Self {
        self.dispatcher.register(kind, handler);
        self
    }

    pub fn build(self) -> CacheController {
        let (notifier, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        CacheController {
            inner: Arc::new(Inner {
                settings: self.settings,
                storage: self.storage,
                fetcher: self.fetcher,
                sync: self.sync,
                dispatcher: self.dispatcher,
                registration: RwLock::default(),
                clients: ClientTable::default(),
                lifecycle: Mutex::new(()),
                skip_waiting: AtomicBool::new(false),
                online: AtomicBool::new(true),
                notifier,
            }),
        }
    }
}

/// Versioned cache controller for one registration scope
#[derive(Clone)]
pub struct CacheController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CacheController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheController").finish_non_exhaustive()
    }
}

impl CacheController {
    /// Start building a controller
    pub fn builder(
        settings: Settings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            settings,
            storage,
            fetcher,
            sync: Arc::new(NoopSync),
            dispatcher: Dispatcher::standard(),
        }
    }

    /// Controller with the standard dispatch table and no-op sync handler
    pub fn new(
        settings: Settings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::builder(settings, storage, fetcher).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn storage(&self) -> Arc<dyn CacheStorage> {
        Arc::clone(&self.inner.storage)
    }

    /// Receive every notification broadcast from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    fn notify(&self, notification: Notification) {
        // No receivers is fine: nobody has a page open.
        let _ = self.inner.notifier.send(notification);
    }

    /// Current installing/waiting/active generations
    pub async fn snapshot(&self) -> ControllerSnapshot {
        let reg = self.inner.registration.read().await;
        ControllerSnapshot {
            scope: self.inner.settings.scope.clone(),
            installing: reg.installing.clone(),
            waiting: reg.waiting.clone(),
            active: reg.active.clone(),
            clients: self.inner.clients.len(),
        }
    }

    /// Every recorded state change, oldest first
    pub async fn state_trace(&self) -> Vec<StateChange> {
        self.inner
            .registration
            .read()
            .await
            .trace
            .iter()
            .cloned()
            .collect()
    }

    pub async fn active_version(&self) -> Option<String> {
        self.inner
            .registration
            .read()
            .await
            .active
            .as_ref()
            .map(|g| g.version.clone())
    }

    async fn active_cache_name(&self) -> Option<String> {
        self.inner
            .registration
            .read()
            .await
            .active
            .as_ref()
            .map(|g| g.cache_name.clone())
    }

    /// Whether the last network attempt succeeded
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Run an event through the dispatch table
    pub async fn dispatch(&self, event: Event) -> ShellcacheResult<EventOutcome> {
        let kind = event.kind();
        let handler = self
            .inner
            .dispatcher
            .get(kind)
            .ok_or_else(|| ShellcacheError::Handler {
                event: kind.to_string(),
                reason: "no handler registered".to_string(),
            })?;
        handler(self.clone(), event).await
    }

    /// Adopt a generation persisted by an earlier process as active,
    /// without reinstalling it.
    ///
    /// Returns `false` if its cache is gone or another version is active.
    pub async fn restore(&self, version: &str) -> ShellcacheResult<bool> {
        validate_version(version)?;
        let cache_name = generation_name(&self.inner.settings.cache_prefix, version);
        if !self.inner.storage.has(&cache_name).await? {
            debug!("Cannot restore {}: cache {} is missing", version, cache_name);
            return Ok(false);
        }

        let _lifecycle = self.inner.lifecycle.lock().await;
        let mut reg = self.inner.registration.write().await;
        if let Some(active) = &reg.active {
            return Ok(active.version == version);
        }

        let generation = Generation::restored(version, &cache_name);
        reg.record(generation.current());
        reg.active = Some(generation);
        debug!("Restored active generation {}", cache_name);
        Ok(true)
    }

    /// Register a deployment: install it unless its version is already
    /// active or waiting.
    pub async fn register(&self, deployment: &Deployment) -> ShellcacheResult<RegisterOutcome> {
        validate_version(&deployment.version)?;
        let manifest = deployment.manifest.resolve(&self.inner.settings)?;

        let _lifecycle = self.inner.lifecycle.lock().await;
        {
            let reg = self.inner.registration.read().await;
            let known = [reg.active.as_ref(), reg.waiting.as_ref()]
                .into_iter()
                .flatten()
                .any(|g| g.version == deployment.version);
            if known {
                debug!("Version {} already registered", deployment.version);
                return Ok(RegisterOutcome::Unchanged {
                    version: deployment.version.clone(),
                });
            }
        }

        self.install_locked(&deployment.version, &manifest).await
    }

    async fn install_locked(
        &self,
        version: &str,
        manifest: &ResolvedManifest,
    ) -> ShellcacheResult<RegisterOutcome> {
        let cache_name = generation_name(&self.inner.settings.cache_prefix, version);
        let mut generation = Generation::installing(version, &cache_name);
        {
            let mut reg = self.inner.registration.write().await;
            reg.record(generation.current());
            reg.installing = Some(generation.clone());
        }
        info!(
            "Installing {} ({} required, {} best-effort assets)",
            cache_name,
            manifest.required.len(),
            manifest.best_effort.len()
        );

        let summary = match self.populate(&cache_name, manifest).await {
            Ok(summary) => summary,
            Err(e) => {
                self.discard(generation, &e).await;
                return Err(e);
            }
        };

        let change = generation.transition(LifecycleState::Installed)?;
        generation.summary = Some(summary.clone());

        let (activate_now, blocking_clients) = {
            let mut reg = self.inner.registration.write().await;
            reg.installing = None;
            // Consumed under the same lock `skip_waiting` sets it under.
            let skip_requested = self.inner.skip_waiting.swap(false, Ordering::SeqCst);
            reg.record(change);

            let blocking = reg.active_clients(&self.inner.clients);
            let now = blocking == 0 || skip_requested || self.inner.settings.skip_waiting_on_install;
            if !now {
                if let Some(previous) = reg.waiting.take() {
                    info!("Waiting generation {} superseded", previous.cache_name);
                    reg.retire(previous);
                }
                reg.waiting = Some(generation.clone());
            }
            (now, blocking)
        };

        if summary.is_complete() {
            info!("Installed {} ({} assets)", cache_name, summary.cached.len());
        } else {
            warn!(
                "Installed {} with {} of {} best-effort assets missing",
                cache_name,
                summary.skipped.len(),
                manifest.best_effort.len()
            );
        }
        self.notify(Notification::Installed {
            version: version.to_string(),
            summary: summary.clone(),
        });

        if activate_now {
            self.activate_locked(generation).await?;
            Ok(RegisterOutcome::Activated {
                version: version.to_string(),
                summary,
            })
        } else {
            info!(
                "{} waiting for {} open client(s) to close",
                cache_name, blocking_clients
            );
            self.notify(Notification::UpdateAvailable {
                version: version.to_string(),
            });
            Ok(RegisterOutcome::Waiting {
                version: version.to_string(),
                summary,
            })
        }
    }

    /// Fetch one asset for install or precache; non-2xx counts as failure
    async fn fetch_asset(&self, url: &Url) -> ShellcacheResult<Response> {
        let response = self.inner.fetcher.fetch(&Request::get(url.clone())).await?;
        if !response.is_ok() {
            return Err(ShellcacheError::network(
                url.as_str(),
                format!("HTTP {}", response.status),
            ));
        }
        Ok(response)
    }

    /// Fill a new generation. Required assets are all-or-nothing; nothing
    /// is written until every one of them has been fetched.
    async fn populate(
        &self,
        cache_name: &str,
        manifest: &ResolvedManifest,
    ) -> ShellcacheResult<InstallSummary> {
        let cache = Cache::open(self.storage(), cache_name).await?;

        let results = join_all(manifest.required.iter().map(|url| self.fetch_asset(url))).await;
        let mut fetched = Vec::with_capacity(results.len());
        for (url, result) in manifest.required.iter().zip(results) {
            let response = result.map_err(|e| ShellcacheError::RequiredAsset {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            fetched.push((Request::get(url.clone()), response));
        }

        let mut summary = InstallSummary::default();
        for (request, response) in &fetched {
            cache
                .put(request, response)
                .await
                .map_err(|e| ShellcacheError::RequiredAsset {
                    url: request.url.to_string(),
                    reason: e.to_string(),
                })?;
            summary.cached.push(request.url.to_string());
        }

        let cache = &cache;
        let results = join_all(manifest.best_effort.iter().map(|url| async move {
            let response = self.fetch_asset(url).await?;
            cache.put(&Request::get(url.clone()), &response).await
        }))
        .await;

        for (url, result) in manifest.best_effort.iter().zip(results) {
            match result {
                Ok(()) => summary.cached.push(url.to_string()),
                Err(e) => {
                    warn!("Skipping best-effort asset {}: {}", url, e);
                    summary.skipped.push(SkippedAsset {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Throw away a failed install; the active generation is untouched
    async fn discard(&self, generation: Generation, err: &ShellcacheError) {
        error!("Install of {} failed: {}", generation.cache_name, err);

        if let Err(e) = self.inner.storage.delete(&generation.cache_name).await {
            warn!("Failed to remove {}: {}", generation.cache_name, e);
        }
        let version = generation.version.clone();
        {
            let mut reg = self.inner.registration.write().await;
            reg.installing = None;
            self.inner.skip_waiting.store(false, Ordering::SeqCst);
            reg.retire(generation);
        }
        self.notify(Notification::InstallFailed {
            version,
            reason: err.to_string(),
        });
    }

    /// Delete every other generation, then publish `generation` as active
    /// and claim all open clients. Caller holds the lifecycle lock.
    async fn activate_locked(&self, mut generation: Generation) -> ShellcacheResult<()> {
        let change = generation.transition(LifecycleState::Activating)?;
        self.inner.registration.write().await.record(change);
        info!("Activating {}", generation.cache_name);

        // Single snapshot of names; anything created after it is not ours to delete.
        match self.inner.storage.keys().await {
            Ok(names) => {
                for name in names.iter().filter(|n| **n != generation.cache_name) {
                    match self.inner.storage.delete(name).await {
                        Ok(true) => info!("Deleted stale cache {}", name),
                        Ok(false) => debug!("Stale cache {} already gone", name),
                        Err(e) => warn!("Failed to delete stale cache {}: {}", name, e),
                    }
                }
            }
            Err(e) => warn!("Could not list caches for cleanup: {}", e),
        }

        let change = generation.transition(LifecycleState::Activated)?;
        let version = generation.version.clone();
        let claimed = {
            let mut reg = self.inner.registration.write().await;
            reg.record(change);

            if let Some(previous) = reg.active.take() {
                reg.retire(previous);
            }
            if let Some(waiting) = reg.waiting.take() {
                if waiting.version != version {
                    reg.retire(waiting);
                }
            }

            let claimed = self.inner.clients.claim(&version);
            reg.active = Some(generation);
            claimed
        };

        info!("Activated {}, claimed {} client(s)", version, claimed);
        self.notify(Notification::Activated {
            version: version.clone(),
        });
        if claimed > 0 {
            self.notify(Notification::ControllerChanged { version });
        }
        Ok(())
    }

    /// Activate the waiting generation if no client holds the active one.
    pub async fn activate_waiting(&self) -> ShellcacheResult<Option<String>> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        let waiting = {
            let mut reg = self.inner.registration.write().await;
            if reg.active_clients(&self.inner.clients) > 0 {
                None
            } else {
                reg.waiting.take()
            }
        };

        match waiting {
            Some(generation) => {
                let version = generation.version.clone();
                self.activate_locked(generation).await?;
                Ok(Some(version))
            }
            None => Ok(None),
        }
    }

    /// Activate the waiting generation now, regardless of open clients.
    ///
    /// If an install is in progress it activates as soon as it finishes.
    /// Returns the version activated by this call.
    pub async fn skip_waiting(&self) -> ShellcacheResult<Option<String>> {
        {
            let reg = self.inner.registration.write().await;
            if reg.installing.is_some() {
                debug!("Skip-waiting requested during install");
                self.inner.skip_waiting.store(true, Ordering::SeqCst);
            }
        }

        let _lifecycle = self.inner.lifecycle.lock().await;
        let waiting = self.inner.registration.write().await.waiting.take();
        match waiting {
            Some(generation) => {
                let version = generation.version.clone();
                info!("Skip-waiting: activating {} now", generation.cache_name);
                self.activate_locked(generation).await?;
                Ok(Some(version))
            }
            None => Ok(None),
        }
    }

    /// Handle a control message from a page client
    pub async fn handle_message(&self, message: ControlMessage) -> ShellcacheResult<MessageOutcome> {
        match message {
            ControlMessage::SkipWaiting => Ok(MessageOutcome::SkipWaiting {
                activated: self.skip_waiting().await?,
            }),
            ControlMessage::Precache { urls } => {
                Ok(MessageOutcome::Precached(self.precache(&urls).await?))
            }
        }
    }

    /// Add URLs to the active generation on demand
    pub async fn precache(&self, urls: &[String]) -> ShellcacheResult<PrecacheSummary> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        let cache_name = self
            .active_cache_name()
            .await
            .ok_or(ShellcacheError::NoActiveGeneration)?;
        let cache = Cache::open(self.storage(), &cache_name).await?;

        let mut summary = PrecacheSummary {
            cache_name,
            ..Default::default()
        };
        let mut targets = Vec::with_capacity(urls.len());
        for raw in urls {
            match self.inner.settings.resolve(raw) {
                Ok(url) => targets.push(url),
                Err(e) => {
                    warn!("Not precaching {}: {}", raw, e);
                    summary.skipped.push(SkippedAsset {
                        url: raw.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let cache = &cache;
        let results = join_all(targets.iter().map(|url| async move {
            let response = self.fetch_asset(url).await?;
            if !response.is_cacheable() {
                return Err(ShellcacheError::network(
                    url.as_str(),
                    format!("{} response is not cacheable", response.kind),
                ));
            }
            cache.put(&Request::get(url.clone()), &response).await
        }))
        .await;

        for (url, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => summary.cached.push(url.to_string()),
                Err(e) => {
                    warn!("Failed to precache {}: {}", url, e);
                    summary.skipped.push(SkippedAsset {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Precached {} of {} URL(s) into {}",
            summary.cached.len(),
            urls.len(),
            summary.cache_name
        );
        Ok(summary)
    }

    /// Offer a request to the controller.
    ///
    /// Non-GET, cross-origin and out-of-scope requests pass through, as does
    /// everything while no generation is active.
    pub async fn handle_fetch(&self, request: &Request) -> ShellcacheResult<FetchResponse> {
        if !intercepts(request, &self.inner.settings) {
            debug!("Passthrough {} {}", request.method, request.url);
            return Ok(FetchResponse::Passthrough);
        }
        let Some(cache_name) = self.active_cache_name().await else {
            debug!("No active generation, passthrough {}", request.url);
            return Ok(FetchResponse::Passthrough);
        };

        let strategy = classify(request, &self.inner.settings);
        let served = match strategy {
            Strategy::CacheFirst => self.cache_first(&cache_name, request).await?,
            Strategy::NetworkFirst => self.network_first(&cache_name, request).await?,
        };
        debug!(
            "{} {} -> {} from {} ({})",
            request.method, request.url, served.response.status, served.source, strategy
        );
        Ok(FetchResponse::Respond(served))
    }

    async fn cache_first(&self, cache_name: &str, request: &Request) -> ShellcacheResult<Served> {
        if let Some(response) = self.lookup(cache_name, request).await {
            return Ok(Served {
                response,
                source: ResponseSource::Cache,
                strategy: Strategy::CacheFirst,
            });
        }

        match self.network(request).await {
            Ok(response) => {
                self.store(cache_name, request, &response).await;
                Ok(Served {
                    response,
                    source: ResponseSource::Network,
                    strategy: Strategy::CacheFirst,
                })
            }
            Err(e) if request.accepts_html() => {
                debug!("Navigation to {} failed offline: {}", request.url, e);
                Ok(self
                    .offline_fallback(cache_name, request, Strategy::CacheFirst)
                    .await)
            }
            Err(e) => Err(e),
        }
    }

    async fn network_first(&self, cache_name: &str, request: &Request) -> ShellcacheResult<Served> {
        match self.network(request).await {
            Ok(response) => {
                self.store(cache_name, request, &response).await;
                Ok(Served {
                    response,
                    source: ResponseSource::Network,
                    strategy: Strategy::NetworkFirst,
                })
            }
            Err(e) => {
                debug!("Network failed for {}, trying cache: {}", request.url, e);
                if let Some(response) = self.lookup(cache_name, request).await {
                    return Ok(Served {
                        response,
                        source: ResponseSource::Cache,
                        strategy: Strategy::NetworkFirst,
                    });
                }
                Ok(self
                    .offline_fallback(cache_name, request, Strategy::NetworkFirst)
                    .await)
            }
        }
    }

    /// Cached root document for navigations, synthetic placeholder otherwise
    async fn offline_fallback(&self, cache_name: &str, request: &Request, strategy: Strategy) -> Served {
        if request.accepts_html() {
            if let Ok(url) = self.inner.settings.offline_document_url() {
                if let Some(response) = self.lookup(cache_name, &Request::get(url)).await {
                    return Served {
                        response,
                        source: ResponseSource::OfflineDocument,
                        strategy,
                    };
                }
            }
        }

        Served {
            response: Response::offline(request.url.as_str()),
            source: ResponseSource::Offline,
            strategy,
        }
    }

    /// Cache read; storage errors count as a miss
    async fn lookup(&self, cache_name: &str, request: &Request) -> Option<Response> {
        match self.inner.storage.match_request(cache_name, request).await {
            Ok(entry) => entry.map(|e| e.response),
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", request.url, e);
                None
            }
        }
    }

    /// Opportunistic cache write; failure never affects the caller
    async fn store(&self, cache_name: &str, request: &Request, response: &Response) {
        if !response.is_cacheable() {
            debug!(
                "Not caching {} (status {}, {})",
                request.url, response.status, response.kind
            );
            return;
        }
        if let Err(e) = self.inner.storage.put(cache_name, request, response).await {
            warn!("Failed to cache {}: {}", request.url, e);
        }
    }

    async fn network(&self, request: &Request) -> ShellcacheResult<Response> {
        let result = self.inner.fetcher.fetch(request).await;
        self.set_online(result.is_ok());
        result
    }

    fn set_online(&self, online: bool) {
        let was = self.inner.online.swap(online, Ordering::SeqCst);
        if was != online {
            if online {
                info!("Network reachable again");
            } else {
                warn!("Network unreachable, serving from cache");
            }
            self.notify(Notification::Connectivity { online });
        }
    }

    /// Run the sync handler for a registered tag.
    ///
    /// Returns `false` for tags that are not configured.
    pub async fn handle_sync(&self, tag: &str) -> ShellcacheResult<bool> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if !self.inner.settings.sync_tags.iter().any(|t| t == tag) {
            debug!("Ignoring unknown sync tag {}", tag);
            return Ok(false);
        }
        info!("Background sync: {}", tag);
        self.inner.sync.sync(tag).await?;
        Ok(true)
    }

    /// Deliver a push payload to the sync handler
    pub async fn handle_push(&self, payload: Option<Vec<u8>>) -> ShellcacheResult<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        self.inner.sync.push(payload.as_deref()).await
    }

    /// Open a page client controlled by the active generation
    pub async fn connect_client(&self) -> PageClient {
        let id = Uuid::new_v4();
        let notifications = self.subscribe();
        {
            let reg = self.inner.registration.read().await;
            let version = reg.active.as_ref().map(|g| g.version.clone());
            self.inner.clients.insert(id, version);
        }
        debug!("Client {} connected", id);
        PageClient::new(id, self.clone(), notifications)
    }

    /// Version controlling a client, if any
    pub async fn client_version(&self, id: Uuid) -> Option<String> {
        self.inner.clients.version_of(id)
    }

    /// Close a page client. When the last client of the active generation
    /// closes, a waiting generation activates.
    pub async fn disconnect_client(&self, id: Uuid) -> ShellcacheResult<()> {
        if !self.forget_client(id) {
            return Ok(());
        }
        debug!("Client {} disconnected", id);
        self.activate_if_unblocked().await
    }

    /// Drop a client from the table without awaiting; `false` if unknown
    pub(crate) fn forget_client(&self, id: Uuid) -> bool {
        self.inner.clients.remove(id)
    }

    /// Activate the waiting generation once nothing holds the active one
    pub(crate) async fn activate_if_unblocked(&self) -> ShellcacheResult<()> {
        let unblocked = {
            let reg = self.inner.registration.read().await;
            reg.waiting.is_some() && reg.active_clients(&self.inner.clients) == 0
        };
        if unblocked {
            self.activate_waiting().await?;
        }
        Ok(())
    }
}
