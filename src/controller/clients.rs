//! Page clients
//!
//! A [`PageClient`] stands in for one open page of the app. It counts
//! towards the clients blocking a waiting generation, can post control
//! messages, and receives every broadcast notification. Dropping it closes
//! the page just like [`PageClient::close`].

use crate::controller::messages::{ControlMessage, MessageOutcome, Notification};
use crate::controller::service::CacheController;
use crate::error::ShellcacheResult;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Open clients and the version controlling each.
///
/// Behind a blocking mutex so a dropped [`PageClient`] can deregister without
/// awaiting. The guard is never held across an `.await`.
#[derive(Default)]
pub(crate) struct ClientTable(Mutex<HashMap<Uuid, Option<String>>>);

impl ClientTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Option<String>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, id: Uuid, version: Option<String>) {
        self.lock().insert(id, version);
    }

    pub(crate) fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub(crate) fn version_of(&self, id: Uuid) -> Option<String> {
        self.lock().get(&id).cloned().flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn count_of(&self, version: &str) -> usize {
        self.lock()
            .values()
            .filter(|v| v.as_deref() == Some(version))
            .count()
    }

    /// Point every client at `version`; returns how many changed
    pub(crate) fn claim(&self, version: &str) -> usize {
        let mut clients = self.lock();
        let mut claimed = 0;
        for controller in clients.values_mut() {
            if controller.as_deref() != Some(version) {
                *controller = Some(version.to_string());
                claimed += 1;
            }
        }
        claimed
    }
}

/// Handle for one open page
pub struct PageClient {
    id: Uuid,
    controller: CacheController,
    notifications: broadcast::Receiver<Notification>,
}

impl PageClient {
    pub(crate) fn new(
        id: Uuid,
        controller: CacheController,
        notifications: broadcast::Receiver<Notification>,
    ) -> Self {
        Self {
            id,
            controller,
            notifications,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Version of the generation currently controlling this page
    pub async fn controller_version(&self) -> Option<String> {
        self.controller.client_version(self.id).await
    }

    /// Post a control message to the controller
    pub async fn post_message(&self, message: ControlMessage) -> ShellcacheResult<MessageOutcome> {
        self.controller.handle_message(message).await
    }

    /// Next notification; `None` once the controller is gone.
    ///
    /// Notifications missed because the page fell behind are skipped.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.notifications.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Client {} missed {} notification(s)", self.id, missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next notification if one is already queued
    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.notifications.try_recv() {
                Ok(notification) => return Some(notification),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("Client {} missed {} notification(s)", self.id, missed);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every queued notification
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Close the page, possibly unblocking a waiting generation
    pub async fn close(self) -> ShellcacheResult<()> {
        self.controller.disconnect_client(self.id).await
    }
}

impl Drop for PageClient {
    fn drop(&mut self) {
        if !self.controller.forget_client(self.id) {
            return;
        }
        debug!("Client {} dropped", self.id);

        match Handle::try_current() {
            Ok(handle) => {
                let controller = self.controller.clone();
                handle.spawn(async move {
                    if let Err(e) = controller.activate_if_unblocked().await {
                        warn!("Activation after client drop failed: {}", e);
                    }
                });
            }
            Err(_) => warn!(
                "Client {} dropped outside a runtime; waiting generation not activated",
                self.id
            ),
        }
    }
}
