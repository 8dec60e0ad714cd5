//! Event dispatch table
//!
//! Every lifecycle and runtime event the host delivers is routed through a
//! table keyed by [`EventKind`]. The standard table wires each kind to the
//! matching [`CacheController`] operation; embedders can swap single entries.

use crate::controller::manifest::Deployment;
use crate::controller::messages::{ControlMessage, MessageOutcome};
use crate::controller::service::{CacheController, RegisterOutcome};
use crate::controller::strategy::FetchResponse;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::Request;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::fmt;

/// Kind of event delivered to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
    Sync,
    Push,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::Install,
        Self::Activate,
        Self::Fetch,
        Self::Message,
        Self::Sync,
        Self::Push,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch => "fetch",
            Self::Message => "message",
            Self::Sync => "sync",
            Self::Push => "push",
        };
        write!(f, "{}", name)
    }
}

/// An event and its payload
#[derive(Debug, Clone)]
pub enum Event {
    /// A deployment to register
    Install(Deployment),
    /// Promote the waiting generation if no client blocks it
    Activate,
    Fetch(Request),
    Message(ControlMessage),
    /// Background sync trigger by tag
    Sync(String),
    Push(Option<Vec<u8>>),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install(_) => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
            Self::Message(_) => EventKind::Message,
            Self::Sync(_) => EventKind::Sync,
            Self::Push(_) => EventKind::Push,
        }
    }
}

/// Result of a dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Registered(RegisterOutcome),
    /// Version activated, if one was waiting and unblocked
    Activated(Option<String>),
    Fetched(FetchResponse),
    Message(MessageOutcome),
    /// Whether the tag reached the sync handler
    Synced(bool),
    Pushed,
}

/// Event handler signature
pub type Handler =
    fn(CacheController, Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>>;

/// Mapping from event kind to handler
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Handler>,
}

impl Dispatcher {
    /// Table with no handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Table wiring every event kind to the controller
    pub fn standard() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(EventKind::Install, on_install);
        dispatcher.register(EventKind::Activate, on_activate);
        dispatcher.register(EventKind::Fetch, on_fetch);
        dispatcher.register(EventKind::Message, on_message);
        dispatcher.register(EventKind::Sync, on_sync);
        dispatcher.register(EventKind::Push, on_push);
        dispatcher
    }

    /// Set the handler for `kind`, replacing any existing one
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    pub fn get(&self, kind: EventKind) -> Option<Handler> {
        self.handlers.get(&kind).copied()
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

fn mismatch(expected: EventKind, event: &Event) -> ShellcacheError {
    ShellcacheError::Handler {
        event: expected.to_string(),
        reason: format!("received {} event", event.kind()),
    }
}

fn on_install(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Install(deployment) => Ok(EventOutcome::Registered(
                controller.register(&deployment).await?,
            )),
            other => Err(mismatch(EventKind::Install, &other)),
        }
    }
    .boxed()
}

fn on_activate(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Activate => Ok(EventOutcome::Activated(controller.activate_waiting().await?)),
            other => Err(mismatch(EventKind::Activate, &other)),
        }
    }
    .boxed()
}

fn on_fetch(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Fetch(request) => Ok(EventOutcome::Fetched(
                controller.handle_fetch(&request).await?,
            )),
            other => Err(mismatch(EventKind::Fetch, &other)),
        }
    }
    .boxed()
}

fn on_message(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Message(message) => Ok(EventOutcome::Message(
                controller.handle_message(message).await?,
            )),
            other => Err(mismatch(EventKind::Message, &other)),
        }
    }
    .boxed()
}

fn on_sync(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Sync(tag) => Ok(EventOutcome::Synced(controller.handle_sync(&tag).await?)),
            other => Err(mismatch(EventKind::Sync, &other)),
        }
    }
    .boxed()
}

fn on_push(controller: CacheController, event: Event) -> BoxFuture<'static, ShellcacheResult<EventOutcome>> {
    async move {
        match event {
            Event::Push(payload) => {
                controller.handle_push(payload).await?;
                Ok(EventOutcome::Pushed)
            }
            other => Err(mismatch(EventKind::Push, &other)),
        }
    }
    .boxed()
}
