//! Offline cache controller
//!
//! Sits between the journal's pages and the network. Each deploy of the app
//! shell installs as a new cache generation next to the one in service; the
//! new generation takes over only once it is complete and no open page still
//! depends on the old one (or a page asks it to skip waiting).
//!
//! # Lifecycle
//!
//! ```text
//! installing ──> installed ──> activating ──> activated
//!      │             │              │              │
//!      └─────────────┴──────────────┴──────────────┴──> redundant
//! ```
//!
//! # Fetch strategies
//!
//! | Request | Strategy | Offline result |
//! |---------|----------|----------------|
//! | Navigation, `*.html`, `/api/` | network-first | cached copy, else cached root document for navigations, else synthetic 503 |
//! | Everything else in scope | cache-first | cached copy, else cached root document for navigations, else `Err(Network)` |
//! | Non-GET or out of scope | passthrough | n/a |

pub mod clients;
pub mod dispatch;
pub mod lifecycle;
pub mod manifest;
pub mod messages;
pub mod record;
pub mod registry;
pub mod service;
mod settings;
pub mod strategy;
pub mod sync;

pub use clients::PageClient;
pub use dispatch::{Dispatcher, Event, EventKind, EventOutcome};
pub use lifecycle::{Generation, LifecycleState, StateChange};
pub use manifest::{hash_directory, AssetManifest, Deployment, ResolvedManifest};
pub use messages::{
    ControlMessage, InstallSummary, MessageOutcome, Notification, PrecacheSummary, SkippedAsset,
};
pub use record::RegistrationRecord;
pub use registry::ControllerRegistry;
pub use service::{CacheController, ControllerBuilder, ControllerSnapshot, RegisterOutcome};
pub use settings::{parse_origin, Settings};
pub use strategy::{FetchResponse, ResponseSource, Served, Strategy};
pub use sync::{NoopSync, SyncHandler};
