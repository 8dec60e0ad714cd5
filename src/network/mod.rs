//! Network access for the controller
//!
//! Provides origin-agnostic fetching:
//! - Live HTTP origins via ureq
//! - Local asset directories
//! - No network at all

mod dir;
mod fetcher;
mod http;
mod offline;

pub use dir::{content_type_for, DirFetcher};
pub use fetcher::Fetcher;
pub use http::HttpFetcher;
pub use offline::OfflineFetcher;
