//! shellcache - offline cache controller for a journal PWA
//!
//! Keeps versioned generations of the app shell, installs new deploys beside
//! the one in service, and answers requests cache-first or network-first so
//! the journal keeps working without a network.

pub mod cache;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod journal;
pub mod network;

pub use error::{ShellcacheError, ShellcacheResult};
