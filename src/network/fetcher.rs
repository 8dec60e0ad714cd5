//! Network fetcher abstraction

use crate::error::ShellcacheResult;
use crate::http::{Request, Response};
use async_trait::async_trait;

/// Abstract network interface
///
/// This trait lets the controller work against different origins:
/// - [`HttpFetcher`](crate::network::HttpFetcher): a real HTTP origin
/// - [`DirFetcher`](crate::network::DirFetcher): a local asset directory
///
/// Implementations return non-2xx statuses as responses. `Err` means the
/// request produced no response at all (offline, DNS, connection reset).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response>;

    /// Get the human-readable fetcher name for display
    fn fetcher_name(&self) -> &'static str;
}
