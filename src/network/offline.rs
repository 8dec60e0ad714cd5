//! A fetcher with no connectivity

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use crate::network::Fetcher;
use async_trait::async_trait;

/// Fails every request, as a device with the network down would
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        Err(ShellcacheError::network(request.url.as_str(), "offline"))
    }

    fn fetcher_name(&self) -> &'static str {
        "offline"
    }
}
