//! Background sync and push hooks
//!
//! Reserved for server integration. The default handler does nothing and
//! reports success.

use crate::error::ShellcacheResult;
use async_trait::async_trait;
use tracing::debug;

/// Callback invoked by named sync triggers and push deliveries
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// Run the synchronization registered under `tag`
    async fn sync(&self, tag: &str) -> ShellcacheResult<()>;

    /// Handle a push delivery
    async fn push(&self, payload: Option<&[u8]>) -> ShellcacheResult<()>;
}

/// Placeholder handler that always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSync;

#[async_trait]
impl SyncHandler for NoopSync {
    async fn sync(&self, tag: &str) -> ShellcacheResult<()> {
        debug!("Sync {} requested, nothing to synchronize", tag);
        Ok(())
    }

    async fn push(&self, payload: Option<&[u8]>) -> ShellcacheResult<()> {
        debug!(
            "Push received ({} bytes), no handler installed",
            payload.map_or(0, <[u8]>::len)
        );
        Ok(())
    }
}
