use anyhow::Result;
use async_trait::async_trait;

/// Delivery seam for the final user-facing message. The hosting platform
/// decides the transport (chat push, websocket, console).
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}
