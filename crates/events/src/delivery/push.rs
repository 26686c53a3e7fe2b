//! Real-time push transport seam.
//!
//! The server's WebSocket hub implements [`PushTransport`]; listeners only
//! see named channels and JSON payloads.

use async_trait::async_trait;
use rollcall_core::wire::PushFrame;
use serde::Serialize;

/// Error type for push publication failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The payload could not be encoded as JSON.
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The hub is shut down or otherwise cannot accept messages.
    #[error("Push transport unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Publish a frame to every subscriber of its channel.
    ///
    /// Returns the number of connections the frame was queued for. Zero
    /// subscribers is not an error.
    async fn publish(&self, frame: PushFrame) -> Result<usize, PushError>;
}

/// Serialize `payload` and publish it on `channel` as `event`.
pub async fn publish_json<T: Serialize + ?Sized>(
    transport: &dyn PushTransport,
    channel: &str,
    event: &str,
    payload: &T,
) -> Result<usize, PushError> {
    let payload = serde_json::to_value(payload)?;
    let delivered = transport
        .publish(PushFrame::new(channel, event, payload))
        .await?;
    tracing::debug!(channel, event, delivered, "Push published");
    Ok(delivered)
}
