use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::Message;
use rollcall_core::channels::{channel_access, ChannelAccess};
use rollcall_core::types::{DbId, Timestamp};
use rollcall_core::wire::PushFrame;
use rollcall_events::delivery::push::{PushError, PushTransport};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Event name of the acknowledgement sent after a successful subscribe.
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "subscription_succeeded";

/// Event name of the reply to a rejected subscribe.
pub const EVENT_SUBSCRIPTION_ERROR: &str = "subscription_error";

/// Why a subscription was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Channel {0} requires an authenticated connection")]
    Unauthenticated(String),

    #[error("Channel {0} belongs to another user")]
    Forbidden(String),

    #[error("Connection is not registered")]
    UnknownConnection,
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID; `None` for anonymous sockets.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Channels this connection receives frames for.
    pub channels: HashSet<String>,
}

/// Manages all active WebSocket connections and their channel subscriptions.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared between
/// the upgrade handler and the event listeners.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
    shut_down: AtomicBool,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            channels: HashSet::new(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID, dropping all of its subscriptions.
    ///
    /// Returns the removed connection, or `None` if it was already gone.
    pub async fn remove(&self, conn_id: &str) -> Option<WsConnection> {
        self.connections.write().await.remove(conn_id)
    }

    /// Subscribe a connection to `channel` after checking it may listen there.
    pub async fn subscribe(&self, conn_id: &str, channel: &str) -> Result<(), SubscribeError> {
        let mut conns = self.connections.write().await;
        let conn = conns
            .get_mut(conn_id)
            .ok_or(SubscribeError::UnknownConnection)?;

        match channel_access(channel) {
            None => return Err(SubscribeError::UnknownChannel(channel.to_string())),
            Some(ChannelAccess::Public) => {}
            Some(ChannelAccess::Authenticated) if conn.user_id.is_none() => {
                return Err(SubscribeError::Unauthenticated(channel.to_string()))
            }
            Some(ChannelAccess::Authenticated) => {}
            Some(ChannelAccess::Owner(owner)) => match conn.user_id {
                None => return Err(SubscribeError::Unauthenticated(channel.to_string())),
                Some(id) if id != owner => {
                    return Err(SubscribeError::Forbidden(channel.to_string()))
                }
                Some(_) => {}
            },
        }

        conn.channels.insert(channel.to_string());
        Ok(())
    }

    /// Returns `true` if the connection was subscribed.
    pub async fn unsubscribe(&self, conn_id: &str, channel: &str) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.channels.remove(channel))
    }

    /// Queue a frame for a single connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, frame: &PushFrame) -> bool {
        let Ok(text) = serde_json::to_string(frame) else {
            return false;
        };
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(Message::Text(text.into())).is_ok())
    }

    /// Deliver a frame to every subscriber of its channel.
    ///
    /// The frame is serialized once. Connections whose send channels are
    /// closed are skipped and not counted.
    pub async fn publish_frame(&self, frame: &PushFrame) -> Result<usize, PushError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(PushError::Unavailable("push hub is shut down".into()));
        }

        let text = serde_json::to_string(frame)?;
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.channels.contains(&frame.channel)
                && conn.sender.send(Message::Text(text.clone().into())).is_ok()
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Number of connections subscribed to `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.channels.contains(channel))
            .count()
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Later publishes fail with [`PushError::Unavailable`].
    pub async fn shutdown_all(&self) {
        self.shut_down.store(true, Ordering::Release);
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client, returning how many
    /// connections accepted it.
    pub async fn ping_all(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok())
            .count()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTransport for WsManager {
    async fn publish(&self, frame: PushFrame) -> Result<usize, PushError> {
        self.publish_frame(&frame).await
    }
}
