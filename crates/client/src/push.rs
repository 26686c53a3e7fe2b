//! WebSocket subscriber for alert pushes.
//!
//! Connects to the server hub, joins the user's private channel and the
//! public `admin.notifications` channel, and forwards alert payloads to the
//! session. Dropped connections are retried with exponential backoff until
//! the session is torn down.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rollcall_core::channels::{
    user_channel, CHANNEL_ADMIN_NOTIFICATIONS, EVENT_ALERT_BROADCASTED, EVENT_ALERT_NOTIFICATION,
};
use rollcall_core::projection::NotificationData;
use rollcall_core::types::DbId;
use rollcall_core::wire::{ClientFrame, PushFrame};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

type PushStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// An alert delivered over the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushedAlert {
    pub channel: String,
    pub data: NotificationData,
}

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay, clamped to `max_delay`.
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Decode a server frame into an alert, ignoring every other event
/// (attendance, schedule, subscription acknowledgements).
pub fn decode_alert(text: &str) -> Option<PushedAlert> {
    let frame: PushFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring undecodable push frame");
            return None;
        }
    };

    if frame.event != EVENT_ALERT_NOTIFICATION && frame.event != EVENT_ALERT_BROADCASTED {
        if frame.event == "subscription_error" {
            tracing::warn!(channel = %frame.channel, payload = %frame.payload, "Subscription refused");
        }
        return None;
    }

    match serde_json::from_value::<NotificationData>(frame.payload) {
        Ok(data) => Some(PushedAlert {
            channel: frame.channel,
            data,
        }),
        Err(e) => {
            tracing::warn!(channel = %frame.channel, error = %e, "Malformed alert payload");
            None
        }
    }
}

pub struct PushSubscriber {
    ws_url: String,
    token: String,
    channels: Vec<String>,
    reconnect: ReconnectConfig,
}

impl PushSubscriber {
    /// Subscribe `user_id` to its private channel and the public alert channel.
    ///
    /// A blank token opens an anonymous socket, which the hub only lets join
    /// public channels, so the private one is left out.
    pub fn new(ws_url: String, token: String, user_id: DbId) -> Self {
        let token = token.trim().to_string();
        let mut channels = vec![CHANNEL_ADMIN_NOTIFICATIONS.to_string()];
        if !token.is_empty() {
            channels.insert(0, user_channel(user_id));
        }
        Self {
            ws_url,
            token,
            channels,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// The upgrade URL, carrying the token only when there is one.
    pub fn connect_url(&self) -> String {
        if self.token.is_empty() {
            self.ws_url.clone()
        } else {
            format!("{}?token={}", self.ws_url, self.token)
        }
    }

    /// Open the socket and send one subscribe frame per channel.
    pub async fn connect(&self) -> Result<PushStream, ClientError> {
        let url = self.connect_url();
        let (mut stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            ClientError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        for channel in &self.channels {
            let frame = ClientFrame::Subscribe {
                channel: channel.clone(),
            };
            let text = serde_json::to_string(&frame)
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
            stream
                .send(Message::text(text))
                .await
                .map_err(|e| ClientError::Protocol(e.to_string()))?;
        }

        tracing::info!(ws_url = %self.ws_url, channels = ?self.channels, "Push subscriber connected");
        Ok(stream)
    }

    /// Forward alerts into `tx` until cancelled or the session goes away.
    pub async fn run(self, tx: mpsc::Sender<PushedAlert>, cancel: CancellationToken) {
        let mut delay = self.reconnect.initial_delay;

        loop {
            let stream = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.connect() => result,
            };

            match stream {
                Ok(stream) => {
                    delay = self.reconnect.initial_delay;
                    if !pump(stream, &tx, &cancel).await {
                        break;
                    }
                    tracing::info!(ws_url = %self.ws_url, "Push connection lost, reconnecting");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Push connection failed, retrying"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = next_delay(delay, &self.reconnect);
        }

        tracing::info!("Push subscriber stopped");
    }
}

/// Read one connection until it ends. Returns `false` when the subscriber
/// should stop instead of reconnecting.
async fn pump(
    mut stream: PushStream,
    tx: &mpsc::Sender<PushedAlert>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return false;
            }
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                if let Some(alert) = decode_alert(text.as_str()) {
                    if tx.send(alert).await.is_err() {
                        // Session is gone.
                        return false;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return true,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Push receive error");
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_alert_is_decoded() {
        let text = r#"{"channel":"user.3","event":"AlertNotification","payload":{"title":"Gate","message":"Open","url":"https://x/1","level":"critical"}}"#;

        let alert = decode_alert(text).unwrap();
        assert_eq!(alert.channel, "user.3");
        assert_eq!(alert.data.title, "Gate");
        assert_eq!(alert.data.url.as_deref(), Some("https://x/1"));
    }

    #[test]
    fn broadcast_without_url_is_decoded() {
        let text = r#"{"channel":"admin.notifications","event":"AlertBroadcasted","payload":{"title":"Gate","message":"Open","level":"info"}}"#;
        assert!(decode_alert(text).unwrap().data.url.is_none());
    }

    #[test]
    fn other_events_are_ignored() {
        let ack = r#"{"channel":"user.3","event":"subscription_succeeded","payload":{}}"#;
        let attendance = r#"{"channel":"attendance.public","event":"AttendanceUpdated","payload":{"studentId":1}}"#;
        assert!(decode_alert(ack).is_none());
        assert!(decode_alert(attendance).is_none());
        assert!(decode_alert("not json").is_none());
    }

    #[test]
    fn subscribes_to_private_and_public_channels() {
        let subscriber = PushSubscriber::new("ws://localhost:3000/ws".into(), "t".into(), 3);
        assert_eq!(subscriber.channels(), ["user.3", "admin.notifications"]);
        assert_eq!(subscriber.connect_url(), "ws://localhost:3000/ws?token=t");
    }

    #[test]
    fn blank_token_connects_anonymously_to_public_channels() {
        for token in ["", "  "] {
            let subscriber =
                PushSubscriber::new("ws://localhost:3000/ws".into(), token.into(), 3);
            assert_eq!(subscriber.connect_url(), "ws://localhost:3000/ws");
            assert_eq!(subscriber.channels(), ["admin.notifications"]);
        }
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let config = ReconnectConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
        assert_eq!(next_delay(Duration::from_secs(20), &config), Duration::from_secs(30));
    }
}
