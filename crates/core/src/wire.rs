//! WebSocket frames exchanged between the push hub and subscribers.

use serde::{Deserialize, Serialize};

/// Server → client: an event published on a named channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl PushFrame {
    pub fn new(
        channel: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Client → server: channel subscription management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientFrame {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_wire_format() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"action":"subscribe","channel":"user.3"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Subscribe {
                channel: "user.3".into()
            }
        );
        let text = serde_json::to_string(&ClientFrame::Unsubscribe {
            channel: "attendance".into(),
        })
        .unwrap();
        assert_eq!(text, r#"{"action":"unsubscribe","channel":"attendance"}"#);
    }
}
