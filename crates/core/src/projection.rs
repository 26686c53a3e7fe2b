//! Channel projections of an [`AlertPayload`].
//!
//! Each delivery channel gets a pure projection function. The table
//! [`ALERT_CHANNELS`] lists them in delivery order; the alert listener walks
//! it instead of asking each channel object to render itself.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertLevel, AlertPayload};

/// Label of the call-to-action link appended to alert emails.
pub const MAIL_ACTION_LABEL: &str = "View details";

/// Delivery channels an alert is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertChannel {
    /// Row in the recipient's notification list.
    Database,
    /// Push on the recipient's private channel.
    Broadcast,
    /// Email to the recipient.
    Mail,
}

impl AlertChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Broadcast => "broadcast",
            Self::Mail => "mail",
        }
    }
}

impl std::fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{title, message, url, level}` projection stored and pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub title: String,
    pub message: String,
    pub url: Option<String>,
    pub level: AlertLevel,
}

impl From<&AlertPayload> for NotificationData {
    fn from(payload: &AlertPayload) -> Self {
        Self {
            title: payload.title().to_string(),
            message: payload.message().to_string(),
            url: payload.url().map(str::to_string),
            level: payload.level(),
        }
    }
}

/// A link rendered below the body of an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAction {
    pub label: String,
    pub url: String,
}

/// Email content for an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    pub subject: String,
    pub body: String,
    pub action: Option<MailAction>,
}

impl MailContent {
    /// Plain-text rendering with the action link on its own line.
    pub fn render_text(&self) -> String {
        match &self.action {
            Some(action) => format!("{}\n\n{}: {}", self.body, action.label, action.url),
            None => self.body.clone(),
        }
    }
}

/// The output of one channel's projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Database(NotificationData),
    Broadcast(NotificationData),
    Mail(MailContent),
}

impl Projection {
    pub fn channel(&self) -> AlertChannel {
        match self {
            Self::Database(_) => AlertChannel::Database,
            Self::Broadcast(_) => AlertChannel::Broadcast,
            Self::Mail(_) => AlertChannel::Mail,
        }
    }
}

type ProjectFn = fn(&AlertPayload) -> Projection;

/// Every alert channel with its projection, in delivery order.
pub const ALERT_CHANNELS: [(AlertChannel, ProjectFn); 3] = [
    (AlertChannel::Database, to_database),
    (AlertChannel::Broadcast, to_broadcast),
    (AlertChannel::Mail, to_mail),
];

fn to_database(payload: &AlertPayload) -> Projection {
    Projection::Database(NotificationData::from(payload))
}

fn to_broadcast(payload: &AlertPayload) -> Projection {
    Projection::Broadcast(NotificationData::from(payload))
}

fn to_mail(payload: &AlertPayload) -> Projection {
    Projection::Mail(MailContent {
        subject: payload.title().to_string(),
        body: payload.message().to_string(),
        action: payload.url().map(|url| MailAction {
            label: MAIL_ACTION_LABEL.to_string(),
            url: url.to_string(),
        }),
    })
}

/// Project a payload onto every alert channel.
pub fn project_all(payload: &AlertPayload) -> Vec<Projection> {
    ALERT_CHANNELS
        .iter()
        .map(|(_, project)| project(payload))
        .collect()
}
