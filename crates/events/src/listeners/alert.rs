//! Multi-channel alert delivery to the administrator.
//!
//! One alert becomes a stored notification, a private push and a queued
//! email for the first administrator, followed by a public re-broadcast on
//! `admin.notifications` for dashboards that only subscribe there.

use std::sync::Arc;

use async_trait::async_trait;
use rollcall_core::alert::AlertPayload;
use rollcall_core::channels::{
    user_channel, CHANNEL_ADMIN_NOTIFICATIONS, EVENT_ALERT_BROADCASTED, EVENT_ALERT_NOTIFICATION,
};
use rollcall_core::event::{DomainEvent, EventKind};
use rollcall_core::projection::{project_all, AlertChannel, MailContent, NotificationData, Projection};
use rollcall_db::models::user::User;
use tokio_util::task::TaskTracker;

use crate::delivery::email::Mailer;
use crate::delivery::push::{publish_json, PushTransport};
use crate::delivery::store::NotificationSink;
use crate::directory::Directory;
use crate::dispatcher::Listener;
use crate::error::ListenerError;

/// What happened to one alert, kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertReport {
    pub recipient: Option<i64>,
    pub delivered: Vec<AlertChannel>,
    pub failed: Vec<AlertChannel>,
    pub broadcast: bool,
}

pub struct AlertListener {
    directory: Arc<dyn Directory>,
    sink: Arc<dyn NotificationSink>,
    push: Arc<dyn PushTransport>,
    mailer: Option<Arc<dyn Mailer>>,
    mail_queue: TaskTracker,
}

impl AlertListener {
    pub fn new(
        directory: Arc<dyn Directory>,
        sink: Arc<dyn NotificationSink>,
        push: Arc<dyn PushTransport>,
    ) -> Self {
        Self {
            directory,
            sink,
            push,
            mailer: None,
            mail_queue: TaskTracker::new(),
        }
    }

    /// Enable the mail channel.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Tracker of queued email sends, for draining on shutdown.
    pub fn mail_queue(&self) -> TaskTracker {
        self.mail_queue.clone()
    }

    /// Deliver an alert on every channel.
    ///
    /// Without an administrator nothing is sent. Each channel failure is
    /// logged and recorded in the report; no channel is skipped because
    /// another failed.
    pub async fn deliver(&self, payload: &AlertPayload) -> Result<AlertReport, ListenerError> {
        let Some(admin) = self.directory.first_admin().await? else {
            tracing::warn!(title = payload.title(), "No administrator found, alert not delivered");
            return Ok(AlertReport::default());
        };

        let mut report = AlertReport {
            recipient: Some(admin.id),
            ..AlertReport::default()
        };

        for projection in project_all(payload) {
            let channel = projection.channel();
            let delivered = match projection {
                Projection::Database(data) => self.store(&admin, &data).await,
                Projection::Broadcast(data) => self.push_private(&admin, &data).await,
                Projection::Mail(mail) => self.enqueue_mail(&admin, mail),
            };
            if delivered {
                report.delivered.push(channel);
            } else {
                report.failed.push(channel);
            }
        }

        report.broadcast = self.broadcast_public(payload).await;

        tracing::info!(
            recipient = admin.id,
            level = %payload.level(),
            delivered = ?report.delivered,
            failed = ?report.failed,
            broadcast = report.broadcast,
            "Alert delivered"
        );
        Ok(report)
    }

    async fn store(&self, admin: &User, data: &NotificationData) -> bool {
        match self.sink.store(admin.id, data).await {
            Ok(id) => {
                tracing::debug!(recipient = admin.id, notification_id = id, "Alert stored");
                true
            }
            Err(e) => {
                tracing::error!(
                    recipient = admin.id,
                    channel = %AlertChannel::Database,
                    title = %data.title,
                    error = %e,
                    "Failed to store alert notification"
                );
                false
            }
        }
    }

    async fn push_private(&self, admin: &User, data: &NotificationData) -> bool {
        let channel = user_channel(admin.id);
        match publish_json(self.push.as_ref(), &channel, EVENT_ALERT_NOTIFICATION, data).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    recipient = admin.id,
                    channel = %channel,
                    error = %e,
                    "Failed to push alert"
                );
                false
            }
        }
    }

    /// Queue the email on a background task; `false` if it cannot be queued.
    fn enqueue_mail(&self, admin: &User, mail: MailContent) -> bool {
        let Some(mailer) = self.mailer.clone() else {
            tracing::debug!(recipient = admin.id, "Mail channel not configured, email skipped");
            return false;
        };
        let Some(to_email) = admin.email.clone().filter(|e| !e.is_empty()) else {
            tracing::warn!(recipient = admin.id, "Administrator has no email address, email skipped");
            return false;
        };

        let recipient = admin.id;
        self.mail_queue.spawn(async move {
            if let Err(e) = mailer.send(&to_email, &mail).await {
                tracing::error!(
                    recipient,
                    to = %to_email,
                    subject = %mail.subject,
                    error = %e,
                    "Failed to send alert email"
                );
            }
        });
        true
    }

    async fn broadcast_public(&self, payload: &AlertPayload) -> bool {
        match publish_json(
            self.push.as_ref(),
            CHANNEL_ADMIN_NOTIFICATIONS,
            EVENT_ALERT_BROADCASTED,
            payload,
        )
        .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    channel = CHANNEL_ADMIN_NOTIFICATIONS,
                    error = %e,
                    "Failed to broadcast alert"
                );
                false
            }
        }
    }
}

#[async_trait]
impl Listener for AlertListener {
    fn name(&self) -> &'static str {
        "alert_multi_channel"
    }

    fn handles(&self, kind: EventKind) -> bool {
        kind == EventKind::AlertTriggered
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError> {
        if let DomainEvent::AlertTriggered(payload) = event {
            self.deliver(payload).await?;
        }
        Ok(())
    }
}
