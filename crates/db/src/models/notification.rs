//! Notification entity model.

use rollcall_core::projection::NotificationData;
use rollcall_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub data: Json<NotificationData>,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// One page of a user's notifications and the unread rows it contains.
///
/// Both fields come from the same statement, so `unread_count` always equals
/// the number of unread rows in `notifications`.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

impl NotificationPage {
    pub fn new(notifications: Vec<Notification>) -> Self {
        let unread_count = notifications.iter().filter(|n| !n.is_read()).count() as i64;
        Self {
            notifications,
            unread_count,
        }
    }
}
