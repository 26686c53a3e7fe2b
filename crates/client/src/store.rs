//! Client notification store: merges pushed and polled notifications.
//!
//! Polls replace the whole list and the unread counter. Pushed items are
//! provisional: they get a client-generated key, bump the counter, and
//! vanish at the next poll unless the server has persisted them by then
//! (in which case they come back under their server id).

use chrono::Utc;
use rollcall_core::projection::NotificationData;
use rollcall_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::api::{ServerNotification, Snapshot};
use crate::config::DEFAULT_MAX_ITEMS;

/// Identity of a locally held notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    /// A row the server returned.
    Server(DbId),
    /// A pushed item the server has not reported yet.
    Local(Uuid),
}

impl NotificationKey {
    pub fn server_id(&self) -> Option<DbId> {
        match self {
            NotificationKey::Server(id) => Some(*id),
            NotificationKey::Local(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Push,
    Poll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No snapshot received yet.
    Idle,
    Synced,
}

/// A notification as the client shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    pub key: NotificationKey,
    pub data: NotificationData,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub provenance: Provenance,
}

impl NotificationView {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

impl From<ServerNotification> for NotificationView {
    fn from(row: ServerNotification) -> Self {
        Self {
            key: NotificationKey::Server(row.id),
            data: row.data,
            read_at: row.read_at,
            created_at: row.created_at,
            provenance: Provenance::Poll,
        }
    }
}

/// Result of an optimistic mark-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkRead {
    /// Unknown key or already read; nothing to tell the server.
    Unchanged,
    /// Marked locally; the item has no server id yet.
    LocalOnly,
    /// Marked locally; the server should be told about this id.
    Server(DbId),
}

#[derive(Debug, Clone)]
pub struct NotificationStore {
    state: SyncState,
    items: Vec<NotificationView>,
    unread_count: u64,
    max_items: usize,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl NotificationStore {
    /// `max_items` caps the list kept by push arrivals; it is at least 1.
    pub fn new(max_items: usize) -> Self {
        Self {
            state: SyncState::Idle,
            items: Vec::new(),
            unread_count: 0,
            max_items: max_items.max(1),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Newest first.
    pub fn items(&self) -> &[NotificationView] {
        &self.items
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Unread items actually present in the list. Equals
    /// [`unread_count`](Self::unread_count) right after a poll; may differ
    /// between polls.
    pub fn unread_in_list(&self) -> usize {
        self.items.iter().filter(|item| item.is_unread()).count()
    }

    /// Replace the list and the counter with a server snapshot.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let discarded = self
            .items
            .iter()
            .filter(|item| item.provenance == Provenance::Push)
            .count();

        self.items = snapshot
            .notifications
            .into_iter()
            .map(NotificationView::from)
            .collect();
        self.unread_count = u64::try_from(snapshot.unread_count).unwrap_or(0);
        self.state = SyncState::Synced;

        tracing::debug!(
            items = self.items.len(),
            unread = self.unread_count,
            discarded_provisional = discarded,
            "Applied notification snapshot"
        );
    }

    /// Prepend a pushed notification as unread and return its local key.
    ///
    /// Applied in any state. The oldest items beyond the cap are dropped
    /// from the local view only.
    pub fn apply_push(&mut self, data: NotificationData) -> NotificationKey {
        self.apply_push_at(data, Utc::now())
    }

    pub fn apply_push_at(&mut self, data: NotificationData, now: Timestamp) -> NotificationKey {
        let key = NotificationKey::Local(Uuid::new_v4());
        self.items.insert(
            0,
            NotificationView {
                key,
                data,
                read_at: None,
                created_at: now,
                provenance: Provenance::Push,
            },
        );
        self.items.truncate(self.max_items);
        self.unread_count += 1;
        key
    }

    /// Optimistically mark one item read.
    pub fn mark_read(&mut self, key: &NotificationKey) -> MarkRead {
        self.mark_read_at(key, Utc::now())
    }

    pub fn mark_read_at(&mut self, key: &NotificationKey, now: Timestamp) -> MarkRead {
        let Some(item) = self.items.iter_mut().find(|item| item.key == *key) else {
            return MarkRead::Unchanged;
        };
        if !item.is_unread() {
            return MarkRead::Unchanged;
        }

        item.read_at = Some(now);
        self.unread_count = self.unread_count.saturating_sub(1);
        match key.server_id() {
            Some(id) => MarkRead::Server(id),
            None => MarkRead::LocalOnly,
        }
    }

    /// Optimistically mark everything read and zero the counter.
    ///
    /// Returns `false` when there was nothing to mark, so a repeated call
    /// does not need to reach the server.
    pub fn mark_all_read(&mut self) -> bool {
        self.mark_all_read_at(Utc::now())
    }

    pub fn mark_all_read_at(&mut self, now: Timestamp) -> bool {
        let mut changed = self.unread_count > 0;
        for item in self.items.iter_mut().filter(|item| item.is_unread()) {
            item.read_at = Some(now);
            changed = true;
        }
        self.unread_count = 0;
        changed
    }
}
