//! Real-time push channel and event name constants.
//!
//! Browser subscribers and the server hub must agree on these strings, so
//! every publisher goes through the helpers here instead of formatting
//! channel names inline.

use crate::types::DbId;

/// Public channel re-broadcasting every alert for simple subscribers.
pub const CHANNEL_ADMIN_NOTIFICATIONS: &str = "admin.notifications";

/// Private channel carrying attendance changes for staff dashboards.
pub const CHANNEL_ATTENDANCE: &str = "attendance";

/// Public mirror of [`CHANNEL_ATTENDANCE`].
pub const CHANNEL_ATTENDANCE_PUBLIC: &str = "attendance.public";

/// Prefix of the private per-recipient channel (`user.{id}`).
pub const USER_CHANNEL_PREFIX: &str = "user.";

/// Prefix of the private per-section schedule channel.
pub const SCHEDULE_CHANNEL_PREFIX: &str = "schedule-updates.";

/// Event name published on [`CHANNEL_ADMIN_NOTIFICATIONS`].
pub const EVENT_ALERT_BROADCASTED: &str = "AlertBroadcasted";

/// Event name of an addressed alert on a user's private channel.
pub const EVENT_ALERT_NOTIFICATION: &str = "AlertNotification";

/// Event name of attendance pushes.
pub const EVENT_ATTENDANCE_UPDATED: &str = "AttendanceUpdated";

/// Event name of schedule pushes.
pub const EVENT_SCHEDULE_UPDATED: &str = "ScheduleUpdated";

/// Private channel for a single recipient.
pub fn user_channel(user_id: DbId) -> String {
    format!("{USER_CHANNEL_PREFIX}{user_id}")
}

/// Private channel for a single class section's schedule.
pub fn schedule_channel(section_id: DbId) -> String {
    format!("{SCHEDULE_CHANNEL_PREFIX}{section_id}")
}

/// Who may subscribe to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAccess {
    /// Anyone, including unauthenticated sockets.
    Public,
    /// Any authenticated user.
    Authenticated,
    /// Only the user with this id.
    Owner(DbId),
}

/// Classify a channel name. Returns `None` for names nobody publishes on.
pub fn channel_access(channel: &str) -> Option<ChannelAccess> {
    match channel {
        CHANNEL_ADMIN_NOTIFICATIONS | CHANNEL_ATTENDANCE_PUBLIC => Some(ChannelAccess::Public),
        CHANNEL_ATTENDANCE => Some(ChannelAccess::Authenticated),
        other => {
            if let Some(id) = other.strip_prefix(USER_CHANNEL_PREFIX) {
                return id.parse().ok().map(ChannelAccess::Owner);
            }
            if let Some(id) = other.strip_prefix(SCHEDULE_CHANNEL_PREFIX) {
                return id
                    .parse::<DbId>()
                    .ok()
                    .map(|_| ChannelAccess::Authenticated);
            }
            None
        }
    }
}
