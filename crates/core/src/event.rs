//! Domain events fanned out by the dispatcher.

use serde::{Deserialize, Serialize};

use crate::alert::AlertPayload;
use crate::types::DbId;

/// A check-in or check-out recorded for a student.
///
/// Exactly one of `check_in_time` / `check_out_time` is meaningful per
/// event. Times are the raw strings recorded by the attendance terminal
/// (`HH:MM:SS` or an RFC 3339 datetime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceChange {
    pub student_id: DbId,
    pub status: String,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// A change to a section's class schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleChange {
    pub section_id: DbId,
    pub schedule_id: DbId,
    /// `"created"`, `"updated"` or `"deleted"`.
    pub action: String,
}

/// Every event the dispatcher knows how to route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    AttendanceChanged(AttendanceChange),
    AlertTriggered(AlertPayload),
    ScheduleChanged(ScheduleChange),
}

/// Field-less discriminant of [`DomainEvent`], used for listener routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AttendanceChanged,
    AlertTriggered,
    ScheduleChanged,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttendanceChanged => "attendance_changed",
            Self::AlertTriggered => "alert_triggered",
            Self::ScheduleChanged => "schedule_changed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AttendanceChanged(_) => EventKind::AttendanceChanged,
            Self::AlertTriggered(_) => EventKind::AlertTriggered,
            Self::ScheduleChanged(_) => EventKind::ScheduleChanged,
        }
    }
}
