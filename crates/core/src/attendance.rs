//! Attendance message composition.
//!
//! Terminal clocks record bare `HH:MM:SS` strings while imports carry full
//! datetimes, so parsing accepts both and formatting always yields a
//! 12-hour clock such as `2:05 PM`.

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::event::AttendanceChange;
use crate::types::DbId;

const ACTION_CHECKED_IN: &str = "checked in";
const ACTION_CHECKED_OUT: &str = "checked out";

/// Output format for display times (`2:05 PM`).
const CLOCK_FORMAT: &str = "%-I:%M %p";

/// A recorded time, with blank strings treated as not recorded.
fn recorded(time: &Option<String>) -> Option<&str> {
    time.as_deref().filter(|t| !t.trim().is_empty())
}

/// `"checked out"` when a check-out time is present, otherwise `"checked in"`.
pub fn action_word(change: &AttendanceChange) -> &'static str {
    if recorded(&change.check_out_time).is_some() {
        ACTION_CHECKED_OUT
    } else {
        ACTION_CHECKED_IN
    }
}

/// The most specific timestamp of the change, formatted for display.
///
/// Check-out wins over check-in. With neither present `now` is used.
/// A value that cannot be parsed is shown as recorded.
pub fn display_time(change: &AttendanceChange, now: NaiveTime) -> String {
    match recorded(&change.check_out_time).or(recorded(&change.check_in_time)) {
        Some(raw) => match parse_clock(raw) {
            Some(time) => format_clock(time),
            None => raw.to_string(),
        },
        None => format_clock(now),
    }
}

/// Format a time of day as `h:mm AM/PM`.
pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Parse `HH:MM:SS`, `HH:MM`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.time())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.time()))
}

/// `"{name} has {action} at {time}."`
pub fn compose_message(student_name: &str, change: &AttendanceChange, now: NaiveTime) -> String {
    format!(
        "{student_name} has {} at {}.",
        action_word(change),
        display_time(change, now)
    )
}

/// Payload pushed on the attendance channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePush {
    pub student_id: DbId,
    pub status: String,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub remarks: Option<String>,
    pub student_name: String,
    pub message: String,
}

impl AttendancePush {
    pub fn new(change: &AttendanceChange, student_name: &str, now: NaiveTime) -> Self {
        Self {
            student_id: change.student_id,
            status: change.status.clone(),
            check_in_time: recorded(&change.check_in_time).map(str::to_string),
            check_out_time: recorded(&change.check_out_time).map(str::to_string),
            remarks: change.remarks.clone(),
            student_name: student_name.to_string(),
            message: compose_message(student_name, change, now),
        }
    }
}
