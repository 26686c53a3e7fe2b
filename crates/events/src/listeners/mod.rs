//! Listeners registered with the [`Dispatcher`](crate::Dispatcher).

use chrono::NaiveTime;

pub mod alert;
pub mod attendance_sms;
pub mod relay;

pub use alert::AlertListener;
pub use attendance_sms::AttendanceSmsListener;
pub use relay::RealtimeRelayListener;

/// Source of the wall-clock time used when an event carries no timestamp.
pub type Clock = fn() -> NaiveTime;

/// Local time of day on this host.
pub fn local_now() -> NaiveTime {
    chrono::Local::now().time()
}
