//! Relays attendance and schedule changes to live dashboards.

use std::sync::Arc;

use async_trait::async_trait;
use rollcall_core::attendance::AttendancePush;
use rollcall_core::channels::{
    schedule_channel, CHANNEL_ATTENDANCE, CHANNEL_ATTENDANCE_PUBLIC, EVENT_ATTENDANCE_UPDATED,
    EVENT_SCHEDULE_UPDATED,
};
use rollcall_core::event::{AttendanceChange, DomainEvent, EventKind, ScheduleChange};
use serde::Serialize;

use super::{local_now, Clock};
use crate::delivery::push::{publish_json, PushTransport};
use crate::directory::Directory;
use crate::dispatcher::Listener;
use crate::error::ListenerError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SchedulePush<'a> {
    schedule_id: i64,
    section_id: i64,
    action: &'a str,
}

pub struct RealtimeRelayListener {
    directory: Arc<dyn Directory>,
    push: Arc<dyn PushTransport>,
    clock: Clock,
}

impl RealtimeRelayListener {
    pub fn new(directory: Arc<dyn Directory>, push: Arc<dyn PushTransport>) -> Self {
        Self {
            directory,
            push,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Publish an attendance change on the private and public channels.
    ///
    /// Returns how many of the two channels accepted the frame.
    pub async fn relay_attendance(&self, change: &AttendanceChange) -> Result<usize, ListenerError> {
        let Some(student) = self.directory.find_student(change.student_id).await? else {
            tracing::info!(
                student_id = change.student_id,
                "Student not found, attendance push skipped"
            );
            return Ok(0);
        };

        let payload = AttendancePush::new(change, &student.full_name(), (self.clock)());
        let mut published = 0;
        for channel in [CHANNEL_ATTENDANCE, CHANNEL_ATTENDANCE_PUBLIC] {
            match publish_json(self.push.as_ref(), channel, EVENT_ATTENDANCE_UPDATED, &payload).await
            {
                Ok(_) => published += 1,
                Err(e) => tracing::error!(
                    student_id = student.id,
                    channel,
                    error = %e,
                    "Failed to push attendance change"
                ),
            }
        }
        Ok(published)
    }

    /// Publish a schedule change on the section's channel.
    pub async fn relay_schedule(&self, change: &ScheduleChange) -> Result<(), ListenerError> {
        let channel = schedule_channel(change.section_id);
        let payload = SchedulePush {
            schedule_id: change.schedule_id,
            section_id: change.section_id,
            action: &change.action,
        };
        publish_json(self.push.as_ref(), &channel, EVENT_SCHEDULE_UPDATED, &payload).await?;
        Ok(())
    }
}

#[async_trait]
impl Listener for RealtimeRelayListener {
    fn name(&self) -> &'static str {
        "realtime_relay"
    }

    fn handles(&self, kind: EventKind) -> bool {
        matches!(kind, EventKind::AttendanceChanged | EventKind::ScheduleChanged)
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError> {
        match event {
            DomainEvent::AttendanceChanged(change) => {
                self.relay_attendance(change).await?;
            }
            DomainEvent::ScheduleChanged(change) => self.relay_schedule(change).await?,
            DomainEvent::AlertTriggered(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::{nine_am, student, FakeDirectory, RecordingPush};

    fn change() -> AttendanceChange {
        AttendanceChange {
            student_id: 1,
            status: "present".into(),
            check_in_time: Some("07:45:00".into()),
            check_out_time: None,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn attendance_goes_to_private_and_public_channels() {
        let push = Arc::new(RecordingPush::default());
        let relay = RealtimeRelayListener::new(
            Arc::new(FakeDirectory::default().with_student(student(1, "Ana", "Cruz"))),
            push.clone(),
        )
        .with_clock(nine_am);

        assert_eq!(relay.relay_attendance(&change()).await.unwrap(), 2);

        let private = push.on(CHANNEL_ATTENDANCE);
        let public = push.on(CHANNEL_ATTENDANCE_PUBLIC);
        assert_eq!(private.len(), 1);
        assert_eq!(public.len(), 1);
        assert_eq!(private[0].payload, public[0].payload);
        assert_eq!(private[0].payload["studentName"], "Ana Cruz");
        assert_eq!(
            private[0].payload["message"],
            "Ana Cruz has checked in at 7:45 AM."
        );
        assert!(private[0].payload["checkOutTime"].is_null());
    }

    #[tokio::test]
    async fn one_failing_attendance_channel_does_not_block_the_other() {
        let push = Arc::new(RecordingPush::failing(&[CHANNEL_ATTENDANCE]));
        let relay = RealtimeRelayListener::new(
            Arc::new(FakeDirectory::default().with_student(student(1, "Ana", "Cruz"))),
            push.clone(),
        );

        assert_eq!(relay.relay_attendance(&change()).await.unwrap(), 1);
        assert_eq!(push.on(CHANNEL_ATTENDANCE_PUBLIC).len(), 1);
    }

    #[tokio::test]
    async fn unknown_student_publishes_nothing() {
        let push = Arc::new(RecordingPush::default());
        let relay = RealtimeRelayListener::new(Arc::new(FakeDirectory::default()), push.clone());

        assert_eq!(relay.relay_attendance(&change()).await.unwrap(), 0);
        assert!(push.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn schedule_change_targets_section_channel() {
        let push = Arc::new(RecordingPush::default());
        let relay = RealtimeRelayListener::new(Arc::new(FakeDirectory::default()), push.clone());
        let event = DomainEvent::ScheduleChanged(ScheduleChange {
            section_id: 4,
            schedule_id: 12,
            action: "updated".into(),
        });

        relay.handle(&event).await.unwrap();

        let frames = push.on("schedule-updates.4");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, EVENT_SCHEDULE_UPDATED);
        assert_eq!(
            frames[0].payload,
            serde_json::json!({"scheduleId": 12, "sectionId": 4, "action": "updated"})
        );
    }

    #[tokio::test]
    async fn schedule_push_failure_is_reported() {
        let push = Arc::new(RecordingPush::failing(&["schedule-updates.4"]));
        let relay = RealtimeRelayListener::new(Arc::new(FakeDirectory::default()), push);
        let change = ScheduleChange {
            section_id: 4,
            schedule_id: 12,
            action: "deleted".into(),
        };

        assert_matches!(
            relay.relay_schedule(&change).await,
            Err(ListenerError::Push(_))
        );
    }

    #[test]
    fn alerts_are_not_relayed() {
        let relay = RealtimeRelayListener::new(
            Arc::new(FakeDirectory::default()),
            Arc::new(RecordingPush::default()),
        );
        assert!(!relay.handles(EventKind::AlertTriggered));
        assert!(relay.handles(EventKind::ScheduleChanged));
    }
}
