//! Texts guardians when a student checks in or out.

use std::sync::Arc;

use async_trait::async_trait;
use rollcall_core::attendance::compose_message;
use rollcall_core::event::{AttendanceChange, DomainEvent, EventKind};

use super::{local_now, Clock};
use crate::delivery::sms::SmsGateway;
use crate::directory::Directory;
use crate::dispatcher::Listener;
use crate::error::ListenerError;
use crate::resolver::RecipientResolver;

/// Outcome of one attendance fan-out, kept for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmsReport {
    pub attempted: usize,
    pub succeeded: usize,
}

impl SmsReport {
    /// Whether at least one gateway call was accepted.
    pub fn sent(&self) -> bool {
        self.succeeded > 0
    }
}

pub struct AttendanceSmsListener {
    directory: Arc<dyn Directory>,
    resolver: RecipientResolver,
    gateway: Arc<dyn SmsGateway>,
    clock: Clock,
}

impl AttendanceSmsListener {
    pub fn new(directory: Arc<dyn Directory>, gateway: Arc<dyn SmsGateway>) -> Self {
        Self {
            resolver: RecipientResolver::new(Arc::clone(&directory)),
            directory,
            gateway,
            clock: local_now,
        }
    }

    /// Replace the clock used when the change carries no time.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Text every resolved guardian number.
    ///
    /// Returns `None` when the student does not exist. Each number gets its
    /// own gateway call; a rejected number does not stop the others.
    pub async fn notify(&self, change: &AttendanceChange) -> Result<Option<SmsReport>, ListenerError> {
        let Some(student) = self.directory.find_student(change.student_id).await? else {
            tracing::info!(
                student_id = change.student_id,
                "Student not found, skipping attendance SMS"
            );
            return Ok(None);
        };

        let message = compose_message(&student.full_name(), change, (self.clock)());
        let numbers = self.resolver.resolve_contacts(student.id).await?;

        if numbers.is_empty() {
            tracing::warn!(
                student_id = student.id,
                "No guardian contact number resolved, attendance SMS not sent"
            );
            return Ok(Some(SmsReport::default()));
        }

        let student_id = student.id;
        let message = message.as_str();
        let sends = numbers.iter().map(move |number| {
            let gateway = Arc::clone(&self.gateway);
            async move {
                let accepted = gateway.send(number, message).await;
                if !accepted {
                    tracing::warn!(student_id, to = %number, "Attendance SMS rejected");
                }
                accepted
            }
        });
        let results = futures::future::join_all(sends).await;

        let report = SmsReport {
            attempted: results.len(),
            succeeded: results.iter().filter(|ok| **ok).count(),
        };

        if report.sent() {
            tracing::info!(
                student_id,
                attempted = report.attempted,
                succeeded = report.succeeded,
                "Attendance SMS sent"
            );
        } else {
            tracing::error!(
                student_id,
                attempted = report.attempted,
                "Attendance SMS failed for every guardian"
            );
        }

        Ok(Some(report))
    }
}

#[async_trait]
impl Listener for AttendanceSmsListener {
    fn name(&self) -> &'static str {
        "attendance_sms"
    }

    fn handles(&self, kind: EventKind) -> bool {
        kind == EventKind::AttendanceChanged
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError> {
        if let DomainEvent::AttendanceChanged(change) = event {
            self.notify(change).await?;
        }
        Ok(())
    }
}
