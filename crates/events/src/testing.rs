//! In-memory doubles for the delivery and directory seams.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use rollcall_core::projection::{MailContent, NotificationData};
use rollcall_core::roles::ROLE_ADMIN;
use rollcall_core::types::DbId;
use rollcall_core::wire::PushFrame;
use rollcall_db::models::guardian::Guardian;
use rollcall_db::models::student::Student;
use rollcall_db::models::user::User;

use crate::delivery::email::{EmailError, Mailer};
use crate::delivery::push::{PushError, PushTransport};
use crate::delivery::sms::SmsGateway;
use crate::delivery::store::NotificationSink;
use crate::directory::Directory;

pub fn student(id: DbId, first: &str, last: &str) -> Student {
    Student {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        section_id: Some(1),
        guardian_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn guardian(id: DbId, contact: Option<&str>) -> Guardian {
    Guardian {
        id,
        name: format!("Guardian {id}"),
        contact_number: contact.map(str::to_string),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn admin(id: DbId, email: Option<&str>) -> User {
    User {
        id,
        name: "Registrar".to_string(),
        email: email.map(str::to_string),
        role: ROLE_ADMIN.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn nine_am() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Formatted log output of the current thread, for asserting on events.
///
/// The subscriber is thread-local, so it only sees code awaited directly on
/// the test's current-thread runtime.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    /// Whether some line was logged at `level` and contains `text`.
    pub fn has(&self, level: tracing::Level, text: &str) -> bool {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .any(|line| line.contains(level.as_str()) && line.contains(text))
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDirectory {
    students: HashMap<DbId, Student>,
    links: HashMap<DbId, Vec<Guardian>>,
    legacy: HashMap<DbId, Guardian>,
    admin: Option<User>,
    broken: bool,
}

impl FakeDirectory {
    pub fn with_student(mut self, student: Student) -> Self {
        self.students.insert(student.id, student);
        self
    }

    pub fn with_link(mut self, student_id: DbId, guardian: Guardian) -> Self {
        self.links.entry(student_id).or_default().push(guardian);
        self
    }

    pub fn with_legacy(mut self, student_id: DbId, guardian: Guardian) -> Self {
        self.legacy.insert(student_id, guardian);
        self
    }

    pub fn with_admin(mut self, admin: User) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Every lookup fails with a pool error.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.broken {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn find_student(&self, student_id: DbId) -> Result<Option<Student>, sqlx::Error> {
        self.check()?;
        Ok(self.students.get(&student_id).cloned())
    }

    async fn linked_guardians(&self, student_id: DbId) -> Result<Vec<Guardian>, sqlx::Error> {
        self.check()?;
        Ok(self.links.get(&student_id).cloned().unwrap_or_default())
    }

    async fn legacy_guardian(&self, student_id: DbId) -> Result<Option<Guardian>, sqlx::Error> {
        self.check()?;
        Ok(self.legacy.get(&student_id).cloned())
    }

    async fn first_admin(&self) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self.admin.clone())
    }
}

// ---------------------------------------------------------------------------
// SMS
// ---------------------------------------------------------------------------

/// Records every call; numbers in `rejecting` return `false`.
#[derive(Default)]
pub struct RecordingGateway {
    pub calls: Mutex<Vec<(String, String)>>,
    rejecting: HashSet<String>,
}

impl RecordingGateway {
    pub fn rejecting(numbers: &[&str]) -> Self {
        Self {
            calls: Mutex::default(),
            rejecting: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn destinations(&self) -> Vec<String> {
        let mut numbers: Vec<_> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(to, _)| to.clone())
            .collect();
        numbers.sort();
        numbers
    }
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, destination: &str, message: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        !self.rejecting.contains(destination)
    }
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

/// Records published frames; channels in `failing` return an error.
#[derive(Default)]
pub struct RecordingPush {
    pub frames: Mutex<Vec<PushFrame>>,
    failing: HashSet<String>,
}

impl RecordingPush {
    pub fn failing(channels: &[&str]) -> Self {
        Self {
            frames: Mutex::default(),
            failing: channels.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn on(&self, channel: &str) -> Vec<PushFrame> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.channel == channel)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PushTransport for RecordingPush {
    async fn publish(&self, frame: PushFrame) -> Result<usize, PushError> {
        if self.failing.contains(&frame.channel) {
            return Err(PushError::Unavailable(format!("{} is down", frame.channel)));
        }
        self.frames.lock().unwrap().push(frame);
        Ok(1)
    }
}

// ---------------------------------------------------------------------------
// Storage and mail
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    pub stored: Mutex<Vec<(DbId, NotificationData)>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn store(&self, user_id: DbId, data: &NotificationData) -> Result<DbId, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut stored = self.stored.lock().unwrap();
        stored.push((user_id, data.clone()));
        Ok(stored.len() as DbId)
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, MailContent)>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to_email: &str, mail: &MailContent) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Build("relay refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), mail.clone()));
        Ok(())
    }
}
