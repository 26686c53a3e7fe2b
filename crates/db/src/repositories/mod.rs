//! Repository layer: one zero-sized struct per table with associated
//! async query functions taking the pool explicitly.

pub mod guardian_repo;
pub mod notification_repo;
pub mod student_repo;
pub mod user_repo;

pub use guardian_repo::GuardianRepo;
pub use notification_repo::NotificationRepo;
pub use student_repo::StudentRepo;
pub use user_repo::UserRepo;
