pub mod guardian;
pub mod notification;
pub mod student;
pub mod user;
