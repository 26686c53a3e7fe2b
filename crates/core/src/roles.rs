//! Well-known role name constants.
//!
//! These must match the values stored in `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_GUARDIAN: &str = "guardian";
