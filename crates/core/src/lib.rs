//! Rollcall domain types shared by every crate in the workspace.
//!
//! Nothing in here touches I/O: the event model, alert payloads, display
//! formatting and the channel projection table are all pure.

pub mod alert;
pub mod attendance;
pub mod channels;
pub mod error;
pub mod event;
pub mod projection;
pub mod roles;
pub mod types;
pub mod wire;
