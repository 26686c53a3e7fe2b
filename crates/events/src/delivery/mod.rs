//! Delivery channels for notifications.
//!
//! Each transport sits behind a small trait so listeners can be wired with
//! real transports in the server and recording doubles in tests.

pub mod email;
pub mod push;
pub mod sms;
pub mod store;
