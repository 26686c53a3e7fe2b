//! WebSocket push hub.
//!
//! Sockets subscribe to named channels; the event listeners publish through
//! [`WsManager`]'s [`PushTransport`](rollcall_events::delivery::push::PushTransport)
//! implementation.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{SubscribeError, WsManager};
