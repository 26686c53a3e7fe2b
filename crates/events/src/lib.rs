//! Rollcall event dispatch and notification delivery.
//!
//! - [`Dispatcher`] / [`DispatchWorker`]: in-process queue that fans each
//!   [`DomainEvent`](rollcall_core::event::DomainEvent) out to isolated
//!   listener tasks.
//! - [`RecipientResolver`]: student → guardian phone numbers.
//! - [`delivery`]: SMS, email, real-time push and notification storage seams.
//! - [`listeners`]: attendance SMS, alert multi-channel and real-time relay.

pub mod directory;
pub mod dispatcher;
pub mod delivery;
pub mod error;
pub mod listeners;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use directory::{Directory, PgDirectory};
pub use dispatcher::{DispatchWorker, Dispatcher, DispatcherBuilder, Listener};
pub use error::{DispatchError, ListenerError};
pub use resolver::RecipientResolver;
