//! Client side of the notification pipeline.
//!
//! A [`ClientSession`](session::ClientSession) owns one
//! [`NotificationStore`](store::NotificationStore) and feeds it from two
//! uncoordinated sources: periodic polls through
//! [`NotificationApi`](api::NotificationApi) and real-time frames from
//! [`PushSubscriber`](push::PushSubscriber). Polls are authoritative;
//! pushed items are provisional until the next poll replaces them.

pub mod api;
pub mod config;
pub mod error;
pub mod push;
pub mod session;
pub mod store;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{start, ClientSession, SessionCommand, SessionHandle, StoreView};
pub use store::{NotificationKey, NotificationStore, Provenance};
