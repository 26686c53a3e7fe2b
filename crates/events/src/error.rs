//! Errors raised by the dispatch layer and by listeners.

use rollcall_core::event::EventKind;

use crate::delivery::push::PushError;

/// The dispatch queue itself is unusable.
///
/// Distinct from [`ListenerError`]: an event that hits this error was never
/// queued, so the caller must report it.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch queue closed; {kind} event was not queued")]
    Closed { kind: EventKind },
}

/// A listener could not finish handling an event.
///
/// Logged at the listener boundary; never returned to the event producer.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Push error: {0}")]
    Push(#[from] PushError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_error_names_the_event_kind() {
        let err = DispatchError::Closed {
            kind: EventKind::AlertTriggered,
        };
        assert_eq!(
            err.to_string(),
            "Dispatch queue closed; alert_triggered event was not queued"
        );
    }

    #[test]
    fn listener_error_wraps_database_error() {
        let err = ListenerError::from(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("Database error:"));
    }
}
