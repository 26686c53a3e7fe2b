//! In-process event dispatcher.
//!
//! [`Dispatcher`] is the producer half: a cheap, cloneable handle whose
//! [`dispatch`](Dispatcher::dispatch) pushes onto an unbounded queue and
//! returns immediately. [`DispatchWorker`] is the consumer half: it drains
//! the queue and spawns one task per interested [`Listener`] per event.
//!
//! A listener error or panic is logged inside its own task and never reaches
//! sibling listeners, the worker, or the producer.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use rollcall_core::event::{DomainEvent, EventKind};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::{DispatchError, ListenerError};

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A consumer of domain events.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Stable name used in log fields.
    fn name(&self) -> &'static str;

    /// Whether this listener wants events of `kind`.
    fn handles(&self, kind: EventKind) -> bool;

    /// Handle one event.
    async fn handle(&self, event: &DomainEvent) -> Result<(), ListenerError>;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Producer handle for the dispatch queue.
#[derive(Clone)]
pub struct Dispatcher {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl Dispatcher {
    /// Queue an event for asynchronous delivery.
    ///
    /// Never waits on listeners. Fails only when the worker has gone away,
    /// in which case the event was not queued.
    pub fn dispatch(&self, event: DomainEvent) -> Result<(), DispatchError> {
        let kind = event.kind();
        self.sender.send(event).map_err(|_| {
            tracing::error!(event_kind = %kind, "Dispatch queue closed, event not queued");
            DispatchError::Closed { kind }
        })?;
        tracing::debug!(event_kind = %kind, "Event queued");
        Ok(())
    }

    /// Whether the worker side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects listeners, then splits into a [`Dispatcher`] and its worker.
#[derive(Default)]
pub struct DispatcherBuilder {
    listeners: Vec<Arc<dyn Listener>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn listen<L: Listener>(mut self, listener: L) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> (Dispatcher, DispatchWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Dispatcher { sender },
            DispatchWorker {
                receiver,
                listeners: self.listeners,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Consumer half of the dispatch queue.
pub struct DispatchWorker {
    receiver: mpsc::UnboundedReceiver<DomainEvent>,
    listeners: Vec<Arc<dyn Listener>>,
}

impl DispatchWorker {
    /// Run until every [`Dispatcher`] handle is dropped.
    ///
    /// Events still queued at that point are delivered, and in-flight
    /// listener tasks are awaited before returning.
    pub async fn run(mut self) {
        tracing::info!(listeners = self.listeners.len(), "Dispatch worker started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                received = self.receiver.recv() => match received {
                    Some(event) => self.fan_out(&mut tasks, event),
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join(joined);
                }
            }
        }

        let in_flight = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!(in_flight, "Dispatch queue closed, worker shutting down");
    }

    /// Spawn one isolated task for every listener interested in `event`.
    fn fan_out(&self, tasks: &mut JoinSet<()>, event: DomainEvent) {
        let kind = event.kind();
        let event = Arc::new(event);
        let mut matched = 0usize;

        for listener in self.listeners.iter().filter(|l| l.handles(kind)) {
            matched += 1;
            let listener = Arc::clone(listener);
            let event = Arc::clone(&event);
            tasks.spawn(run_listener(listener, event));
        }

        if matched == 0 {
            tracing::debug!(event_kind = %kind, "No listener registered for event");
        }
    }
}

/// Execute a listener, containing both errors and panics.
async fn run_listener(listener: Arc<dyn Listener>, event: Arc<DomainEvent>) {
    let name = listener.name();
    let kind = event.kind();

    match AssertUnwindSafe(listener.handle(&event)).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::debug!(listener = name, event_kind = %kind, "Listener completed");
        }
        Ok(Err(e)) => {
            tracing::error!(
                listener = name,
                event_kind = %kind,
                error = %e,
                "Listener failed"
            );
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(
                listener = name,
                event_kind = %kind,
                panic = %reason,
                "Listener panicked"
            );
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Listener task aborted");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
