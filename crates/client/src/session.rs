//! One client session: the task that owns the store.
//!
//! Polls, pushes and UI commands are handled one at a time on this task, so
//! the store never needs a lock. Whichever update lands last wins, and the
//! next poll repairs any drift a push introduced.

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::projection::NotificationData;
use rollcall_core::types::DbId;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{NotificationApi, NotificationSource};
use crate::config::ClientConfig;
use crate::push::{PushSubscriber, PushedAlert};
use crate::store::{MarkRead, NotificationKey, NotificationStore, NotificationView, SyncState};

/// Requests from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    MarkRead(NotificationKey),
    MarkAllRead,
    /// Poll now instead of waiting for the next tick.
    Refresh,
}

/// What the UI renders, republished after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreView {
    pub state: SyncState,
    pub items: Vec<NotificationView>,
    pub unread_count: u64,
}

impl From<&NotificationStore> for StoreView {
    fn from(store: &NotificationStore) -> Self {
        Self {
            state: store.state(),
            items: store.items().to_vec(),
            unread_count: store.unread_count(),
        }
    }
}

pub struct ClientSession {
    store: NotificationStore,
    source: Arc<dyn NotificationSource>,
    poll_interval: Duration,
    view: watch::Sender<StoreView>,
}

impl ClientSession {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        poll_interval: Duration,
        max_items: usize,
    ) -> Self {
        let store = NotificationStore::new(max_items);
        let (view, _) = watch::channel(StoreView::from(&store));
        Self {
            store,
            source,
            poll_interval,
            view,
        }
    }

    /// Receiver of the rendered state; the current value is always the
    /// latest.
    pub fn subscribe(&self) -> watch::Receiver<StoreView> {
        self.view.subscribe()
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Run until `cancel` fires, then hand back the store.
    ///
    /// Inputs already waiting when teardown is requested are still handled.
    /// A closed push channel only stops push handling; a closed command
    /// channel only stops command handling.
    pub async fn run(
        mut self,
        mut pushes: mpsc::Receiver<PushedAlert>,
        mut commands: mpsc::Receiver<SessionCommand>,
        cancel: CancellationToken,
    ) -> NotificationStore {
        self.poll().await;

        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.poll_interval,
            self.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pushes_open = true;
        let mut commands_open = true;

        loop {
            tokio::select! {
                biased;

                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command).await,
                    None => commands_open = false,
                },
                pushed = pushes.recv(), if pushes_open => match pushed {
                    Some(alert) => self.on_push(alert.data),
                    None => {
                        tracing::debug!("Push channel closed, continuing with polls only");
                        pushes_open = false;
                    }
                },
                _ = ticker.tick() => self.poll().await,
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!(unread = self.store.unread_count(), "Client session torn down");
        self.store
    }

    /// Full fetch. On failure the last state is kept.
    pub async fn poll(&mut self) {
        match self.source.fetch(self.store.max_items()).await {
            Ok(snapshot) => {
                self.store.apply_snapshot(snapshot);
                self.publish();
            }
            Err(e) => {
                tracing::warn!(error = %e, state = ?self.store.state(), "Notification poll failed");
            }
        }
    }

    fn on_push(&mut self, data: NotificationData) {
        let key = self.store.apply_push(data);
        tracing::debug!(?key, unread = self.store.unread_count(), "Pushed notification added");
        self.publish();
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::MarkRead(key) => {
                let outcome = self.store.mark_read(&key);
                if outcome != MarkRead::Unchanged {
                    self.publish();
                }
                if let MarkRead::Server(id) = outcome {
                    // Optimistic: the local change stays even if this fails.
                    if let Err(e) = self.source.mark_read(id).await {
                        tracing::warn!(notification_id = id, error = %e, "Failed to mark notification read");
                    }
                }
            }
            SessionCommand::MarkAllRead => {
                if !self.store.mark_all_read() {
                    return;
                }
                self.publish();
                match self.source.mark_all_read().await {
                    Ok(marked) => tracing::debug!(marked, "Marked all notifications read"),
                    Err(e) => tracing::warn!(error = %e, "Failed to mark all notifications read"),
                }
            }
            SessionCommand::Refresh => self.poll().await,
        }
    }

    fn publish(&self) {
        self.view.send_replace(StoreView::from(&self.store));
    }
}

/// Handles to a running session and its push subscriber.
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub view: watch::Receiver<StoreView>,
    cancel: CancellationToken,
    session: tokio::task::JoinHandle<NotificationStore>,
    push: tokio::task::JoinHandle<()>,
}

impl SessionHandle {
    /// Stop polling, detach the push subscription and return the final store.
    pub async fn shutdown(self) -> Option<NotificationStore> {
        self.cancel.cancel();
        if let Err(e) = self.push.await {
            tracing::warn!(error = %e, "Push subscriber task failed");
        }
        match self.session.await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::error!(error = %e, "Client session task failed");
                None
            }
        }
    }
}

/// Commands and pushes buffered between the transports and the session.
const CHANNEL_CAPACITY: usize = 64;

/// Spawn a session for `user_id` with HTTP polling and WebSocket push.
pub fn start(config: ClientConfig, user_id: DbId) -> SessionHandle {
    let api = NotificationApi::new(config.api_url.clone(), config.token.clone());
    let session = ClientSession::new(Arc::new(api), config.poll_interval, config.max_items);
    let view = session.subscribe();

    let (push_tx, push_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (commands, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let subscriber = PushSubscriber::new(config.ws_url, config.token, user_id);
    let push = tokio::spawn(subscriber.run(push_tx, cancel.child_token()));
    let session = tokio::spawn(session.run(push_rx, command_rx, cancel.clone()));

    SessionHandle {
        commands,
        view,
        cancel,
        session,
        push,
    }
}
