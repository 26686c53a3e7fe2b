use std::sync::Arc;

use rollcall_events::Dispatcher;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind `Arc` or is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: rollcall_db::DbPool,
    /// Server configuration (JWT secret, timeouts).
    pub config: Arc<ServerConfig>,
    /// WebSocket push hub.
    pub ws_manager: Arc<WsManager>,
    /// Producer side of the event queue.
    pub dispatcher: Dispatcher,
}
