use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use rollcall_core::types::DbId;
use rollcall_core::wire::{ClientFrame, PushFrame};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::manager::{WsManager, EVENT_SUBSCRIPTION_ERROR, EVENT_SUBSCRIPTION_SUCCEEDED};

/// Query parameters for `GET /ws`.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token. Browsers cannot set headers on a WebSocket upgrade.
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// Without a token the socket is anonymous and may only join public
/// channels. An invalid token is rejected with 401 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = match params.token.as_deref() {
        Some(token) => Some(AuthUser::from_token(token, &state.config.jwt)?.user_id),
        None => None,
    };
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, user_id)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// A spawned sender task forwards queued frames to the sink while this task
/// processes subscribe/unsubscribe requests until the client goes away.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: Option<DbId>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_text(&ws_manager, &conn_id, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    let connected_secs = ws_manager
        .remove(&conn_id)
        .await
        .map(|conn| (chrono::Utc::now() - conn.connected_at).num_seconds());
    send_task.abort();
    tracing::info!(conn_id = %conn_id, connected_secs, "WebSocket disconnected");
}

async fn handle_text(ws_manager: &WsManager, conn_id: &str, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Ignoring malformed client frame");
            return;
        }
    };

    match frame {
        ClientFrame::Subscribe { channel } => {
            let reply = match ws_manager.subscribe(conn_id, &channel).await {
                Ok(()) => {
                    tracing::debug!(conn_id, channel = %channel, "Subscribed");
                    PushFrame::new(&channel, EVENT_SUBSCRIPTION_SUCCEEDED, serde_json::json!({}))
                }
                Err(e) => {
                    tracing::warn!(conn_id, channel = %channel, error = %e, "Subscription refused");
                    PushFrame::new(
                        &channel,
                        EVENT_SUBSCRIPTION_ERROR,
                        serde_json::json!({ "error": e.to_string() }),
                    )
                }
            };
            ws_manager.send_to(conn_id, &reply).await;
        }
        ClientFrame::Unsubscribe { channel } => {
            if ws_manager.unsubscribe(conn_id, &channel).await {
                tracing::debug!(conn_id, channel = %channel, "Unsubscribed");
            }
        }
    }
}
