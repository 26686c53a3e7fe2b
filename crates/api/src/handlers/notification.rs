//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`] and only ever touch
//! the caller's own rows.

use axum::extract::{Path, Query, State};
use axum::Json;
use rollcall_core::error::CoreError;
use rollcall_core::types::DbId;
use rollcall_db::models::notification::NotificationPage;
use rollcall_db::repositories::NotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Clamped to the configured page bounds.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatusOk {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub status: &'static str,
    pub marked_read: u64,
}

/// GET /api/v1/notifications
///
/// The most recent notifications plus the number of unread rows among them.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<NotificationPage>> {
    let limit = state.config.listing.page_size(params.limit);
    let page = NotificationRepo::page(&state.pool, auth.user_id, limit).await?;
    Ok(Json(page))
}

/// POST /api/v1/notifications/{id}/read
///
/// Marking an already-read notification succeeds without changing it.
/// Returns 404 if the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<Json<StatusOk>> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(Json(StatusOk { status: "ok" }))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MarkAllReadResponse>> {
    let marked_read = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, marked_read, "Marked all notifications read");

    Ok(Json(MarkAllReadResponse {
        status: "ok",
        marked_read,
    }))
}
