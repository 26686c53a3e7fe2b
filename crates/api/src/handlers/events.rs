//! Event ingestion: the HTTP entry point for producers of domain events.
//!
//! Handlers validate the body, enqueue a [`DomainEvent`] and answer 202
//! before any listener runs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rollcall_core::alert::AlertPayload;
use rollcall_core::error::CoreError;
use rollcall_core::event::{AttendanceChange, DomainEvent, ScheduleChange};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Queued {
    pub status: &'static str,
}

fn queue(state: &AppState, event: DomainEvent) -> AppResult<(StatusCode, Json<Queued>)> {
    state.dispatcher.dispatch(event)?;
    Ok((StatusCode::ACCEPTED, Json(Queued { status: "queued" })))
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{field} must not be empty"
        ))));
    }
    Ok(())
}

/// POST /api/v1/events/alerts
pub async fn trigger_alert(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AlertPayload>,
) -> AppResult<(StatusCode, Json<Queued>)> {
    require("title", payload.title())?;
    require("message", payload.message())?;
    tracing::info!(
        user_id = user.user_id,
        level = %payload.level(),
        title = payload.title(),
        "Alert received"
    );
    queue(&state, DomainEvent::AlertTriggered(payload))
}

/// POST /api/v1/events/attendance
pub async fn record_attendance(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    Json(change): Json<AttendanceChange>,
) -> AppResult<(StatusCode, Json<Queued>)> {
    require("status", &change.status)?;
    queue(&state, DomainEvent::AttendanceChanged(change))
}

/// POST /api/v1/events/schedule
pub async fn change_schedule(
    RequireAdmin(_user): RequireAdmin,
    State(state): State<AppState>,
    Json(change): Json<ScheduleChange>,
) -> AppResult<(StatusCode, Json<Queued>)> {
    require("action", &change.action)?;
    queue(&state, DomainEvent::ScheduleChanged(change))
}
