use axum::routing::post;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/events`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(events::trigger_alert))
        .route("/attendance", post(events::record_attendance))
        .route("/schedule", post(events::change_schedule))
}
