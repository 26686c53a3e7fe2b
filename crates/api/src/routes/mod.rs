pub mod events;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notifications                       list (auth)
/// /notifications/read-all              mark all read (auth)
/// /notifications/{id}/read             mark one read (auth)
///
/// /events/alerts                       queue an alert (admin)
/// /events/attendance                   queue an attendance change (admin)
/// /events/schedule                     queue a schedule change (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notifications", notification::router())
        .nest("/events", events::router())
}
