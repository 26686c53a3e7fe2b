//! Integration tests for event ingestion and the pipeline behind it.

mod common;

use std::time::Duration;

use axum::extract::ws::Message;
use axum::http::StatusCode;
use common::{body_json, insert_user, post_json, token};
use rollcall_core::channels::{user_channel, CHANNEL_ADMIN_NOTIFICATIONS, CHANNEL_ATTENDANCE_PUBLIC};
use rollcall_core::roles::{ROLE_ADMIN, ROLE_TEACHER};
use rollcall_core::wire::PushFrame;
use rollcall_db::repositories::NotificationRepo;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::mpsc::UnboundedReceiver;

async fn next_frame(rx: &mut UnboundedReceiver<Message>) -> PushFrame {
    let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame within timeout")
        .expect("connection still open");
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

fn alert() -> serde_json::Value {
    json!({
        "title": "Card cloning suspected",
        "message": "Card 0042 used at two gates within a minute",
        "url": "https://school.example/security/42",
        "level": "critical"
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingestion_is_admin_only(pool: PgPool) {
    let teacher = insert_user(&pool, "adviser", ROLE_TEACHER).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router.clone(),
        "/api/v1/events/alerts",
        Some(&token(teacher, ROLE_TEACHER)),
        alert(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(app.router, "/api/v1/events/alerts", None, alert()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_alert_title_is_rejected(pool: PgPool) {
    let admin = insert_user(&pool, "registrar", ROLE_ADMIN).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router,
        "/api/v1/events/alerts",
        Some(&token(admin, ROLE_ADMIN)),
        json!({"title": "  ", "message": "m"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn alert_is_stored_pushed_and_broadcast(pool: PgPool) {
    let admin = insert_user(&pool, "registrar", ROLE_ADMIN).await;
    let app = common::build_test_app(pool.clone());

    let mut private_rx = app.ws_manager.add("admin-tab".into(), Some(admin)).await;
    app.ws_manager
        .subscribe("admin-tab", &user_channel(admin))
        .await
        .unwrap();
    let mut public_rx = app.ws_manager.add("lobby-screen".into(), None).await;
    app.ws_manager
        .subscribe("lobby-screen", CHANNEL_ADMIN_NOTIFICATIONS)
        .await
        .unwrap();

    let response = post_json(
        app.router,
        "/api/v1/events/alerts",
        Some(&token(admin, ROLE_ADMIN)),
        alert(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["status"], "queued");

    let private = next_frame(&mut private_rx).await;
    assert_eq!(private.event, "AlertNotification");
    assert_eq!(private.payload["title"], "Card cloning suspected");
    assert_eq!(private.payload["level"], "critical");

    let public = next_frame(&mut public_rx).await;
    assert_eq!(public.channel, CHANNEL_ADMIN_NOTIFICATIONS);
    assert_eq!(public.event, "AlertBroadcasted");
    assert_eq!(public.payload["url"], "https://school.example/security/42");

    // The store is written before the private push goes out.
    let stored = NotificationRepo::list_recent(&pool, admin, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data.title, "Card cloning suspected");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attendance_change_reaches_the_public_board(pool: PgPool) {
    let admin = insert_user(&pool, "registrar", ROLE_ADMIN).await;
    let student_id: i64 = sqlx::query_scalar(
        "INSERT INTO students (first_name, last_name) VALUES ('Ana', 'Cruz') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    let app = common::build_test_app(pool);

    let mut rx = app.ws_manager.add("board".into(), None).await;
    app.ws_manager
        .subscribe("board", CHANNEL_ATTENDANCE_PUBLIC)
        .await
        .unwrap();

    let response = post_json(
        app.router,
        "/api/v1/events/attendance",
        Some(&token(admin, ROLE_ADMIN)),
        json!({
            "student_id": student_id,
            "status": "present",
            "check_in_time": "14:05:00",
            "check_out_time": ""
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame.event, "AttendanceUpdated");
    assert_eq!(frame.payload["studentName"], "Ana Cruz");
    assert_eq!(frame.payload["message"], "Ana Cruz has checked in at 2:05 PM.");
    assert!(frame.payload["checkOutTime"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closed_dispatcher_answers_503(pool: PgPool) {
    let admin = insert_user(&pool, "registrar", ROLE_ADMIN).await;
    let router = common::build_app_without_worker(pool);

    let response = post_json(
        router,
        "/api/v1/events/schedule",
        Some(&token(admin, ROLE_ADMIN)),
        json!({"section_id": 4, "schedule_id": 12, "action": "updated"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "DISPATCHER_UNAVAILABLE");
}
