#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rollcall_api::auth::jwt::{generate_access_token, JwtConfig};
use rollcall_api::config::ServerConfig;
use rollcall_api::pipeline::build_pipeline;
use rollcall_api::router::build_app_router;
use rollcall_api::state::AppState;
use rollcall_api::ws::WsManager;
use rollcall_core::types::DbId;
use rollcall_events::delivery::sms::SimulatedSmsGateway;
use rollcall_events::{DispatcherBuilder, Dispatcher};
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    let jwt = JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    ServerConfig::from_lookup(|_| None, jwt)
}

/// A router plus the hub it publishes through.
pub struct TestApp {
    pub router: Router,
    pub ws_manager: Arc<WsManager>,
}

fn app_with(pool: PgPool, dispatcher: Dispatcher, ws_manager: Arc<WsManager>) -> Router {
    app_with_config(pool, dispatcher, ws_manager, test_config())
}

fn app_with_config(
    pool: PgPool,
    dispatcher: Dispatcher,
    ws_manager: Arc<WsManager>,
    config: ServerConfig,
) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager,
        dispatcher,
    };
    build_app_router(state, &config)
}

/// The production router and pipeline, with SMS simulated and mail off.
///
/// The dispatch worker is spawned on the test runtime.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let ws_manager = Arc::new(WsManager::new());
    let pipeline = build_pipeline(
        pool.clone(),
        Arc::clone(&ws_manager),
        Arc::new(SimulatedSmsGateway),
        None,
    );
    tokio::spawn(pipeline.worker.run());

    TestApp {
        router: app_with(pool, pipeline.dispatcher, Arc::clone(&ws_manager)),
        ws_manager,
    }
}

/// A router built from `config`, with no dispatch worker behind it.
pub fn build_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let (dispatcher, _worker) = DispatcherBuilder::new().build();
    app_with_config(pool, dispatcher, Arc::new(WsManager::new()), config)
}

/// A router whose dispatch worker is already gone.
pub fn build_app_without_worker(pool: PgPool) -> Router {
    let (dispatcher, worker) = DispatcherBuilder::new().build();
    drop(worker);
    app_with(pool, dispatcher, Arc::new(WsManager::new()))
}

pub fn token(user_id: DbId, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

pub async fn insert_user(pool: &PgPool, name: &str, role: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(format!("{name}@school.example"))
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str, bearer: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, bearer, None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    bearer: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, bearer, Some(body)).await
}

pub async fn post(app: Router, uri: &str, bearer: Option<&str>) -> Response<Body> {
    send(app, Method::POST, uri, bearer, None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
