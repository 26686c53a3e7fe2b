use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_api::config::ServerConfig;
use rollcall_api::pipeline::{self, Pipeline};
use rollcall_api::router::build_app_router;
use rollcall_api::state::AppState;
use rollcall_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rollcall_api=debug,rollcall_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        bind = %config.bind,
        ws_path = %config.push.path,
        page_size = config.listing.default_limit,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = rollcall_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    rollcall_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    rollcall_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket hub ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), config.push.heartbeat);

    // --- Event pipeline ---
    let Pipeline {
        dispatcher,
        worker,
        mail_queue,
    } = pipeline::build_pipeline(
        pool.clone(),
        Arc::clone(&ws_manager),
        pipeline::sms_gateway_from_env(),
        pipeline::mailer_from_env(),
    );
    let worker_handle = tokio::spawn(worker.run());

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        dispatcher,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(addr = %config.bind, "Starting server");

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // The router owned the last dispatcher handle, so the worker now drains
    // whatever is still queued and exits.
    tracing::info!("Server stopped accepting connections, draining event queue");
    if tokio::time::timeout(config.drain.events, worker_handle).await.is_err() {
        tracing::error!(
            timeout_secs = config.drain.events.as_secs(),
            "Event queue did not drain in time"
        );
    }

    mail_queue.close();
    if tokio::time::timeout(config.drain.mail, mail_queue.wait()).await.is_err() {
        tracing::error!(pending = mail_queue.len(), "Queued emails abandoned at shutdown");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
