//! Follow a user's notifications from the terminal.
//!
//! Reads `ROLLCALL_*` settings (see [`ClientConfig::from_env`]) plus
//! `ROLLCALL_USER_ID`, then logs the unread count and newest item whenever
//! the store changes. Ctrl-C tears the session down.

use rollcall_client::{ClientConfig, StoreView};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall_client=info,rollcall_tail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().expect("ROLLCALL_TOKEN must be set");
    let user_id: i64 = std::env::var("ROLLCALL_USER_ID")
        .expect("ROLLCALL_USER_ID must be set")
        .parse()
        .expect("ROLLCALL_USER_ID must be a valid i64");

    let handle = rollcall_client::start(config, user_id);
    let mut view = handle.view.clone();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                report(&view.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Some(store) = handle.shutdown().await {
        tracing::info!(unread = store.unread_count(), "Session closed");
    }
}

fn report(view: &StoreView) {
    match view.items.first() {
        Some(latest) => tracing::info!(
            state = ?view.state,
            unread = view.unread_count,
            latest = %latest.data.title,
            level = %latest.data.level,
            "Notifications updated"
        ),
        None => tracing::info!(state = ?view.state, unread = view.unread_count, "No notifications"),
    }
}
