//! Keep-alive pings so idle push sockets survive proxies.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::ws::manager::WsManager;

/// Ping every connection once per `every` until the hub shuts down.
///
/// The first ping goes out one full period after start. A tick that comes
/// after shutdown ends the task instead of pinging.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + every, every);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;
            if ws_manager.is_shut_down() {
                tracing::debug!("Push hub closed, heartbeat stopped");
                return;
            }
            let pinged = ws_manager.ping_all().await;
            if pinged > 0 {
                tracing::trace!(pinged, "Heartbeat sent");
            }
        }
    })
}
