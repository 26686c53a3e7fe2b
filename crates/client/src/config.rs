use std::time::Duration;

/// Default seconds between full polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default cap on locally held notifications; also the poll page size.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Connection settings for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base URL, e.g. `http://localhost:3000`.
    pub api_url: String,
    /// WebSocket endpoint, e.g. `ws://localhost:3000/ws`.
    pub ws_url: String,
    /// Bearer token for the signed-in user.
    pub token: String,
    pub poll_interval: Duration,
    pub max_items: usize,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, ws_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ws_url: ws_url.into(),
            token: token.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `ROLLCALL_TOKEN` is set.
    ///
    /// | Variable                       | Default                  |
    /// |--------------------------------|--------------------------|
    /// | `ROLLCALL_API_URL`             | `http://localhost:3000`  |
    /// | `ROLLCALL_WS_URL`              | `ws://localhost:3000/ws` |
    /// | `ROLLCALL_TOKEN`               | --                       |
    /// | `ROLLCALL_POLL_INTERVAL_SECS`  | `30`                     |
    /// | `ROLLCALL_MAX_ITEMS`           | `20`                     |
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("ROLLCALL_TOKEN").ok()?;
        let api_url = std::env::var("ROLLCALL_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let ws_url =
            std::env::var("ROLLCALL_WS_URL").unwrap_or_else(|_| "ws://localhost:3000/ws".to_string());

        let poll_secs = std::env::var("ROLLCALL_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let max_items = std::env::var("ROLLCALL_MAX_ITEMS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ITEMS);

        Some(Self {
            poll_interval: Duration::from_secs(poll_secs),
            max_items,
            ..Self::new(api_url, ws_url, token)
        })
    }
}
