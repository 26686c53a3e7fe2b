//! Server settings, read once at startup.
//!
//! Every value has a development default except the JWT secret. A value that
//! is set but malformed stops the process with a message naming the variable.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::jwt::JwtConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    pub listing: ListingConfig,
    pub push: PushHubConfig,
    pub drain: DrainConfig,
    pub jwt: JwtConfig,
}

/// Page sizes for `GET /notifications`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingConfig {
    /// Used when the caller sends no `limit`. Matches the client's list cap.
    pub default_limit: i64,
    pub max_limit: i64,
}

impl ListingConfig {
    /// The page size to serve for a requested `limit`.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Where sockets upgrade and how often idle ones are pinged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushHubConfig {
    pub path: String,
    pub heartbeat: Duration,
}

impl Default for PushHubConfig {
    fn default() -> Self {
        Self {
            path: "/ws".to_string(),
            heartbeat: Duration::from_secs(30),
        }
    }
}

/// Upper bounds on the work done after the listener stops accepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    /// Queued events and in-flight listeners.
    pub events: Duration,
    /// Emails still being handed to the relay.
    pub mail: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            events: Duration::from_secs(30),
            mail: Duration::from_secs(15),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), JwtConfig::from_env())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// | Variable                  | Default                 |
    /// |---------------------------|-------------------------|
    /// | `ROLLCALL_BIND`           | `0.0.0.0:3000`          |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `NOTIFICATIONS_PAGE_SIZE` | `20`                    |
    /// | `NOTIFICATIONS_MAX_PAGE`  | `100`                   |
    /// | `WS_PATH`                 | `/ws`                   |
    /// | `WS_HEARTBEAT_SECS`       | `30`                    |
    /// | `EVENT_DRAIN_SECS`        | `30`                    |
    /// | `MAIL_DRAIN_SECS`         | `15`                    |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, jwt: JwtConfig) -> Self {
        let listing_defaults = ListingConfig::default();
        let max_limit = parsed(&lookup, "NOTIFICATIONS_MAX_PAGE", listing_defaults.max_limit).max(1);
        let default_limit = parsed(&lookup, "NOTIFICATIONS_PAGE_SIZE", listing_defaults.default_limit)
            .clamp(1, max_limit);

        let hub_defaults = PushHubConfig::default();
        let path = lookup("WS_PATH").unwrap_or(hub_defaults.path);
        assert!(path.starts_with('/'), "WS_PATH must start with '/', got '{path}'");

        let drain_defaults = DrainConfig::default();

        Self {
            bind: parsed(&lookup, "ROLLCALL_BIND", SocketAddr::from(([0, 0, 0, 0], 3000))),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            request_timeout: secs(&lookup, "REQUEST_TIMEOUT_SECS", Duration::from_secs(30)),
            listing: ListingConfig {
                default_limit,
                max_limit,
            },
            push: PushHubConfig {
                path,
                heartbeat: secs(&lookup, "WS_HEARTBEAT_SECS", hub_defaults.heartbeat),
            },
            drain: DrainConfig {
                events: secs(&lookup, "EVENT_DRAIN_SECS", drain_defaults.events),
                mail: secs(&lookup, "MAIL_DRAIN_SECS", drain_defaults.mail),
            },
            jwt,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} is invalid ('{raw}'): {e}")),
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Duration {
    Duration::from_secs(parsed(lookup, key, default.as_secs()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "config-test-secret".to_string(),
            access_token_expiry_mins: 60,
        }
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), jwt())
    }

    #[test]
    fn unset_variables_take_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.listing, ListingConfig::default());
        assert_eq!(config.push, PushHubConfig::default());
        assert_eq!(config.drain, DrainConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("ROLLCALL_BIND", "127.0.0.1:8080"),
            ("CORS_ORIGINS", "https://a.example, ,https://b.example"),
            ("WS_PATH", "/push"),
            ("MAIL_DRAIN_SECS", "3"),
        ]);
        assert_eq!(config.bind, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.push.path, "/push");
        assert_eq!(config.drain.mail, Duration::from_secs(3));
    }

    #[test]
    fn default_page_never_exceeds_the_maximum() {
        let config = from_pairs(&[("NOTIFICATIONS_PAGE_SIZE", "50"), ("NOTIFICATIONS_MAX_PAGE", "10")]);
        assert_eq!(config.listing.default_limit, 10);
    }

    #[test]
    fn page_size_is_clamped() {
        let listing = ListingConfig::default();
        assert_eq!(listing.page_size(None), 20);
        assert_eq!(listing.page_size(Some(0)), 1);
        assert_eq!(listing.page_size(Some(500)), 100);
        assert_eq!(listing.page_size(Some(7)), 7);
    }

    #[test]
    #[should_panic(expected = "EVENT_DRAIN_SECS is invalid")]
    fn malformed_value_fails_fast() {
        from_pairs(&[("EVENT_DRAIN_SECS", "soon")]);
    }

    #[test]
    #[should_panic(expected = "WS_PATH must start with '/'")]
    fn ws_path_must_be_absolute() {
        from_pairs(&[("WS_PATH", "ws")]);
    }
}
