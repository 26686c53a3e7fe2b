//! SMS gateway client.
//!
//! [`SmsGateway::send`] reports success as a `bool` and never returns an
//! error: a failed send is an operational signal, logged here, that must not
//! stop the caller from trying the next number.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sender id when `SMS_SENDER_ID` is not set.
const DEFAULT_SENDER_ID: &str = "ROLLCALL";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `message` to `destination`. `true` means accepted (or simulated).
    async fn send(&self, destination: &str, message: &str) -> bool;
}

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the HTTP SMS provider.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Provider endpoint accepting a JSON POST.
    pub api_url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Sender id shown on the handset.
    pub sender_id: String,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMS_API_URL` is not set, in which case sends are
    /// simulated.
    ///
    /// | Variable        | Required | Default    |
    /// |-----------------|----------|------------|
    /// | `SMS_API_URL`   | yes      | --          |
    /// | `SMS_API_KEY`   | no       | --          |
    /// | `SMS_SENDER_ID` | no       | `ROLLCALL` |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("SMS_API_URL").ok()?;
        Some(Self {
            api_url,
            api_key: std::env::var("SMS_API_KEY").ok(),
            sender_id: std::env::var("SMS_SENDER_ID")
                .unwrap_or_else(|_| DEFAULT_SENDER_ID.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// HttpSmsGateway
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
}

/// Sends messages through an HTTP SMS provider.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn try_send(&self, destination: &str, message: &str) -> Result<(), reqwest::Error> {
        let mut request = self.client.post(&self.config.api_url).json(&SendRequest {
            to: destination,
            from: &self.config.sender_id,
            message,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, destination: &str, message: &str) -> bool {
        match self.try_send(destination, message).await {
            Ok(()) => {
                tracing::info!(to = destination, "SMS accepted by provider");
                true
            }
            Err(e) => {
                tracing::error!(to = destination, error = %e, "SMS send failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SimulatedSmsGateway
// ---------------------------------------------------------------------------

/// Logs the message instead of sending it. Used when no provider is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedSmsGateway;

#[async_trait]
impl SmsGateway for SimulatedSmsGateway {
    async fn send(&self, destination: &str, message: &str) -> bool {
        tracing::info!(to = destination, message, "Simulated SMS send");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
