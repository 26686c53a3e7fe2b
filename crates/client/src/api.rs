//! REST client for the notification endpoints.

use async_trait::async_trait;
use rollcall_core::projection::NotificationData;
use rollcall_core::types::{DbId, Timestamp};
use serde::Deserialize;

use crate::error::ClientError;

/// One notification row as the server reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerNotification {
    pub id: DbId,
    pub data: NotificationData,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Response of `GET /api/v1/notifications`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub notifications: Vec<ServerNotification>,
    pub unread_count: i64,
}

#[derive(Debug, Deserialize)]
struct MarkAllReadResponse {
    marked_read: u64,
}

/// The server operations a session depends on.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch(&self, limit: usize) -> Result<Snapshot, ClientError>;

    async fn mark_read(&self, id: DbId) -> Result<(), ClientError>;

    /// Returns how many rows the server marked.
    async fn mark_all_read(&self) -> Result<u64, ClientError>;
}

/// HTTP client for the notification API of one server.
pub struct NotificationApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl NotificationApi {
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:3000`.
    pub fn new(api_url: String, token: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, token)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/notifications{path}", self.api_url)
    }

    /// Ensure the response has a success status code, or turn it into a
    /// [`ClientError::Api`] carrying the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl NotificationSource for NotificationApi {
    async fn fetch(&self, limit: usize) -> Result<Snapshot, ClientError> {
        let response = self
            .client
            .get(self.url(""))
            .bearer_auth(&self.token)
            .query(&[("limit", limit)])
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.json::<Snapshot>().await?)
    }

    async fn mark_read(&self, id: DbId) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/{id}/read")))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<u64, ClientError> {
        let response = self
            .client
            .post(self.url("/read-all"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let body = Self::ensure_success(response)
            .await?
            .json::<MarkAllReadResponse>()
            .await?;
        Ok(body.marked_read)
    }
}
