//! Persisted notification list.

use async_trait::async_trait;
use rollcall_core::projection::NotificationData;
use rollcall_core::types::DbId;
use rollcall_db::repositories::NotificationRepo;
use rollcall_db::DbPool;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Append a notification to `user_id`'s list, returning its id.
    async fn store(&self, user_id: DbId, data: &NotificationData) -> Result<DbId, sqlx::Error>;
}

/// [`NotificationSink`] writing to the `notifications` table.
#[derive(Clone)]
pub struct PgNotificationSink {
    pool: DbPool,
}

impl PgNotificationSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn store(&self, user_id: DbId, data: &NotificationData) -> Result<DbId, sqlx::Error> {
        NotificationRepo::create(&self.pool, user_id, data).await
    }
}
