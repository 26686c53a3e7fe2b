//! Repository for the `notifications` table.

use rollcall_core::projection::NotificationData;
use rollcall_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::notification::{Notification, NotificationPage};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, data, read_at, created_at";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Store a notification for a user, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        data: &NotificationData,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (user_id, data) \
             VALUES ($1, $2) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(Json(data))
        .fetch_one(pool)
        .await
    }

    /// The `limit` most recent notifications for a user, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// The `limit` most recent notifications and how many of them are unread.
    pub async fn page(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<NotificationPage, sqlx::Error> {
        Self::list_recent(pool, user_id, limit)
            .await
            .map(NotificationPage::new)
    }

    /// Mark a single notification as read.
    ///
    /// An already-read notification keeps its original `read_at`. Returns
    /// `false` only when no notification with that id belongs to the user.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all unread notifications as read for a user.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = NOW() \
             WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
