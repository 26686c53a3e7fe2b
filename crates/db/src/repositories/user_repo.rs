//! Repository for the `users` table.

use sqlx::PgPool;

use crate::models::user::User;

const COLUMNS: &str = "id, name, email, role, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// The lowest-id user holding `role`.
    pub async fn first_with_role(pool: &PgPool, role: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE role = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_optional(pool)
            .await
    }
}
