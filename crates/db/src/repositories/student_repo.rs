//! Repository for the `students` table.

use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::student::Student;

const COLUMNS: &str =
    "id, first_name, last_name, section_id, guardian_id, created_at, updated_at";

pub struct StudentRepo;

impl StudentRepo {
    /// Find a student by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM students WHERE id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
