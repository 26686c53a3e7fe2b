//! Repository for `guardians` and the `guardian_student` relation.

use rollcall_core::types::DbId;
use sqlx::PgPool;

use crate::models::guardian::Guardian;

const COLUMNS: &str = "g.id, g.name, g.contact_number, g.created_at, g.updated_at";

pub struct GuardianRepo;

impl GuardianRepo {
    /// Guardians linked to a student through `guardian_student`.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<Guardian>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guardians g \
             JOIN guardian_student gs ON gs.guardian_id = g.id \
             WHERE gs.student_id = $1 \
             ORDER BY g.id"
        );
        sqlx::query_as::<_, Guardian>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// The guardian behind the deprecated `students.guardian_id` column.
    pub async fn find_legacy_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<Guardian>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guardians g \
             JOIN students s ON s.guardian_id = g.id \
             WHERE s.id = $1"
        );
        sqlx::query_as::<_, Guardian>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }
}
