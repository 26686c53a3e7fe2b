//! Read access to the people the pipeline notifies.
//!
//! Listeners take an `Arc<dyn Directory>` rather than a pool so the lookup
//! side can be swapped for an in-memory double in tests.

use async_trait::async_trait;
use rollcall_core::roles::ROLE_ADMIN;
use rollcall_core::types::DbId;
use rollcall_db::models::guardian::Guardian;
use rollcall_db::models::student::Student;
use rollcall_db::models::user::User;
use rollcall_db::repositories::{GuardianRepo, StudentRepo, UserRepo};
use rollcall_db::DbPool;

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_student(&self, student_id: DbId) -> Result<Option<Student>, sqlx::Error>;

    /// Guardians linked through the many-to-many relation.
    async fn linked_guardians(&self, student_id: DbId) -> Result<Vec<Guardian>, sqlx::Error>;

    /// The guardian named by the deprecated single-guardian reference.
    async fn legacy_guardian(&self, student_id: DbId) -> Result<Option<Guardian>, sqlx::Error>;

    /// The first user holding the administrator role.
    async fn first_admin(&self) -> Result<Option<User>, sqlx::Error>;
}

/// [`Directory`] backed by the Postgres repositories.
#[derive(Clone)]
pub struct PgDirectory {
    pool: DbPool,
}

impl PgDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_student(&self, student_id: DbId) -> Result<Option<Student>, sqlx::Error> {
        StudentRepo::find_by_id(&self.pool, student_id).await
    }

    async fn linked_guardians(&self, student_id: DbId) -> Result<Vec<Guardian>, sqlx::Error> {
        GuardianRepo::list_for_student(&self.pool, student_id).await
    }

    async fn legacy_guardian(&self, student_id: DbId) -> Result<Option<Guardian>, sqlx::Error> {
        GuardianRepo::find_legacy_for_student(&self.pool, student_id).await
    }

    async fn first_admin(&self) -> Result<Option<User>, sqlx::Error> {
        UserRepo::first_with_role(&self.pool, ROLE_ADMIN).await
    }
}
