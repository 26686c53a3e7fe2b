use rollcall_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `guardians` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Guardian {
    pub id: DbId,
    pub name: String,
    pub contact_number: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
