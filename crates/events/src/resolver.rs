//! Student → guardian contact number resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use rollcall_core::types::DbId;
use rollcall_db::models::guardian::Guardian;

use crate::directory::Directory;

/// Maps a student to the distinct phone numbers of their guardians.
#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn Directory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Distinct contact numbers for `student_id`.
    ///
    /// Linked guardians come first; the legacy single-guardian reference is
    /// consulted only when they yield no number at all. Numbers are compared
    /// as stored, without normalisation. An empty set is a valid answer.
    pub async fn resolve_contacts(&self, student_id: DbId) -> Result<BTreeSet<String>, sqlx::Error> {
        let linked = self.directory.linked_guardians(student_id).await?;
        let numbers: BTreeSet<String> = linked.iter().filter_map(contact_of).collect();

        if !numbers.is_empty() {
            return Ok(numbers);
        }

        let legacy = self.directory.legacy_guardian(student_id).await?;
        let numbers: BTreeSet<String> = legacy.as_ref().and_then(contact_of).into_iter().collect();

        if !numbers.is_empty() {
            tracing::debug!(student_id, "Resolved contact from legacy guardian reference");
        }
        Ok(numbers)
    }
}

/// A guardian's number, ignoring blank values.
fn contact_of(guardian: &Guardian) -> Option<String> {
    guardian
        .contact_number
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{guardian, FakeDirectory};

    #[tokio::test]
    async fn linked_guardians_are_deduplicated() {
        let directory = FakeDirectory::default()
            .with_link(1, guardian(10, Some("+639171111111")))
            .with_link(1, guardian(11, Some("+639171111111")))
            .with_link(1, guardian(12, Some("+639172222222")))
            .with_link(1, guardian(13, None))
            .with_legacy(1, guardian(14, Some("+639179999999")));
        let resolver = RecipientResolver::new(Arc::new(directory));

        let numbers = resolver.resolve_contacts(1).await.unwrap();
        assert_eq!(
            numbers.into_iter().collect::<Vec<_>>(),
            vec!["+639171111111".to_string(), "+639172222222".to_string()]
        );
    }

    #[tokio::test]
    async fn legacy_guardian_is_the_fallback() {
        let directory = FakeDirectory::default()
            .with_link(1, guardian(13, Some("   ")))
            .with_legacy(1, guardian(14, Some("+639179999999")));
        let resolver = RecipientResolver::new(Arc::new(directory));

        let numbers = resolver.resolve_contacts(1).await.unwrap();
        assert_eq!(numbers.len(), 1);
        assert!(numbers.contains("+639179999999"));
    }

    #[tokio::test]
    async fn no_contacts_is_an_empty_set() {
        let directory = FakeDirectory::default().with_legacy(1, guardian(14, None));
        let resolver = RecipientResolver::new(Arc::new(directory));

        assert!(resolver.resolve_contacts(1).await.unwrap().is_empty());
        assert!(resolver.resolve_contacts(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn numbers_are_not_normalised() {
        let directory = FakeDirectory::default()
            .with_link(1, guardian(10, Some("+1234567890")))
            .with_link(1, guardian(11, Some("1234567890")));
        let resolver = RecipientResolver::new(Arc::new(directory));

        assert_eq!(resolver.resolve_contacts(1).await.unwrap().len(), 2);
    }
}
