//! In-memory submission repository for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mindwell_core::{Email, SubmissionStatus, TrackingId};

use super::{RepositoryError, SubmissionRepository};
use crate::models::{Submission, SubmissionSummary};

/// A row as lab intake wrote it. The owner email is kept verbatim.
#[derive(Debug, Clone)]
struct StoredRow {
    summary: SubmissionSummary,
    user_email: String,
    updated_at: DateTime<Utc>,
}

impl StoredRow {
    /// Same rule as `lower(btrim(user_email)) = $1`.
    fn owned_by(&self, email: &Email) -> bool {
        self.user_email.trim().to_lowercase() == email.as_str()
    }

    fn apply_status(&mut self, status: SubmissionStatus, at: DateTime<Utc>) {
        self.summary.status = status;
        self.updated_at = at;
        if status.stamps_analyzed_at() {
            self.summary.analyzed_at = Some(at);
        }
    }
}

/// Submission store backed by a `HashMap` keyed by tracking ID.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemorySubmissionRepository {
    rows: Arc<RwLock<HashMap<String, StoredRow>>>,
}

impl MemorySubmissionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the lock is poisoned.
    pub fn insert(&self, submission: Submission) -> Result<(), RepositoryError> {
        let user_email = submission.user_email.as_str().to_owned();
        self.insert_with_owner(submission, &user_email)
    }

    /// Insert or replace a submission, storing `user_email` exactly as given
    /// instead of the normalized address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the lock is poisoned.
    pub fn insert_with_owner(
        &self,
        submission: Submission,
        user_email: &str,
    ) -> Result<(), RepositoryError> {
        let row = StoredRow {
            updated_at: submission.updated_at,
            user_email: user_email.to_owned(),
            summary: submission.into(),
        };
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        rows.insert(row.summary.tracking_id.as_str().to_owned(), row);
        Ok(())
    }

    /// Snapshot of one row.
    #[must_use]
    pub fn get(&self, tracking_id: &str) -> Option<SubmissionSummary> {
        self.rows
            .read()
            .ok()?
            .get(tracking_id)
            .map(|row| row.summary.clone())
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::DataCorruption("submission store lock poisoned".to_owned())
}

#[async_trait]
impl SubmissionRepository for MemorySubmissionRepository {
    async fn find_by_tracking_id(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<Option<SubmissionSummary>, RepositoryError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(tracking_id.as_str()).map(|row| row.summary.clone()))
    }

    async fn mark_analyzed(
        &self,
        tracking_id: &TrackingId,
        at: DateTime<Utc>,
    ) -> Result<Option<SubmissionSummary>, RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        Ok(rows.get_mut(tracking_id.as_str()).map(|row| {
            row.apply_status(SubmissionStatus::Analyzed, at);
            row.summary.clone()
        }))
    }

    async fn update_status_for_email(
        &self,
        email: &Email,
        status: SubmissionStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<SubmissionSummary>, RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let updated = rows
            .values_mut()
            .filter(|row| row.owned_by(email))
            .map(|row| {
                row.apply_status(status, at);
                row.summary.clone()
            })
            .collect();
        Ok(updated)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use mindwell_core::SubmissionId;

    use super::*;

    fn kit(tracking_id: &str, email: &str) -> Submission {
        let created = Utc::now() - Duration::days(1);
        Submission {
            id: SubmissionId::generate(),
            tracking_id: TrackingId::parse(tracking_id).unwrap(),
            user_email: Email::parse(email).unwrap(),
            status: SubmissionStatus::Delivered,
            created_at: created,
            updated_at: created,
            analyzed_at: None,
        }
    }

    #[tokio::test]
    async fn test_mark_analyzed_unknown_kit() {
        let repo = MemorySubmissionRepository::new();
        let missing = TrackingId::parse("NOPE").unwrap();
        assert!(repo.mark_analyzed(&missing, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_only_touches_owner_rows() {
        let repo = MemorySubmissionRepository::new();
        repo.insert(kit("A1", "one@example.com")).unwrap();
        repo.insert(kit("A2", "one@example.com")).unwrap();
        repo.insert(kit("B1", "two@example.com")).unwrap();

        let email = Email::parse("one@example.com").unwrap();
        let updated = repo
            .update_status_for_email(&email, SubmissionStatus::Pending, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|s| s.analyzed_at.is_none()));
        assert_eq!(repo.get("B1").unwrap().status, SubmissionStatus::Delivered);
    }

    #[tokio::test]
    async fn test_update_status_matches_mixed_case_intake_email() {
        let repo = MemorySubmissionRepository::new();
        repo.insert_with_owner(kit("A1", "alex@x.com"), " Alex@X.com")
            .unwrap();

        let email = Email::parse("Alex@X.com").unwrap();
        let updated = repo
            .update_status_for_email(&email, SubmissionStatus::Done, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert!(updated.first().unwrap().analyzed_at.is_some());
    }

    #[tokio::test]
    async fn test_malformed_owner_does_not_break_reads() {
        let repo = MemorySubmissionRepository::new();
        repo.insert_with_owner(kit("A1", "alex@x.com"), "").unwrap();

        let id = TrackingId::parse("A1").unwrap();
        let found = repo.find_by_tracking_id(&id).await.unwrap().unwrap();
        assert_eq!(found.status, SubmissionStatus::Delivered);
        assert!(repo.mark_analyzed(&id, Utc::now()).await.unwrap().is_some());
    }
}
