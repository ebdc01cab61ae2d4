//! `PostgreSQL` submission repository.
//!
//! Queries are checked at runtime (`query_as`) so the crate builds without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use mindwell_core::{Email, SubmissionStatus, TrackingId};

use super::{RepositoryError, SubmissionRepository};
use crate::models::SubmissionSummary;

/// Columns handlers may see. `user_email` is deliberately absent.
const SUMMARY_COLUMNS: &str = "tracking_id, status, created_at, analyzed_at";

/// Raw `submissions` row, without the owner.
#[derive(Debug, FromRow)]
struct SummaryRow {
    tracking_id: String,
    status: SubmissionStatus,
    created_at: DateTime<Utc>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SummaryRow> for SubmissionSummary {
    type Error = RepositoryError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let tracking_id = TrackingId::parse(&row.tracking_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tracking id in database: {e}"))
        })?;

        Ok(Self {
            tracking_id,
            status: row.status,
            created_at: row.created_at,
            analyzed_at: row.analyzed_at,
        })
    }
}

/// Repository for submission database operations.
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    /// Create a new submission repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn find_by_tracking_id(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<Option<SubmissionSummary>, RepositoryError> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM submissions WHERE tracking_id = $1");
        let row = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(tracking_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(SubmissionSummary::try_from).transpose()
    }

    async fn mark_analyzed(
        &self,
        tracking_id: &TrackingId,
        at: DateTime<Utc>,
    ) -> Result<Option<SubmissionSummary>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE submissions
            SET status = $2, analyzed_at = $3, updated_at = $3
            WHERE tracking_id = $1
            RETURNING {SUMMARY_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(tracking_id.as_str())
            .bind(SubmissionStatus::Analyzed)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SubmissionSummary::try_from).transpose()
    }

    async fn update_status_for_email(
        &self,
        email: &Email,
        status: SubmissionStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<SubmissionSummary>, RepositoryError> {
        // `email` is already trimmed and lowercased; intake rows may not be.
        let sql = format!(
            r"
            UPDATE submissions
            SET status = $2,
                updated_at = $3,
                analyzed_at = CASE WHEN $4 THEN $3 ELSE analyzed_at END
            WHERE lower(btrim(user_email)) = $1
            RETURNING {SUMMARY_COLUMNS}
            "
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(email.as_str())
            .bind(status)
            .bind(at)
            .bind(status.stamps_analyzed_at())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SubmissionSummary::try_from).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_columns_exclude_owner() {
        assert!(!SUMMARY_COLUMNS.contains("email"));
    }

    #[test]
    fn test_summary_row_conversion() {
        let row = SummaryRow {
            tracking_id: "ABC123".to_string(),
            status: SubmissionStatus::Shipped,
            created_at: Utc::now(),
            analyzed_at: None,
        };
        let summary = SubmissionSummary::try_from(row).unwrap();
        assert_eq!(summary.tracking_id.as_str(), "ABC123");

        let blank = SummaryRow {
            tracking_id: "  ".to_string(),
            status: SubmissionStatus::Pending,
            created_at: Utc::now(),
            analyzed_at: None,
        };
        assert!(matches!(
            SubmissionSummary::try_from(blank),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
