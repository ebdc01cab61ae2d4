//! Database operations for the functions service.
//!
//! # Tables
//!
//! - `submissions` - Sample kit lifecycle, keyed by `tracking_id`, owned by `user_email`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/functions/migrations/` and run via:
//! ```bash
//! cargo run -p mindwell-cli -- migrate
//! ```

pub mod memory;
pub mod submissions;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use mindwell_core::{Email, SubmissionStatus, TrackingId};

use crate::models::SubmissionSummary;

pub use memory::MemorySubmissionRepository;
pub use submissions::PgSubmissionRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Storage seam for sample submissions.
///
/// Handlers only ever see this trait; production uses
/// [`PgSubmissionRepository`], tests use [`MemorySubmissionRepository`].
///
/// Rows are written by lab intake, so the stored owner email is not trusted
/// to be normalized or even valid. Reads return [`SubmissionSummary`] and
/// never decode it.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Look up a submission by its kit tracking ID.
    async fn find_by_tracking_id(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<Option<SubmissionSummary>, RepositoryError>;

    /// Set `status = analyzed` and stamp `analyzed_at` for one kit.
    ///
    /// Returns the updated row, or `None` if no kit has that tracking ID.
    async fn mark_analyzed(
        &self,
        tracking_id: &TrackingId,
        at: DateTime<Utc>,
    ) -> Result<Option<SubmissionSummary>, RepositoryError>;

    /// Set the status of every kit owned by `email`.
    ///
    /// Stored emails match ignoring case and surrounding whitespace.
    /// `analyzed_at` is stamped only for statuses where
    /// [`SubmissionStatus::stamps_analyzed_at`] holds. Returns the updated rows.
    async fn update_status_for_email(
        &self,
        email: &Email,
        status: SubmissionStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<SubmissionSummary>, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
