//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::SubmissionRepository;
use crate::services::ReportMailer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Stores are held as trait objects so the same
/// router runs against `PostgreSQL` in production and in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    submissions: Arc<dyn SubmissionRepository>,
    mailer: Arc<dyn ReportMailer>,
    support_email: String,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `submissions` - Submission store
    /// * `mailer` - Report email transport
    /// * `support_email` - Contact printed in report email footers
    #[must_use]
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        mailer: Arc<dyn ReportMailer>,
        support_email: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                submissions,
                mailer,
                support_email: support_email.into(),
            }),
        }
    }

    /// Get the submission store.
    #[must_use]
    pub fn submissions(&self) -> &dyn SubmissionRepository {
        self.inner.submissions.as_ref()
    }

    /// Get the report mailer.
    #[must_use]
    pub fn mailer(&self) -> &dyn ReportMailer {
        self.inner.mailer.as_ref()
    }

    /// Support contact shown in report emails.
    #[must_use]
    pub fn support_email(&self) -> &str {
        &self.inner.support_email
    }
}
