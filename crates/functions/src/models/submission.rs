//! Public submission view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mindwell_core::{Submission, SubmissionStatus, TrackingId};

/// Public view of a submission returned by `sample-status`.
///
/// Has no owner email field; anyone holding a tracking ID may query it.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub tracking_id: TrackingId,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionSummary {
    fn from(submission: Submission) -> Self {
        Self {
            tracking_id: submission.tracking_id,
            status: submission.status,
            created_at: submission.created_at,
            analyzed_at: submission.analyzed_at,
        }
    }
}
