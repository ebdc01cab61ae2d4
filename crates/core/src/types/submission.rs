//! Sample submission record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Email, SubmissionId, SubmissionStatus, TrackingId};

/// One physical sample kit.
///
/// Rows are created by lab intake; this workspace only reads them and moves
/// their status along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    /// Externally assigned kit identifier.
    pub tracking_id: TrackingId,
    /// Owner of the kit.
    pub user_email: Email,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the status moves to `analyzed` or `done`.
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Apply a status change at `now`, stamping `analyzed_at` for
    /// completed statuses. Earlier `analyzed_at` values are kept otherwise.
    pub fn apply_status(&mut self, status: SubmissionStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        if status.stamps_analyzed_at() {
            self.analyzed_at = Some(now);
        }
    }
}
