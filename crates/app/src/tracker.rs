//! Live sample status for the signed-in user.
//!
//! The tracker loads the user's newest submission once, then applies change
//! events from a [`SubmissionFeed`]. Milestone changes are announced through
//! the notifier.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use mindwell_core::{Email, Submission, SubmissionStatus, TrackingId};

use crate::error::StoreError;
use crate::notice::{Notice, Notifier};
use crate::store::{SubmissionFeed, SubmissionReader};

const UPDATE_TITLE: &str = "Sample Status Update";

/// What the dashboard shows about the current kit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub submission: Option<Submission>,
}

impl TrackerState {
    #[must_use]
    pub fn status(&self) -> Option<SubmissionStatus> {
        self.submission.as_ref().map(|s| s.status)
    }

    #[must_use]
    pub fn tracking_id(&self) -> Option<&TrackingId> {
        self.submission.as_ref().map(|s| &s.tracking_id)
    }

    #[must_use]
    pub const fn has_submission(&self) -> bool {
        self.submission.is_some()
    }

    /// Replace the tracked row, returning a notice when the status moved to
    /// a milestone.
    pub fn apply(&mut self, submission: Submission) -> Option<Notice> {
        let previous = self.status();
        let status = submission.status;
        self.submission = Some(submission);

        if previous == Some(status) {
            return None;
        }
        milestone_message(status).map(|message| Notice::info(UPDATE_TITLE, message))
    }
}

fn milestone_message(status: SubmissionStatus) -> Option<&'static str> {
    match status {
        SubmissionStatus::Shipped => Some("Your sample has been shipped to the lab!"),
        SubmissionStatus::Delivered => Some("Your sample has been received by the lab."),
        SubmissionStatus::Analyzed => {
            Some("Great news! Your analysis is complete. Results are now available.")
        }
        _ => None,
    }
}

/// Running tracker. Dropping it unsubscribes.
pub struct SubmissionTracker {
    rx: watch::Receiver<TrackerState>,
    task: JoinHandle<()>,
}

impl SubmissionTracker {
    /// Subscribe to `email`'s submissions and load the newest one.
    ///
    /// The subscription is opened before the initial read so no change in
    /// between is lost. A failed initial read is logged and the tracker
    /// starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be opened.
    pub async fn start(
        reader: Arc<dyn SubmissionReader>,
        feed: &dyn SubmissionFeed,
        notifier: Arc<dyn Notifier>,
        email: &Email,
    ) -> Result<Self, StoreError> {
        let mut subscription = feed.subscribe(email).await?;

        let initial = match reader.latest_by_email(email).await {
            Ok(submission) => TrackerState { submission },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load latest submission");
                TrackerState::default()
            }
        };

        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let mut state = tx.borrow().clone();
                if let Some(notice) = state.apply(event.submission) {
                    notifier.notify(notice);
                }
                tx.send_replace(state);
            }
        });

        Ok(Self { rx, task })
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.rx.borrow().clone()
    }

    /// Receive every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.rx.clone()
    }
}

impl Drop for SubmissionTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
