//! Dashboard progress derived from the tracked submission.

use mindwell_core::SubmissionStatus;

use crate::tracker::TrackerState;

const STEP_LABELS: [&str; 5] = [
    "Sample Collected",
    "Shipped to Lab",
    "Lab Received",
    "Analysis in Progress",
    "Results Available",
];

/// One row of the progress tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStep {
    pub label: &'static str,
    pub completed: bool,
    /// First incomplete step.
    pub current: bool,
}

/// How many progress steps `status` has completed.
const fn completed_steps(status: SubmissionStatus) -> usize {
    match status {
        SubmissionStatus::Pending => 0,
        SubmissionStatus::Collected => 1,
        SubmissionStatus::Shipped => 2,
        SubmissionStatus::Delivered => 3,
        SubmissionStatus::Analyzed | SubmissionStatus::Done => STEP_LABELS.len(),
    }
}

/// Progress rows for a kit in `status`. No kit means nothing is done yet.
#[must_use]
pub fn progress_steps(status: Option<SubmissionStatus>) -> Vec<ProgressStep> {
    let done = status.map_or(0, completed_steps);
    STEP_LABELS
        .into_iter()
        .enumerate()
        .map(|(i, label)| ProgressStep {
            label,
            completed: i < done,
            current: i == done,
        })
        .collect()
}

/// Everything the dashboard header needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub tracking_id: Option<String>,
    pub badge: Option<&'static str>,
    pub steps: Vec<ProgressStep>,
    pub results_ready: bool,
}

impl From<&TrackerState> for DashboardView {
    fn from(state: &TrackerState) -> Self {
        let status = state.status();
        Self {
            tracking_id: state.tracking_id().map(ToString::to_string),
            badge: status.map(SubmissionStatus::label),
            steps: progress_steps(status),
            results_ready: status.is_some_and(SubmissionStatus::is_complete),
        }
    }
}
