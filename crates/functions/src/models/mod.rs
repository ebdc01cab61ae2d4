//! Response models for the functions service.

pub mod submission;

pub use mindwell_core::Submission;
pub use submission::SubmissionSummary;
