//! Core types for MindWell.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod preferences;
pub mod status;
pub mod submission;
pub mod tracking;

pub use email::{Email, EmailError};
pub use id::*;
pub use preferences::AlertPreferences;
pub use status::{StatusParseError, SubmissionStatus};
pub use submission::Submission;
pub use tracking::{TrackingId, TrackingIdError};
