//! Sample submission lifecycle status.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not a known [`SubmissionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid submission status: {0}")]
pub struct StatusParseError(pub String);

/// Lifecycle status of one physical sample kit.
///
/// The normal progression is
/// `pending -> collected -> shipped -> delivered -> analyzed`, with `done`
/// accepted as a terminal alias of `analyzed`. Progression is not enforced:
/// any handler may set any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "submission_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Kit issued, nothing collected yet.
    #[default]
    Pending,
    Collected,
    Shipped,
    /// Received by the lab.
    Delivered,
    Analyzed,
    /// Terminal alias of `Analyzed`.
    Done,
}

impl SubmissionStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Collected,
        Self::Shipped,
        Self::Delivered,
        Self::Analyzed,
        Self::Done,
    ];

    /// Position in the lifecycle. `Done` shares the rank of `Analyzed`.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Collected => 1,
            Self::Shipped => 2,
            Self::Delivered => 3,
            Self::Analyzed | Self::Done => 4,
        }
    }

    /// Compare lifecycle positions. `Done` and `Analyzed` compare equal.
    #[must_use]
    pub fn lifecycle_cmp(self, other: Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    /// Whether analysis has finished.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Analyzed | Self::Done)
    }

    /// Whether setting this status should stamp `analyzed_at`.
    #[must_use]
    pub const fn stamps_analyzed_at(self) -> bool {
        self.is_complete()
    }

    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Collected => "collected",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Analyzed => "analyzed",
            Self::Done => "done",
        }
    }

    /// Human-readable badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting Collection",
            Self::Collected => "Sample Collected",
            Self::Shipped => "In Transit",
            Self::Delivered => "Lab Received",
            Self::Analyzed => "Analysis Complete",
            Self::Done => "Results Ready",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_order() {
        let ranks: Vec<u8> = SubmissionStatus::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 4]);
        assert_eq!(
            SubmissionStatus::Shipped.lifecycle_cmp(SubmissionStatus::Delivered),
            Ordering::Less
        );
        assert_eq!(
            SubmissionStatus::Done.lifecycle_cmp(SubmissionStatus::Analyzed),
            Ordering::Equal
        );
    }

    #[test]
    fn test_analyzed_at_stamping() {
        assert!(SubmissionStatus::Analyzed.stamps_analyzed_at());
        assert!(SubmissionStatus::Done.stamps_analyzed_at());
        assert!(!SubmissionStatus::Pending.stamps_analyzed_at());
        assert!(!SubmissionStatus::Delivered.stamps_analyzed_at());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "shipped".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::Shipped
        );
        assert_eq!(
            "lost".parse::<SubmissionStatus>(),
            Err(StatusParseError("lost".to_owned()))
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SubmissionStatus::Analyzed).unwrap();
        assert_eq!(json, "\"analyzed\"");
        let parsed: SubmissionStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, SubmissionStatus::Done);
    }
}
