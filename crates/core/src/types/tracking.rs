//! Sample kit tracking identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TrackingId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingIdError {
    #[error("tracking id cannot be empty")]
    Empty,
    #[error("tracking id must be at most {max} characters")]
    TooLong { max: usize },
}

/// Externally assigned, unique identifier printed on a sample kit.
///
/// The format is owned by lab intake; only presence and a sane length are
/// checked here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    pub const MAX_LENGTH: usize = 128;

    /// Parse a tracking ID, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(s: &str) -> Result<Self, TrackingIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TrackingIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TrackingIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TrackingId {
    type Error = TrackingIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(TrackingId::parse(" ABC123 ").map(|t| t.to_string()), Ok("ABC123".to_owned()));
        assert_eq!(TrackingId::parse(""), Err(TrackingIdError::Empty));
        assert!(matches!(
            TrackingId::parse(&"x".repeat(200)),
            Err(TrackingIdError::TooLong { .. })
        ));
    }
}
