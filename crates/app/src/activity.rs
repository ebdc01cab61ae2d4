//! Activity and mood log.
//!
//! Entries are kept in memory, newest first. The log feeds the activity
//! section of the doctor report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Activity log input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityError {
    /// Everything except notes is required.
    #[error("activity, category, duration and both moods are required")]
    MissingFields,
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("mood must be between 1 and 5, got {0}")]
    InvalidMood(u8),
    #[error("unknown activity category: {0}")]
    UnknownCategory(String),
}

/// Kind of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Exercise,
    Social,
    Rest,
    Work,
}

impl ActivityCategory {
    pub const ALL: [Self; 4] = [Self::Exercise, Self::Social, Self::Rest, Self::Work];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Social => "social",
            Self::Rest => "rest",
            Self::Work => "work",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exercise => "Exercise",
            Self::Social => "Social",
            Self::Rest => "Rest & Relaxation",
            Self::Work => "Work/Study",
        }
    }
}

impl std::str::FromStr for ActivityCategory {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ActivityError::UnknownCategory(s.to_owned()))
    }
}

/// Self-reported mood on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
    /// Build a mood score.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMood` outside 1-5.
    pub const fn new(value: u8) -> Result<Self, ActivityError> {
        if value >= 1 && value <= 5 {
            Ok(Self(value))
        } else {
            Err(ActivityError::InvalidMood(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Very Low",
            2 => "Low",
            3 => "Neutral",
            4 => "Good",
            _ => "Great",
        }
    }
}

impl TryFrom<u8> for Mood {
    type Error = ActivityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Mood> for u8 {
    fn from(mood: Mood) -> Self {
        mood.0
    }
}

/// Add-activity form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityDraft {
    pub activity: String,
    pub category: Option<ActivityCategory>,
    /// Minutes, as typed.
    pub duration: String,
    pub mood_before: Option<Mood>,
    pub mood_after: Option<Mood>,
    pub notes: String,
}

/// A logged activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub activity: String,
    pub category: ActivityCategory,
    pub duration_minutes: u32,
    pub mood_before: Mood,
    pub mood_after: Mood,
    #[serde(default)]
    pub notes: String,
}

impl ActivityEntry {
    /// Mood change over the activity.
    #[must_use]
    pub fn mood_change(&self) -> i16 {
        i16::from(self.mood_after.value()) - i16::from(self.mood_before.value())
    }
}

/// In-memory activity log, newest entry first.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
    next_id: u64,
}

impl ActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `draft` and log it as done on `date`.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` when anything but notes is blank, or
    /// `InvalidDuration` when the duration is not a whole number of minutes.
    pub fn add(
        &mut self,
        draft: ActivityDraft,
        date: NaiveDate,
    ) -> Result<ActivityEntry, ActivityError> {
        let activity = draft.activity.trim();
        let duration = draft.duration.trim();
        let (Some(category), Some(mood_before), Some(mood_after)) =
            (draft.category, draft.mood_before, draft.mood_after)
        else {
            return Err(ActivityError::MissingFields);
        };
        if activity.is_empty() || duration.is_empty() {
            return Err(ActivityError::MissingFields);
        }
        let duration_minutes = duration
            .parse()
            .map_err(|_| ActivityError::InvalidDuration(duration.to_owned()))?;

        self.next_id += 1;
        let entry = ActivityEntry {
            id: self.next_id,
            date,
            activity: activity.to_owned(),
            category,
            duration_minutes,
            mood_before,
            mood_after,
            notes: draft.notes.trim().to_owned(),
        };
        self.entries.insert(0, entry.clone());
        Ok(entry)
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean of `mood_after - mood_before`, or 0 for an empty log.
    #[must_use]
    pub fn average_mood_improvement(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: i64 = self.entries.iter().map(|e| i64::from(e.mood_change())).sum();
        #[allow(clippy::cast_precision_loss)] // Entry counts never approach f64 precision
        let avg = total as f64 / self.entries.len() as f64;
        avg
    }

    /// Total minutes logged.
    #[must_use]
    pub fn total_minutes(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.duration_minutes)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn draft(activity: &str, before: u8, after: u8) -> ActivityDraft {
        ActivityDraft {
            activity: activity.to_string(),
            category: Some(ActivityCategory::Exercise),
            duration: "30".to_string(),
            mood_before: Some(Mood::new(before).unwrap()),
            mood_after: Some(Mood::new(after).unwrap()),
            notes: String::new(),
        }
    }

    #[test]
    fn test_add_requires_everything_but_notes() {
        let mut log = ActivityLog::new();
        let mut missing = draft("Morning yoga", 2, 4);
        missing.mood_after = None;
        assert_eq!(log.add(missing, date(1)), Err(ActivityError::MissingFields));

        let mut blank = draft("   ", 2, 4);
        blank.notes = "notes are optional".to_string();
        assert_eq!(log.add(blank, date(1)), Err(ActivityError::MissingFields));

        let mut bad = draft("Run", 2, 4);
        bad.duration = "half an hour".to_string();
        assert!(matches!(
            log.add(bad, date(1)),
            Err(ActivityError::InvalidDuration(_))
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn test_entries_newest_first() {
        let mut log = ActivityLog::new();
        log.add(draft("Morning yoga", 2, 4), date(14)).unwrap();
        let entry = log.add(draft("Coffee with friends", 3, 4), date(15)).unwrap();
        assert_eq!(entry.id, 2);

        let names: Vec<&str> = log.entries().iter().map(|e| e.activity.as_str()).collect();
        assert_eq!(names, vec!["Coffee with friends", "Morning yoga"]);
        assert_eq!(log.total_minutes(), 60);
    }

    #[test]
    fn test_average_mood_improvement() {
        let mut log = ActivityLog::new();
        assert!(log.average_mood_improvement().abs() < f64::EPSILON);

        log.add(draft("Morning yoga", 2, 4), date(14)).unwrap();
        log.add(draft("Coffee with friends", 3, 4), date(15)).unwrap();
        log.add(draft("Deadline", 4, 2), date(16)).unwrap();
        assert!((log.average_mood_improvement() - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mood_bounds_and_labels() {
        assert_eq!(Mood::new(0), Err(ActivityError::InvalidMood(0)));
        assert_eq!(Mood::new(6), Err(ActivityError::InvalidMood(6)));
        assert_eq!(Mood::new(1).unwrap().label(), "Very Low");
        assert_eq!(Mood::new(5).unwrap().label(), "Great");
        assert!(serde_json::from_str::<Mood>("9").is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "rest".parse::<ActivityCategory>().unwrap().label(),
            "Rest & Relaxation"
        );
        assert!("nap".parse::<ActivityCategory>().is_err());
    }
}
