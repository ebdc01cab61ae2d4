//! Onboarding form data.

use mindwell_core::{AlertPreferences, Email};
use thiserror::Error;

use crate::models::ProfileFields;

/// Local validation failures. Raised before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your full name.")]
    MissingName,
    #[error("Please enter your email address.")]
    MissingEmail,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

/// Everything the wizard collects, held only for the wizard's lifetime.
///
/// Fields are kept as typed; parsing happens when the profile is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingDraft {
    pub full_name: String,
    /// Raw age text; unparseable input is stored as unset.
    pub age: String,
    pub email: String,
    pub gender: String,
    pub medical_history: String,
    pub current_medications: String,
    pub alert_preferences: AlertPreferences,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl OnboardingDraft {
    /// Presence check for the personal-info step.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn check_personal_info(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        Ok(())
    }

    /// The typed email, parsed.
    ///
    /// # Errors
    ///
    /// Returns `MissingEmail` or `InvalidEmail`.
    pub fn parsed_email(&self) -> Result<Email, ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        Email::parse(&self.email).map_err(|_| ValidationError::InvalidEmail)
    }

    /// Age as a non-negative integer, or `None` when blank or unparseable.
    #[must_use]
    pub fn parsed_age(&self) -> Option<u32> {
        self.age.trim().parse().ok()
    }

    /// Profile columns for this draft, owned by `email`, marked complete.
    #[must_use]
    pub fn to_profile_fields(&self, email: Email) -> ProfileFields {
        ProfileFields {
            full_name: self.full_name.trim().to_string(),
            age: self.parsed_age(),
            email: Some(email),
            gender: non_empty(&self.gender),
            medical_history: non_empty(&self.medical_history),
            current_medications: non_empty(&self.current_medications),
            alert_preferences: self.alert_preferences,
            onboarding_completed: true,
        }
    }
}
