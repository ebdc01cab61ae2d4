//! Per-user profile row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mindwell_core::{AlertPreferences, Email, IdentityId, ProfileId};

/// Writable profile columns.
///
/// Sent as-is for both inserts and updates, so every write replaces every
/// column it names. The free-text columns are `NOT NULL`: unset text is
/// written as `""` and read back as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub full_name: String,
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, with = "blank_text")]
    pub gender: Option<String>,
    #[serde(default, with = "blank_text")]
    pub medical_history: Option<String>,
    #[serde(default, with = "blank_text")]
    pub current_medications: Option<String>,
    #[serde(default)]
    pub alert_preferences: AlertPreferences,
    #[serde(default)]
    pub onboarding_completed: bool,
}

/// A `profiles` row. Exactly one per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: IdentityId,
    #[serde(flatten)]
    pub fields: ProfileFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Whether this user has finished onboarding.
    #[must_use]
    pub const fn onboarding_completed(&self) -> bool {
        self.fields.onboarding_completed
    }
}

/// Optional free text stored in a `NOT NULL DEFAULT ''` column.
mod blank_text {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}
