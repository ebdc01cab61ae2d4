//! Profile page: load and save the signed-in user's profile.

use std::sync::Arc;

use tracing::instrument;

use mindwell_core::{AlertPreferences, Email};

use crate::error::StoreError;
use crate::models::{Identity, Profile, ProfileFields};
use crate::notice::{Notice, Notifier};
use crate::store::{IdentityStore, ProfileStore};

/// Editable copy of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub full_name: String,
    /// Profile email, or the identity's email when the profile has none.
    pub email: String,
    pub age: Option<u32>,
    pub gender: String,
    pub medical_history: String,
    pub current_medications: String,
    pub alert_preferences: AlertPreferences,
}

impl ProfileForm {
    fn blank(identity: &Identity) -> Self {
        Self {
            full_name: String::new(),
            email: identity.email.to_string(),
            age: None,
            gender: String::new(),
            medical_history: String::new(),
            current_medications: String::new(),
            alert_preferences: AlertPreferences::default(),
        }
    }

    fn from_profile(profile: Profile, identity: &Identity) -> Self {
        let fields = profile.fields;
        Self {
            full_name: fields.full_name,
            email: fields
                .email
                .unwrap_or_else(|| identity.email.clone())
                .into_inner(),
            age: fields.age,
            gender: fields.gender.unwrap_or_default(),
            medical_history: fields.medical_history.unwrap_or_default(),
            current_medications: fields.current_medications.unwrap_or_default(),
            alert_preferences: fields.alert_preferences,
        }
    }

    /// An unparseable email falls back to the identity's.
    fn into_fields(self, identity: &Identity) -> ProfileFields {
        let email = Email::parse(&self.email).unwrap_or_else(|_| identity.email.clone());
        let optional = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        ProfileFields {
            full_name: self.full_name.trim().to_string(),
            age: self.age,
            email: Some(email),
            gender: optional(self.gender),
            medical_history: optional(self.medical_history),
            current_medications: optional(self.current_medications),
            alert_preferences: self.alert_preferences,
            onboarding_completed: true,
        }
    }
}

/// Loads and saves [`ProfileForm`]s, reporting outcomes to the user.
pub struct ProfileEditor {
    identities: Arc<dyn IdentityStore>,
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn Notifier>,
}

impl ProfileEditor {
    #[must_use]
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identities,
            profiles,
            notifier,
        }
    }

    async fn identity(&self) -> Result<Identity, StoreError> {
        self.identities
            .current_identity()
            .await?
            .ok_or(StoreError::NotAuthenticated)
    }

    /// Load the form for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, or the store error.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<ProfileForm, StoreError> {
        let result = async {
            let identity = self.identity().await?;
            let form = match self.profiles.find_by_identity(identity.id).await? {
                Some(profile) => ProfileForm::from_profile(profile, &identity),
                None => ProfileForm::blank(&identity),
            };
            Ok(form)
        }
        .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Error fetching profile");
            self.notifier
                .notify(Notice::error("Error", "Failed to load profile data."));
        }
        result
    }

    /// Save `form`, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, or the store error.
    #[instrument(skip(self, form))]
    pub async fn save(&self, form: ProfileForm) -> Result<Profile, StoreError> {
        let result = async {
            let identity = self.identity().await?;
            let fields = form.into_fields(&identity);
            self.profiles.update_by_identity(identity.id, fields).await
        }
        .await;

        match &result {
            Ok(_) => self.notifier.notify(Notice::success(
                "Profile Updated",
                "Your profile has been saved successfully.",
            )),
            Err(e) => {
                tracing::error!(error = %e, "Error updating profile");
                self.notifier.notify(Notice::error(
                    "Update Failed",
                    "Failed to update profile. Please try again.",
                ));
            }
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notice::{NoticeKind, RecordingNotifier};
    use crate::store::MemoryBackend;

    fn editor(backend: &MemoryBackend) -> (ProfileEditor, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        (
            ProfileEditor::new(
                Arc::new(backend.clone()),
                Arc::new(backend.clone()),
                Arc::new(notifier.clone()),
            ),
            notifier,
        )
    }

    async fn onboarded(backend: &MemoryBackend) -> Identity {
        let email = Email::parse("alex@x.com").unwrap();
        backend.register(&email).unwrap();
        let identity = backend.sign_in(&email).unwrap();
        let fields = ProfileFields {
            full_name: "Alex Kim".to_string(),
            age: Some(29),
            email: None,
            gender: Some("female".to_string()),
            medical_history: None,
            current_medications: None,
            alert_preferences: AlertPreferences::default(),
            onboarding_completed: true,
        };
        backend.insert(identity.id, fields).await.unwrap();
        identity
    }

    #[tokio::test]
    async fn test_load_falls_back_to_identity_email() {
        let backend = MemoryBackend::new();
        onboarded(&backend).await;
        let (editor, _) = editor(&backend);

        let form = editor.load().await.unwrap();
        assert_eq!(form.full_name, "Alex Kim");
        assert_eq!(form.email, "alex@x.com");
        assert_eq!(form.gender, "female");
        assert_eq!(form.medical_history, "");
    }

    #[tokio::test]
    async fn test_load_without_session_notifies() {
        let backend = MemoryBackend::new();
        let (editor, notifier) = editor(&backend);
        let err = editor.load().await.unwrap_err();
        assert!(matches!(err, StoreError::NotAuthenticated));
        assert_eq!(
            notifier.last().unwrap().description,
            "Failed to load profile data."
        );
    }

    #[tokio::test]
    async fn test_save_updates_row() {
        let backend = MemoryBackend::new();
        onboarded(&backend).await;
        let (editor, notifier) = editor(&backend);

        let mut form = editor.load().await.unwrap();
        form.current_medications = "Sertraline 50mg".to_string();
        form.alert_preferences.critical_alerts = false;
        let profile = editor.save(form).await.unwrap();

        assert_eq!(
            profile.fields.current_medications.as_deref(),
            Some("Sertraline 50mg")
        );
        assert!(!profile.fields.alert_preferences.critical_alerts);
        assert!(profile.updated_at >= profile.created_at);
        assert_eq!(backend.profiles().len(), 1);
        let notice = notifier.last().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.title, "Profile Updated");
    }

    #[tokio::test]
    async fn test_save_without_profile_fails() {
        let backend = MemoryBackend::new();
        let email = Email::parse("alex@x.com").unwrap();
        backend.register(&email).unwrap();
        let identity = backend.sign_in(&email).unwrap();
        let (editor, notifier) = editor(&backend);

        let err = editor
            .save(ProfileForm::blank(&identity))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(notifier.last().unwrap().title, "Update Failed");
    }
}
