//! Onboarding wizard.
//!
//! Three form steps collect the draft; completing the last one runs the
//! [`Provisioner`]. The wizard holds the draft for its whole lifetime, so
//! navigating back and forth never loses input.
//!
//! ```text
//! PersonalInfo -> MedicalHistory -> AlertPreferences -> Provisioning -> Done
//!                                         ^                  |
//!                                         +-- failure / magic link sent
//! ```

pub mod draft;
pub mod provision;

use std::sync::Arc;

use tracing::instrument;

use crate::notice::{Notice, Notifier};
use crate::session::SessionContext;

pub use draft::{OnboardingDraft, ValidationError};
pub use provision::{
    DEFAULT_SETTLE_DELAY, FailureKind, OnboardingError, ProvisionOutcome, Provisioner,
};

/// Wizard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    /// Name, age, email, gender.
    PersonalInfo,
    /// Free-text medical history and medications.
    MedicalHistory,
    /// Three alert toggles.
    AlertPreferences,
    /// A provisioning attempt is running.
    Provisioning,
    /// Profile saved.
    Done,
}

impl WizardStep {
    /// Zero-based index of a form step.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::PersonalInfo => Some(0),
            Self::MedicalHistory => Some(1),
            Self::AlertPreferences => Some(2),
            Self::Provisioning | Self::Done => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal Information",
            Self::MedicalHistory => "Medical History",
            Self::AlertPreferences => "Alert Preferences",
            Self::Provisioning => "Setting up your account",
            Self::Done => "Welcome",
        }
    }
}

/// The onboarding state machine.
pub struct OnboardingWizard {
    step: WizardStep,
    draft: OnboardingDraft,
    provisioner: Provisioner,
    session: SessionContext,
    notifier: Arc<dyn Notifier>,
}

impl OnboardingWizard {
    #[must_use]
    pub fn new(
        provisioner: Provisioner,
        session: SessionContext,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            step: WizardStep::PersonalInfo,
            draft: OnboardingDraft::default(),
            provisioner,
            session,
            notifier,
        }
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    /// Edit the draft in place.
    pub const fn draft_mut(&mut self) -> &mut OnboardingDraft {
        &mut self.draft
    }

    /// Advance one form step.
    ///
    /// Leaving `PersonalInfo` requires a name and an email. `AlertPreferences`
    /// is the last form step; use [`complete`](Self::complete) from there.
    ///
    /// # Errors
    ///
    /// Returns the missing field when leaving `PersonalInfo` without one.
    pub fn next(&mut self) -> Result<WizardStep, ValidationError> {
        self.step = match self.step {
            WizardStep::PersonalInfo => {
                self.draft.check_personal_info()?;
                WizardStep::MedicalHistory
            }
            WizardStep::MedicalHistory => WizardStep::AlertPreferences,
            other => other,
        };
        Ok(self.step)
    }

    /// Go back one form step. No-op on the first step and outside the form.
    pub const fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::MedicalHistory => WizardStep::PersonalInfo,
            WizardStep::AlertPreferences => WizardStep::MedicalHistory,
            other => other,
        };
        self.step
    }

    /// Provision the identity and profile.
    ///
    /// Taking `&mut self` means a second attempt cannot start while one is in
    /// flight. If an earlier attempt's future was dropped mid-flight the
    /// wizard is still in `Provisioning` and may be completed again.
    ///
    /// On success the wizard moves to `Done` and the session is refreshed so
    /// route gates re-evaluate. Otherwise it returns to `AlertPreferences`.
    /// Every outcome is also reported through the notifier.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` before the last form step, otherwise whatever the
    /// provisioner returned.
    #[instrument(skip(self), fields(step = ?self.step))]
    pub async fn complete(&mut self) -> Result<ProvisionOutcome, OnboardingError> {
        if !matches!(
            self.step,
            WizardStep::AlertPreferences | WizardStep::Provisioning
        ) {
            return Err(OnboardingError::NotReady(self.step));
        }

        self.step = WizardStep::Provisioning;
        let result = self.provisioner.provision(&self.draft).await;

        match &result {
            Ok(ProvisionOutcome::Completed(_)) => {
                self.step = WizardStep::Done;
                self.notifier.notify(Notice::success(
                    "Welcome!",
                    "Your profile has been created successfully.",
                ));
                if let Err(e) = self.session.refresh().await {
                    tracing::warn!(error = %e, "Session refresh after onboarding failed");
                }
            }
            Ok(ProvisionOutcome::MagicLinkSent(_)) => {
                self.step = WizardStep::AlertPreferences;
                self.notifier.notify(Notice::info(
                    "Check your email",
                    "We sent you a secure login link to continue onboarding.",
                ));
            }
            Err(e) => {
                self.step = WizardStep::AlertPreferences;
                tracing::warn!(error = %e, kind = ?e.kind(), "Onboarding failed");
                self.notifier.notify(Notice::error("Error", e.user_message()));
            }
        }

        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::notice::RecordingNotifier;
    use crate::store::MemoryBackend;

    fn wizard(backend: &MemoryBackend) -> (OnboardingWizard, RecordingNotifier) {
        let provisioner = Provisioner::new(
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Url::parse("https://app.mindwell.app/").unwrap(),
        )
        .with_settle_delay(Duration::ZERO);
        let notifier = RecordingNotifier::new();
        let session = SessionContext::new(Arc::new(backend.clone()));
        (
            OnboardingWizard::new(provisioner, session, Arc::new(notifier.clone())),
            notifier,
        )
    }

    #[test]
    fn test_navigation_keeps_draft() {
        let backend = MemoryBackend::new();
        let (mut w, _) = wizard(&backend);

        assert_eq!(w.next(), Err(ValidationError::MissingName));
        assert_eq!(w.step(), WizardStep::PersonalInfo);

        w.draft_mut().full_name = "Alex".to_string();
        w.draft_mut().email = "alex@x.com".to_string();
        assert_eq!(w.next().unwrap(), WizardStep::MedicalHistory);
        w.draft_mut().medical_history = "Asthma".to_string();
        assert_eq!(w.next().unwrap(), WizardStep::AlertPreferences);
        assert_eq!(w.next().unwrap(), WizardStep::AlertPreferences);

        assert_eq!(w.back(), WizardStep::MedicalHistory);
        assert_eq!(w.back(), WizardStep::PersonalInfo);
        assert_eq!(w.back(), WizardStep::PersonalInfo);
        assert_eq!(w.draft().medical_history, "Asthma");
        assert_eq!(w.draft().full_name, "Alex");
    }

    #[tokio::test]
    async fn test_complete_requires_last_step() {
        let backend = MemoryBackend::new();
        let (mut w, _) = wizard(&backend);
        let err = w.complete().await.unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::NotReady(WizardStep::PersonalInfo)
        ));
        assert!(backend.calls().sign_ups.is_empty());
    }

    #[tokio::test]
    async fn test_complete_new_user() {
        let backend = MemoryBackend::new();
        let (mut w, notifier) = wizard(&backend);
        w.draft_mut().full_name = "Alex".to_string();
        w.draft_mut().email = "new@x.com".to_string();
        w.draft_mut().age = "abc".to_string();
        w.next().unwrap();
        w.next().unwrap();

        let outcome = w.complete().await.unwrap();
        let ProvisionOutcome::Completed(profile) = outcome else {
            panic!("expected completion");
        };
        assert!(profile.onboarding_completed());
        assert_eq!(profile.fields.age, None);
        assert_eq!(w.step(), WizardStep::Done);
        assert_eq!(notifier.last().unwrap().title, "Welcome!");
    }

    #[tokio::test]
    async fn test_failure_returns_to_preferences() {
        let backend = MemoryBackend::new().with_email_confirmation();
        let (mut w, notifier) = wizard(&backend);
        w.draft_mut().full_name = "Alex".to_string();
        w.draft_mut().email = "new@x.com".to_string();
        w.next().unwrap();
        w.next().unwrap();

        let err = w.complete().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::AuthorizationTiming);
        assert_eq!(w.step(), WizardStep::AlertPreferences);
        assert_eq!(
            notifier.last().unwrap().description,
            "Authentication setup issue. Please wait a moment and try again."
        );
    }
}
