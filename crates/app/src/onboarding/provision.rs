//! Identity and profile provisioning.
//!
//! One call resolves (or creates) the identity and writes the completed
//! profile. An email that already has an account gets a magic link instead
//! and no profile is written.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::SecretString;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use mindwell_core::Email;

use super::WizardStep;
use super::draft::{OnboardingDraft, ValidationError};
use crate::error::StoreError;
use crate::models::{Identity, Profile};
use crate::store::{IdentityStore, ProfileStore};

/// Default pause between sign-up and the first profile write.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

const RATE_LIMITED_MESSAGE: &str = "Please wait a moment before trying again due to rate limiting.";
const AUTH_TIMING_MESSAGE: &str = "Authentication setup issue. Please wait a moment and try again.";
const GENERIC_MESSAGE: &str = "There was a problem creating your profile. Please try again.";

/// How a provisioning run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Profile written with `onboarding_completed = true`.
    Completed(Profile),
    /// The email already had an account; a login link was sent and nothing
    /// was written.
    MagicLinkSent(Email),
}

/// Why provisioning failed, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    RateLimited,
    /// Row-level security rejected the write, usually because the new
    /// session has not propagated yet.
    AuthorizationTiming,
    Generic,
}

/// Onboarding failures.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sign-up or magic link failed.
    #[error("identity store: {0}")]
    Identity(StoreError),

    /// Profile lookup or write failed.
    #[error("profile store: {0}")]
    Profile(StoreError),

    /// `complete` was called before the last step.
    #[error("onboarding cannot complete from step {0:?}")]
    NotReady(WizardStep),
}

impl OnboardingError {
    /// Classify for user-facing messaging.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Identity(e) | Self::Profile(e) => match e {
                StoreError::RateLimited(_) => FailureKind::RateLimited,
                e if e.is_permission_denied() => FailureKind::AuthorizationTiming,
                _ => FailureKind::Generic,
            },
            Self::NotReady(_) => FailureKind::Generic,
        }
    }

    /// Message to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match (self.kind(), self) {
            (_, Self::Validation(e)) => e.to_string(),
            (FailureKind::RateLimited, _) => RATE_LIMITED_MESSAGE.to_string(),
            (FailureKind::AuthorizationTiming, _) => AUTH_TIMING_MESSAGE.to_string(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }
}

/// Random one-time password for a passwordless sign-up.
///
/// The user never sees it; later logins go through magic links.
fn temporary_password() -> SecretString {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    SecretString::from(format!("temp_{suffix}"))
}

/// Runs the identity + profile provisioning contract.
#[derive(Clone)]
pub struct Provisioner {
    identities: Arc<dyn IdentityStore>,
    profiles: Arc<dyn ProfileStore>,
    redirect_to: Url,
    settle_delay: Duration,
}

impl Provisioner {
    #[must_use]
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        redirect_to: Url,
    ) -> Self {
        Self {
            identities,
            profiles,
            redirect_to,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Override the pause after sign-up.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Provision the identity and profile for `draft`.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError::Validation` before any remote call when the
    /// name is blank, or when a sign-up is needed and the email is missing or
    /// invalid. Store failures are wrapped by the phase they happened in.
    #[instrument(skip_all)]
    pub async fn provision(
        &self,
        draft: &OnboardingDraft,
    ) -> Result<ProvisionOutcome, OnboardingError> {
        if draft.full_name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }

        let identity = match self
            .identities
            .current_identity()
            .await
            .map_err(OnboardingError::Identity)?
        {
            Some(identity) => {
                tracing::debug!(identity = %identity.id, "Using existing session");
                identity
            }
            None => match self.sign_up(draft).await? {
                SignUp::Created(identity) => identity,
                SignUp::MagicLinkSent(email) => return Ok(ProvisionOutcome::MagicLinkSent(email)),
            },
        };

        let fields = draft.to_profile_fields(identity.email.clone());
        let existing = self
            .profiles
            .find_by_identity(identity.id)
            .await
            .map_err(OnboardingError::Profile)?;

        let profile = if existing.is_some() {
            self.profiles
                .update_by_identity(identity.id, fields)
                .await
                .map_err(OnboardingError::Profile)?
        } else {
            self.profiles
                .insert(identity.id, fields)
                .await
                .map_err(OnboardingError::Profile)?
        };

        tracing::info!(
            identity = %identity.id,
            updated = existing.is_some(),
            "Onboarding profile saved"
        );
        Ok(ProvisionOutcome::Completed(profile))
    }

    async fn sign_up(&self, draft: &OnboardingDraft) -> Result<SignUp, OnboardingError> {
        let email = draft.parsed_email()?;
        let password = temporary_password();

        match self
            .identities
            .create_identity(&email, &password, &self.redirect_to)
            .await
        {
            Ok(identity) => {
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                Ok(SignUp::Created(identity))
            }
            Err(StoreError::AlreadyExists) => {
                tracing::info!("Email already registered, sending magic link");
                self.identities
                    .send_magic_link(&email, &self.redirect_to)
                    .await
                    .map_err(OnboardingError::Identity)?;
                Ok(SignUp::MagicLinkSent(email))
            }
            Err(e) => Err(OnboardingError::Identity(e)),
        }
    }
}

enum SignUp {
    Created(Identity),
    MagicLinkSent(Email),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = temporary_password();
        let raw = password.expose_secret();
        assert!(raw.starts_with("temp_"));
        assert_eq!(raw.len(), 21);
        assert_ne!(raw, temporary_password().expose_secret());
    }

    #[test]
    fn test_error_messages() {
        let err = OnboardingError::Identity(StoreError::RateLimited("slow down".to_string()));
        assert_eq!(err.kind(), FailureKind::RateLimited);
        assert_eq!(err.user_message(), RATE_LIMITED_MESSAGE);

        let err = OnboardingError::Profile(StoreError::PermissionDenied("rls".to_string()));
        assert_eq!(err.user_message(), AUTH_TIMING_MESSAGE);

        let err = OnboardingError::Profile(StoreError::Conflict("dup".to_string()));
        assert_eq!(err.kind(), FailureKind::Generic);
        assert_eq!(err.user_message(), GENERIC_MESSAGE);

        let err = OnboardingError::Validation(ValidationError::InvalidEmail);
        assert_eq!(err.user_message(), "Please enter a valid email address.");
    }
}
