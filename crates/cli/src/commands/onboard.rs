//! Run the onboarding workflow against the configured backend.
//!
//! # Usage
//!
//! ```bash
//! # New user: creates the account and the completed profile
//! mindwell onboard --name "Alex Kim" --email alex@example.com --age 29
//!
//! # Returning user after following a magic link
//! MINDWELL_ACCESS_TOKEN=... mindwell onboard --name "Alex Kim" --email alex@example.com
//! ```
//!
//! # Environment Variables
//!
//! See `mindwell_app::config`. `MINDWELL_ACCESS_TOKEN` optionally restores an
//! existing session before the workflow starts.

use std::sync::Arc;

use clap::Args;
use secrecy::SecretString;
use thiserror::Error;

use mindwell_app::config::ConfigError;
use mindwell_app::notice::TracingNotifier;
use mindwell_app::onboarding::{OnboardingError, ProvisionOutcome};
use mindwell_app::store::SupabaseClient;
use mindwell_app::{AppConfig, OnboardingWizard, Provisioner, SessionContext, StoreError};

#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Store(#[from] StoreError),

    #[error("Onboarding failed: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Args)]
pub struct OnboardArgs {
    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// Email address (ignored when an access token restores a session)
    #[arg(short, long)]
    pub email: String,

    /// Age in years; unparseable values are stored as unset
    #[arg(long, default_value = "")]
    pub age: String,

    #[arg(long, default_value = "")]
    pub gender: String,

    #[arg(long, default_value = "")]
    pub medical_history: String,

    #[arg(long, default_value = "")]
    pub medications: String,

    /// Turn off email status updates
    #[arg(long)]
    pub no_email_alerts: bool,

    /// Turn off critical result alerts
    #[arg(long)]
    pub no_critical_alerts: bool,

    /// Turn off analysis-complete alerts
    #[arg(long)]
    pub no_analysis_alerts: bool,

    /// Access token of an existing session
    #[arg(long, env = "MINDWELL_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

/// Drive the wizard through every step and provision the profile.
///
/// # Errors
///
/// Returns error if configuration is missing, the session cannot be
/// restored, a step fails validation, or provisioning fails.
pub async fn run(args: OnboardArgs) -> Result<(), OnboardError> {
    let config = AppConfig::from_env()?;
    let client = SupabaseClient::new(&config)?;

    if let Some(token) = args.access_token {
        match client.restore_session(SecretString::from(token)).await? {
            Some(identity) => tracing::info!(email = %identity.email, "Restored session"),
            None => tracing::warn!("Access token did not resolve to a user"),
        }
    }

    let backend = Arc::new(client);
    let session = SessionContext::new(backend.clone());
    session.start().await?;

    let provisioner = Provisioner::new(backend.clone(), backend, config.site_url.clone())
        .with_settle_delay(config.session_settle);
    let mut wizard = OnboardingWizard::new(provisioner, session, Arc::new(TracingNotifier));

    let draft = wizard.draft_mut();
    draft.full_name = args.name;
    draft.email = args.email;
    draft.age = args.age;
    draft.gender = args.gender;
    draft.medical_history = args.medical_history;
    draft.current_medications = args.medications;
    draft.alert_preferences.email_alerts = !args.no_email_alerts;
    draft.alert_preferences.critical_alerts = !args.no_critical_alerts;
    draft.alert_preferences.analysis_alerts = !args.no_analysis_alerts;

    wizard
        .next()
        .and_then(|_| wizard.next())
        .map_err(|e| OnboardError::Validation(e.to_string()))?;

    match wizard.complete().await? {
        ProvisionOutcome::Completed(profile) => {
            tracing::info!(profile = %profile.id, "Onboarding complete");
        }
        ProvisionOutcome::MagicLinkSent(email) => {
            tracing::info!(
                %email,
                "Account exists; follow the emailed link, then re-run with MINDWELL_ACCESS_TOKEN"
            );
        }
    }
    Ok(())
}
