//! Onboarding scenarios against the in-memory backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use mindwell_app::gate::{Route, RouteGate};
use mindwell_app::notice::{NoticeKind, RecordingNotifier};
use mindwell_app::onboarding::ProvisionOutcome;
use mindwell_app::store::MemoryBackend;
use mindwell_app::store::memory::Operation;
use mindwell_app::{OnboardingWizard, Provisioner, SessionContext, StoreError, WizardStep};
use mindwell_core::{AlertPreferences, Email};

struct Client {
    backend: MemoryBackend,
    session: SessionContext,
    wizard: OnboardingWizard,
    notifier: RecordingNotifier,
}

async fn client(backend: MemoryBackend) -> Client {
    let provisioner = Provisioner::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Url::parse("https://app.mindwell.app/").unwrap(),
    )
    .with_settle_delay(Duration::ZERO);
    let session = SessionContext::new(Arc::new(backend.clone()));
    session.start().await.unwrap();
    let notifier = RecordingNotifier::new();
    let wizard = OnboardingWizard::new(provisioner, session.clone(), Arc::new(notifier.clone()));
    Client {
        backend,
        session,
        wizard,
        notifier,
    }
}

fn fill(wizard: &mut OnboardingWizard, name: &str, email: &str) {
    let draft = wizard.draft_mut();
    draft.full_name = name.to_string();
    draft.email = email.to_string();
    draft.age = "34".to_string();
    wizard.next().unwrap();
    wizard.draft_mut().medical_history = "Seasonal allergies".to_string();
    wizard.next().unwrap();
    assert_eq!(wizard.step(), WizardStep::AlertPreferences);
}

#[tokio::test]
async fn test_new_user_reaches_main_view() {
    let mut c = client(MemoryBackend::new()).await;
    let gate = RouteGate::spawn(&c.session, Arc::new(c.backend.clone()));
    assert_eq!(gate.wait_for(Route::Onboarding).await, Some(Route::Onboarding));

    fill(&mut c.wizard, "Alex Doe", "New@X.com");
    let outcome = c.wizard.complete().await.unwrap();

    let ProvisionOutcome::Completed(profile) = outcome else {
        panic!("expected a completed profile");
    };
    assert!(profile.onboarding_completed());
    assert_eq!(profile.fields.age, Some(34));
    assert_eq!(c.wizard.step(), WizardStep::Done);
    assert_eq!(c.backend.account_count(), 1);
    assert_eq!(c.backend.profiles().len(), 1);
    assert_eq!(
        c.backend.calls().sign_ups,
        vec![Email::parse("new@x.com").unwrap()]
    );
    assert_eq!(c.notifier.last().unwrap().title, "Welcome!");

    assert_eq!(gate.wait_for(Route::Main).await, Some(Route::Main));
}

#[tokio::test]
async fn test_alert_preferences_default_to_enabled() {
    let mut c = client(MemoryBackend::new()).await;
    fill(&mut c.wizard, "Alex Doe", "alex@x.com");
    c.wizard.complete().await.unwrap();

    let profile = c.backend.profiles().pop().unwrap();
    assert_eq!(profile.fields.alert_preferences, AlertPreferences::default());
    assert!(profile.fields.alert_preferences.email_alerts);
    assert!(profile.fields.alert_preferences.critical_alerts);
    assert!(profile.fields.alert_preferences.analysis_alerts);
}

#[tokio::test]
async fn test_existing_account_gets_magic_link() {
    let backend = MemoryBackend::new();
    backend
        .register(&Email::parse("existing@x.com").unwrap())
        .unwrap();
    let mut c = client(backend).await;

    fill(&mut c.wizard, "Sam Roe", "existing@x.com");
    let outcome = c.wizard.complete().await.unwrap();

    assert!(matches!(outcome, ProvisionOutcome::MagicLinkSent(_)));
    assert_eq!(c.wizard.step(), WizardStep::AlertPreferences);
    assert_eq!(c.backend.calls().magic_links.len(), 1);
    assert_eq!(c.backend.calls().profile_inserts, 0);
    assert!(c.backend.profiles().is_empty());

    let notice = c.notifier.last().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.title, "Check your email");
}

#[tokio::test]
async fn test_returning_user_updates_single_profile() {
    let backend = MemoryBackend::new();
    let mut first = client(backend.clone()).await;
    fill(&mut first.wizard, "Sam Roe", "sam@x.com");
    first.wizard.complete().await.unwrap();
    first.session.sign_out().await.unwrap();

    // Following the magic link signs the account back in.
    backend.sign_in(&Email::parse("sam@x.com").unwrap()).unwrap();
    let mut second = client(backend.clone()).await;
    fill(&mut second.wizard, "Samantha Roe", "sam@x.com");
    let outcome = second.wizard.complete().await.unwrap();

    assert!(matches!(outcome, ProvisionOutcome::Completed(_)));
    let profiles = backend.profiles();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.first().unwrap().fields.full_name, "Samantha Roe");
    assert_eq!(backend.calls().profile_inserts, 1);
    assert_eq!(backend.calls().profile_updates, 1);
    assert_eq!(backend.calls().sign_ups.len(), 1);
}

#[tokio::test]
async fn test_unconfirmed_sign_up_reports_timing_issue() {
    let mut c = client(MemoryBackend::new().with_email_confirmation()).await;
    fill(&mut c.wizard, "Alex Doe", "alex@x.com");

    assert!(c.wizard.complete().await.is_err());
    assert_eq!(c.wizard.step(), WizardStep::AlertPreferences);
    let notice = c.notifier.last().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(
        notice.description,
        "Authentication setup issue. Please wait a moment and try again."
    );
    assert!(c.backend.profiles().is_empty());
}

#[tokio::test]
async fn test_rate_limited_sign_up_can_be_retried() {
    let backend = MemoryBackend::new();
    backend
        .fail_next(
            Operation::CreateIdentity,
            StoreError::RateLimited("email rate limit exceeded".to_string()),
        )
        .unwrap();
    let mut c = client(backend).await;
    fill(&mut c.wizard, "Alex Doe", "alex@x.com");

    assert!(c.wizard.complete().await.is_err());
    assert_eq!(
        c.notifier.last().unwrap().description,
        "Please wait a moment before trying again due to rate limiting."
    );
    assert_eq!(c.backend.account_count(), 0);

    let outcome = c.wizard.complete().await.unwrap();
    assert!(matches!(outcome, ProvisionOutcome::Completed(_)));
    assert_eq!(c.backend.profiles().len(), 1);
}
