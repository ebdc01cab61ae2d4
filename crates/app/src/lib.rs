//! MindWell client core.
//!
//! Everything the patient app does apart from drawing screens:
//!
//! - [`onboarding`] - three-step wizard and identity + profile provisioning
//! - [`session`] - observable session context
//! - [`gate`] - routes between onboarding and the main app on session changes
//! - [`tracker`] / [`dashboard`] - live sample status and progress
//! - [`profile_editor`] - profile page load/save
//! - [`activity`] - activity and mood log
//! - [`report`] / [`share`] - report assembly and delivery to a doctor
//!
//! The backend is reached through the traits in [`store`]; [`store::SupabaseClient`]
//! is the HTTP implementation and [`store::MemoryBackend`] the in-process one.
//! User-facing messages go out through a [`notice::Notifier`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod activity;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod functions_client;
pub mod gate;
pub mod models;
pub mod notice;
pub mod onboarding;
pub mod profile_editor;
pub mod report;
pub mod session;
pub mod share;
pub mod store;
pub mod tracker;

pub use config::AppConfig;
pub use error::StoreError;
pub use notice::{Notice, NoticeKind, Notifier};
pub use onboarding::{OnboardingWizard, Provisioner, WizardStep};
pub use session::SessionContext;
