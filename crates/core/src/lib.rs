//! MindWell Core - Shared domain types.
//!
//! This crate provides the types used across all MindWell components:
//! - `functions` - Serverless-style HTTP handlers (sample status, report email)
//! - `app` - Client core (onboarding, session, dashboard state)
//! - `cli` - Command-line tools for migrations and onboarding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, tracking IDs, statuses, and
//!   alert preferences, plus the shared [`Submission`] record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
