//! In-memory backend.
//!
//! Implements every store trait against shared in-process state and records
//! the calls made against it. Row-level security is emulated: profile writes
//! must come from the signed-in identity that owns the row.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use url::Url;

use mindwell_core::{Email, IdentityId, ProfileId, Submission};

use super::{IdentityStore, ProfileStore, SubmissionReader};
use crate::error::StoreError;
use crate::models::{Identity, Profile, ProfileFields};

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentIdentity,
    CreateIdentity,
    SendMagicLink,
    FindProfile,
    InsertProfile,
    UpdateProfile,
    LatestSubmission,
}

/// Calls observed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    /// Emails passed to `create_identity`, including rejected ones.
    pub sign_ups: Vec<Email>,
    pub magic_links: Vec<Email>,
    pub profile_lookups: usize,
    pub profile_inserts: usize,
    pub profile_updates: usize,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Email, Identity>,
    session: Option<Identity>,
    profiles: Vec<Profile>,
    submissions: Vec<Submission>,
    calls: CallLog,
    failures: HashMap<Operation, StoreError>,
    require_confirmation: bool,
}

impl MemoryState {
    fn take_failure(&mut self, op: Operation) -> Result<(), StoreError> {
        self.failures.remove(&op).map_or(Ok(()), Err)
    }

    fn authorize_profile_write(&self, identity: IdentityId) -> Result<(), StoreError> {
        match &self.session {
            Some(session) if session.id == identity => Ok(()),
            _ => Err(StoreError::PermissionDenied(
                "new row violates row-level security policy for table \"profiles\"".to_string(),
            )),
        }
    }
}

/// Shared in-memory backend. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-ups no longer start a session until the user confirms by email.
    #[must_use]
    pub fn with_email_confirmation(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.require_confirmation = true;
        }
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Decode("memory backend lock poisoned".to_string()))
    }

    /// Create an account without signing in.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the email is taken.
    pub fn register(&self, email: &Email) -> Result<Identity, StoreError> {
        let mut state = self.state()?;
        if state.accounts.contains_key(email) {
            return Err(StoreError::AlreadyExists);
        }
        let identity = Identity {
            id: IdentityId::generate(),
            email: email.clone(),
        };
        state.accounts.insert(email.clone(), identity.clone());
        Ok(identity)
    }

    /// Start a session for a registered account, as following a magic link
    /// would.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the email has no account.
    pub fn sign_in(&self, email: &Email) -> Result<Identity, StoreError> {
        let mut state = self.state()?;
        let identity = state
            .accounts
            .get(email)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        state.session = Some(identity.clone());
        Ok(identity)
    }

    /// Make the next call of `op` fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend lock is poisoned.
    pub fn fail_next(&self, op: Operation, error: StoreError) -> Result<(), StoreError> {
        self.state()?.failures.insert(op, error);
        Ok(())
    }

    /// Insert or replace a submission row, matched by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend lock is poisoned.
    pub fn put_submission(&self, submission: Submission) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state.submissions.retain(|s| s.id != submission.id);
        state.submissions.push(submission);
        Ok(())
    }

    /// Snapshot of recorded calls.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.state().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Snapshot of every profile row.
    #[must_use]
    pub fn profiles(&self) -> Vec<Profile> {
        self.state().map(|s| s.profiles.clone()).unwrap_or_default()
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.state().map(|s| s.accounts.len()).unwrap_or_default()
    }
}

#[async_trait]
impl IdentityStore for MemoryBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        let mut state = self.state()?;
        state.take_failure(Operation::CurrentIdentity)?;
        Ok(state.session.clone())
    }

    async fn create_identity(
        &self,
        email: &Email,
        _password: &SecretString,
        _redirect_to: &Url,
    ) -> Result<Identity, StoreError> {
        let mut state = self.state()?;
        state.calls.sign_ups.push(email.clone());
        state.take_failure(Operation::CreateIdentity)?;

        if state.accounts.contains_key(email) {
            return Err(StoreError::AlreadyExists);
        }

        let identity = Identity {
            id: IdentityId::generate(),
            email: email.clone(),
        };
        state.accounts.insert(email.clone(), identity.clone());
        if !state.require_confirmation {
            state.session = Some(identity.clone());
        }
        Ok(identity)
    }

    async fn send_magic_link(&self, email: &Email, _redirect_to: &Url) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state.take_failure(Operation::SendMagicLink)?;
        state.calls.magic_links.push(email.clone());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        self.state()?.session = None;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn find_by_identity(&self, identity: IdentityId) -> Result<Option<Profile>, StoreError> {
        let mut state = self.state()?;
        state.calls.profile_lookups += 1;
        state.take_failure(Operation::FindProfile)?;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.user_id == identity)
            .cloned())
    }

    async fn insert(
        &self,
        identity: IdentityId,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let mut state = self.state()?;
        state.calls.profile_inserts += 1;
        state.take_failure(Operation::InsertProfile)?;
        state.authorize_profile_write(identity)?;

        if state.profiles.iter().any(|p| p.user_id == identity) {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"profiles_user_id_key\""
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let profile = Profile {
            id: ProfileId::generate(),
            user_id: identity,
            fields,
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_by_identity(
        &self,
        identity: IdentityId,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let mut state = self.state()?;
        state.calls.profile_updates += 1;
        state.take_failure(Operation::UpdateProfile)?;
        state.authorize_profile_write(identity)?;

        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.user_id == identity)
            .ok_or(StoreError::NotFound)?;
        profile.fields = fields;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

#[async_trait]
impl SubmissionReader for MemoryBackend {
    async fn latest_by_email(&self, email: &Email) -> Result<Option<Submission>, StoreError> {
        let mut state = self.state()?;
        state.take_failure(Operation::LatestSubmission)?;
        Ok(state
            .submissions
            .iter()
            .filter(|s| &s.user_email == email)
            .max_by_key(|s| s.created_at)
            .cloned())
    }
}
