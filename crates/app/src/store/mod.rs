//! Backend store seams.
//!
//! The client core talks to the hosted backend only through these traits.
//! [`supabase::SupabaseClient`] implements them over HTTP;
//! [`memory::MemoryBackend`] implements them in-process for tests and
//! offline runs.

pub mod feed;
pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use mindwell_core::{Email, IdentityId, Submission};

use crate::error::StoreError;
use crate::models::{Identity, Profile, ProfileFields};

pub use feed::{BroadcastFeed, ChangeEvent, PollingFeed, SubmissionFeed, Subscription};
pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;

/// Authentication.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The signed-in identity, if any.
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError>;

    /// Register a new account.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the email is taken.
    async fn create_identity(
        &self,
        email: &Email,
        password: &SecretString,
        redirect_to: &Url,
    ) -> Result<Identity, StoreError>;

    /// Email a one-time login link.
    async fn send_magic_link(&self, email: &Email, redirect_to: &Url) -> Result<(), StoreError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), StoreError>;

    /// Email of the signed-in identity, if any.
    async fn current_email(&self) -> Result<Option<Email>, StoreError> {
        Ok(self.current_identity().await?.map(|identity| identity.email))
    }
}

/// The `profiles` table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The profile belonging to `identity`, if one exists.
    async fn find_by_identity(&self, identity: IdentityId) -> Result<Option<Profile>, StoreError>;

    /// Insert a profile for `identity`.
    ///
    /// A second insert for the same identity fails with
    /// [`StoreError::Conflict`].
    async fn insert(&self, identity: IdentityId, fields: ProfileFields)
    -> Result<Profile, StoreError>;

    /// Overwrite the profile for `identity`, stamping `updated_at`.
    async fn update_by_identity(
        &self,
        identity: IdentityId,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError>;
}

/// Read access to the `submissions` table.
#[async_trait]
pub trait SubmissionReader: Send + Sync {
    /// Most recently created submission owned by `email`.
    async fn latest_by_email(&self, email: &Email) -> Result<Option<Submission>, StoreError>;
}
