//! HTTP client for a Supabase-compatible backend.
//!
//! - Auth (`/auth/v1/*`) implements [`IdentityStore`](super::IdentityStore)
//! - REST (`/rest/v1/*`) implements [`ProfileStore`](super::ProfileStore) and
//!   [`SubmissionReader`](super::SubmissionReader)
//!
//! Every request carries the anonymous key as `apikey`. Requests made after a
//! sign-up or [`SupabaseClient::restore_session`] are authorized with the
//! session's access token; row-level security keys off that token.

mod auth;
mod error;
mod rest;

use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::models::Identity;

pub(crate) use error::error_from_response;

/// An authenticated session.
struct AuthSession {
    access_token: SecretString,
    identity: Option<Identity>,
}

/// Supabase API client. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| StoreError::Decode(format!("Invalid anon key format: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url: config.backend_url.clone(),
                anon_key: config.anon_key.clone(),
                session: RwLock::new(None),
            }),
        })
    }

    /// Adopt an access token obtained elsewhere (for example from a magic
    /// link redirect) and return the identity it belongs to.
    ///
    /// # Errors
    ///
    /// Returns error if the user lookup fails.
    pub async fn restore_session(
        &self,
        access_token: SecretString,
    ) -> Result<Option<Identity>, StoreError> {
        self.set_session(Some(AuthSession {
            access_token,
            identity: None,
        }));
        self.fetch_user().await
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| StoreError::Decode(format!("Invalid endpoint {path}: {e}")))
    }

    /// Bearer value for the current request: the session token when signed
    /// in, the anonymous key otherwise.
    fn bearer(&self) -> String {
        let token = self
            .inner
            .session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.access_token.expose_secret().to_string()));
        let token = token.unwrap_or_else(|| self.inner.anon_key.expose_secret().to_string());
        format!("Bearer {token}")
    }

    fn has_session(&self) -> bool {
        self.inner.session.read().is_ok_and(|s| s.is_some())
    }

    fn set_session(&self, session: Option<AuthSession>) {
        if let Ok(mut guard) = self.inner.session.write() {
            *guard = session;
        }
    }

    fn cached_identity(&self) -> Option<Identity> {
        self.inner
            .session
            .read()
            .ok()?
            .as_ref()?
            .identity
            .clone()
    }

    fn cache_identity(&self, identity: &Identity) {
        if let Ok(mut guard) = self.inner.session.write() {
            if let Some(session) = guard.as_mut() {
                session.identity = Some(identity.clone());
            }
        }
    }
}
