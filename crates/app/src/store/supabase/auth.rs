//! Auth endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use mindwell_core::{Email, IdentityId};

use super::{AuthSession, SupabaseClient, error_from_response};
use crate::error::StoreError;
use crate::models::Identity;
use crate::store::IdentityStore;

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: IdentityId,
    #[serde(default)]
    email: Option<String>,
}

/// Sign-up returns a session when email confirmation is off and a bare user
/// when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { access_token: String, user: UserBody },
    User(UserBody),
}

impl UserBody {
    fn into_identity(self, fallback_email: Option<&Email>) -> Result<Identity, StoreError> {
        let email = match (self.email.as_deref(), fallback_email) {
            (Some(raw), _) if !raw.is_empty() => Email::parse(raw)
                .map_err(|e| StoreError::Decode(format!("invalid user email: {e}")))?,
            (_, Some(fallback)) => fallback.clone(),
            _ => return Err(StoreError::Decode("user has no email".to_string())),
        };
        Ok(Identity { id: self.id, email })
    }
}

fn with_redirect(mut url: Url, redirect_to: &Url) -> Url {
    url.query_pairs_mut()
        .append_pair("redirect_to", redirect_to.as_str());
    url
}

impl SupabaseClient {
    /// `GET /auth/v1/user` for the current session token.
    pub(super) async fn fetch_user(&self) -> Result<Option<Identity>, StoreError> {
        if !self.has_session() {
            return Ok(None);
        }

        let response = self
            .inner
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Session token rejected, clearing session");
            self.set_session(None);
            return Ok(None);
        }

        let user: UserBody = error_from_response(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let identity = user.into_identity(None)?;
        self.cache_identity(&identity);
        Ok(Some(identity))
    }
}

#[async_trait]
impl IdentityStore for SupabaseClient {
    async fn current_identity(&self) -> Result<Option<Identity>, StoreError> {
        if let Some(identity) = self.cached_identity() {
            return Ok(Some(identity));
        }
        self.fetch_user().await
    }

    #[tracing::instrument(skip(self, password, redirect_to), fields(email = %email))]
    async fn create_identity(
        &self,
        email: &Email,
        password: &SecretString,
        redirect_to: &Url,
    ) -> Result<Identity, StoreError> {
        let url = with_redirect(self.endpoint("auth/v1/signup")?, redirect_to);
        let response = self
            .inner
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .json(&SignUpRequest {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let body: SignUpResponse = error_from_response(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        match body {
            SignUpResponse::Session { access_token, user } => {
                let identity = user.into_identity(Some(email))?;
                self.set_session(Some(AuthSession {
                    access_token: SecretString::from(access_token),
                    identity: Some(identity.clone()),
                }));
                tracing::info!(identity = %identity.id, "Identity created with session");
                Ok(identity)
            }
            SignUpResponse::User(user) => {
                let identity = user.into_identity(Some(email))?;
                tracing::info!(identity = %identity.id, "Identity created, confirmation pending");
                Ok(identity)
            }
        }
    }

    #[tracing::instrument(skip(self, redirect_to), fields(email = %email))]
    async fn send_magic_link(&self, email: &Email, redirect_to: &Url) -> Result<(), StoreError> {
        let url = with_redirect(self.endpoint("auth/v1/otp")?, redirect_to);
        let response = self
            .inner
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .json(&OtpRequest {
                email: email.as_str(),
                create_user: true,
            })
            .send()
            .await?;

        error_from_response(response).await?;
        tracing::info!("Magic link sent");
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        if !self.has_session() {
            return Ok(());
        }

        let result = self
            .inner
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await;
        self.set_session(None);

        error_from_response(result?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_response_with_session() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "user": {"id": "7b1f9c5e-2f0a-4c1e-9d8b-0a1b2c3d4e5f", "email": "new@x.com"}
        }"#;
        let body: SignUpResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(body, SignUpResponse::Session { .. }));
    }

    #[test]
    fn test_sign_up_response_pending_confirmation() {
        let json = r#"{"id": "7b1f9c5e-2f0a-4c1e-9d8b-0a1b2c3d4e5f", "email": "new@x.com", "confirmation_sent_at": "2025-05-01T10:00:00Z"}"#;
        let body: SignUpResponse = serde_json::from_str(json).unwrap();
        let SignUpResponse::User(user) = body else {
            panic!("expected bare user");
        };
        let identity = user.into_identity(None).unwrap();
        assert_eq!(identity.email.as_str(), "new@x.com");
    }

    #[test]
    fn test_user_without_email_uses_fallback() {
        let user = UserBody {
            id: IdentityId::generate(),
            email: None,
        };
        let fallback = Email::parse("typed@x.com").unwrap();
        assert_eq!(
            user.into_identity(Some(&fallback)).unwrap().email,
            fallback
        );
    }

    #[test]
    fn test_with_redirect() {
        let url = with_redirect(
            Url::parse("https://abc.supabase.co/auth/v1/otp").unwrap(),
            &Url::parse("https://app.mindwell.app/").unwrap(),
        );
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/auth/v1/otp?redirect_to=https%3A%2F%2Fapp.mindwell.app%2F"
        );
    }
}
