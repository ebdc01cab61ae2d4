//! REST (table) endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use mindwell_core::{Email, IdentityId, Submission};

use super::{SupabaseClient, error_from_response};
use crate::error::StoreError;
use crate::models::{Profile, ProfileFields};
use crate::store::{ProfileStore, SubmissionReader};

const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Serialize)]
struct InsertProfileBody<'a> {
    user_id: IdentityId,
    #[serde(flatten)]
    fields: &'a ProfileFields,
}

#[derive(Serialize)]
struct UpdateProfileBody<'a> {
    #[serde(flatten)]
    fields: &'a ProfileFields,
    updated_at: DateTime<Utc>,
}

impl SupabaseClient {
    fn table(&self, table: &str, filters: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in filters {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn read_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        error_from_response(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn profile_filter(identity: IdentityId) -> (&'static str, String) {
    ("user_id", format!("eq.{identity}"))
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn find_by_identity(&self, identity: IdentityId) -> Result<Option<Profile>, StoreError> {
        let url = self.table(
            "profiles",
            &[
                ("select", "*".to_string()),
                profile_filter(identity),
                ("limit", "1".to_string()),
            ],
        )?;
        let response = self
            .inner
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let rows: Vec<Profile> = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self, fields))]
    async fn insert(
        &self,
        identity: IdentityId,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let response = self
            .inner
            .http
            .post(self.table("profiles", &[])?)
            .header(AUTHORIZATION, self.bearer())
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&InsertProfileBody {
                user_id: identity,
                fields: &fields,
            })
            .send()
            .await?;

        let rows: Vec<Profile> = Self::read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    #[tracing::instrument(skip(self, fields))]
    async fn update_by_identity(
        &self,
        identity: IdentityId,
        fields: ProfileFields,
    ) -> Result<Profile, StoreError> {
        let response = self
            .inner
            .http
            .patch(self.table("profiles", &[profile_filter(identity)])?)
            .header(AUTHORIZATION, self.bearer())
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&UpdateProfileBody {
                fields: &fields,
                updated_at: Utc::now(),
            })
            .send()
            .await?;

        // Row-level security hides rows instead of rejecting the update, so
        // an empty result is either a missing row or a denied one.
        let rows: Vec<Profile> = Self::read_rows(response).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl SubmissionReader for SupabaseClient {
    async fn latest_by_email(&self, email: &Email) -> Result<Option<Submission>, StoreError> {
        let url = self.table(
            "submissions",
            &[
                ("select", "*".to_string()),
                ("user_email", format!("eq.{email}")),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ],
        )?;
        let response = self
            .inner
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let rows: Vec<Submission> = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }
}
