//! Client for the MindWell request handlers.
//!
//! Wraps the four handler endpoints served by `mindwell-functions`. Error
//! bodies are `{"error": "..."}`; the message is surfaced in
//! [`FunctionsError::Api`].

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use mindwell_core::{Email, SubmissionStatus, TrackingId};

use crate::config::AppConfig;

/// Errors from the handler endpoints.
#[derive(Debug, Error)]
pub enum FunctionsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Handler returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Body of `send-report-email`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEmailPayload {
    pub doctor_name: String,
    pub doctor_email: Email,
    pub user_email: String,
    pub pdf_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEmailReceipt {
    pub success: bool,
    pub email_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateReceipt {
    pub success: bool,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub tracking_ids: Vec<TrackingId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkAnalyzedReceipt {
    pub success: bool,
    pub message: String,
}

/// Public status of one kit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SampleStatus {
    pub tracking_id: TrackingId,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusBody<'a> {
    user_email: &'a Email,
    status: SubmissionStatus,
}

#[derive(Serialize)]
struct MarkAnalyzedBody<'a> {
    tracking_id: &'a TrackingId,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Handler API client.
#[derive(Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    access_token: Option<SecretString>,
}

impl FunctionsClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &AppConfig) -> Result<Self, FunctionsError> {
        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| FunctionsError::Parse(format!("Invalid anon key format: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.functions_url.clone(),
            anon_key: config.anon_key.clone(),
            access_token: None,
        })
    }

    /// Authorize requests with a session token instead of the anon key.
    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    fn endpoint(&self, name: &str) -> Result<Url, FunctionsError> {
        self.base_url
            .join(name)
            .map_err(|e| FunctionsError::Parse(format!("Invalid endpoint {name}: {e}")))
    }

    fn bearer(&self) -> &str {
        self.access_token
            .as_ref()
            .unwrap_or(&self.anon_key)
            .expose_secret()
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FunctionsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(FunctionsError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| FunctionsError::Parse(e.to_string()))
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<T, FunctionsError> {
        let response = self
            .client
            .post(self.endpoint(name)?)
            .bearer_auth(self.bearer())
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    /// Email the report to a doctor.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the handler rejects it.
    #[instrument(skip(self, payload), fields(doctor = %payload.doctor_email))]
    pub async fn send_report_email(
        &self,
        payload: &ReportEmailPayload,
    ) -> Result<ReportEmailReceipt, FunctionsError> {
        self.post("send-report-email", payload).await
    }

    /// Set the status of every kit owned by `email`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the handler rejects it.
    #[instrument(skip(self))]
    pub async fn update_sample_status(
        &self,
        email: &Email,
        status: SubmissionStatus,
    ) -> Result<StatusUpdateReceipt, FunctionsError> {
        self.post(
            "update-sample-status",
            &UpdateStatusBody {
                user_email: email,
                status,
            },
        )
        .await
    }

    /// Mark one kit as analyzed.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the handler rejects it.
    #[instrument(skip(self))]
    pub async fn mark_analyzed(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<MarkAnalyzedReceipt, FunctionsError> {
        self.post("mark-analyzed", &MarkAnalyzedBody { tracking_id })
            .await
    }

    /// Public status of one kit.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the kit is unknown.
    #[instrument(skip(self))]
    pub async fn sample_status(
        &self,
        tracking_id: &TrackingId,
    ) -> Result<SampleStatus, FunctionsError> {
        let mut url = self.endpoint("sample-status")?;
        url.query_pairs_mut()
            .append_pair("tracking_id", tracking_id.as_str());

        let response = self
            .client
            .get(url)
            .bearer_auth(self.bearer())
            .send()
            .await?;
        Self::read(response).await
    }
}
