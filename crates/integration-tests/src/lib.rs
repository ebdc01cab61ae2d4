//! Shared fixtures for MindWell scenario tests.
//!
//! Everything runs in-process: the handler router is driven with
//! `tower::ServiceExt::oneshot` over in-memory stores, and the client core
//! runs against `MemoryBackend`. No database or network is needed.
//!
//! ```bash
//! cargo test -p mindwell-integration-tests
//! ```

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use mindwell_core::{Email, EmailError, Submission, SubmissionId, SubmissionStatus, TrackingId};
use mindwell_functions::db::MemorySubmissionRepository;
use mindwell_functions::services::MemoryMailer;
use mindwell_functions::state::AppState;

/// Handler service wired to in-memory collaborators.
pub struct Handlers {
    pub router: Router,
    pub submissions: MemorySubmissionRepository,
    pub mailer: MemoryMailer,
}

impl Handlers {
    #[must_use]
    pub fn new() -> Self {
        Self::with_mailer(MemoryMailer::new())
    }

    #[must_use]
    pub fn with_mailer(mailer: MemoryMailer) -> Self {
        let submissions = MemorySubmissionRepository::new();
        let state = AppState::new(
            Arc::new(submissions.clone()),
            Arc::new(mailer.clone()),
            "support@mindwell.app",
        );
        Self {
            router: mindwell_functions::app(state),
            submissions,
            mailer,
        }
    }

    /// Send one request and return the status and JSON body (`Null` when
    /// the body is empty).
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body is not JSON.
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        #[allow(clippy::expect_used)]
        let response: Response<Body> = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        #[allow(clippy::expect_used)]
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body fits in memory");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            #[allow(clippy::expect_used)]
            serde_json::from_slice(&bytes).expect("JSON response body")
        };
        (status, body)
    }

    /// POST a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        #[allow(clippy::expect_used)]
        let request = Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.call(request).await
    }

    /// GET a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        #[allow(clippy::expect_used)]
        let request = Request::get(path)
            .body(Body::empty())
            .expect("valid request");
        self.call(request).await
    }
}

impl Default for Handlers {
    fn default() -> Self {
        Self::new()
    }
}

/// A kit row owned by `email`.
///
/// # Errors
///
/// Returns an error if `email` is not a valid address.
///
/// # Panics
///
/// Panics if `tracking_id` is blank.
pub fn kit(
    tracking_id: &str,
    email: &str,
    status: SubmissionStatus,
    created_at: DateTime<Utc>,
) -> Result<Submission, EmailError> {
    #[allow(clippy::expect_used)]
    let tracking_id = TrackingId::parse(tracking_id).expect("non-blank tracking ID");
    Ok(Submission {
        id: SubmissionId::generate(),
        tracking_id,
        user_email: Email::parse(email)?,
        status,
        created_at,
        updated_at: created_at,
        analyzed_at: None,
    })
}
