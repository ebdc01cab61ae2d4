//! HTTP route handlers for the functions service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (submission store reachable)
//!
//! POST /mark-analyzed           - Mark one kit as analyzed by tracking ID
//! GET  /sample-status           - Public status of one kit (?tracking_id=)
//! POST /update-sample-status    - Set status for every kit owned by an email
//! POST /send-report-email       - Email a PDF report to a doctor
//! ```
//!
//! Every handler route also answers a bare `OPTIONS` with an empty 200; real
//! CORS preflights are answered by the CORS layer before routing.

pub mod health;
pub mod report;
pub mod samples;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `{"error": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor whose rejections render as `{"error": ...}`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Create the handler router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route(
            "/mark-analyzed",
            post(samples::mark_analyzed).options(preflight),
        )
        .route(
            "/sample-status",
            get(samples::sample_status).options(preflight),
        )
        .route(
            "/update-sample-status",
            post(samples::update_sample_status).options(preflight),
        )
        .route(
            "/send-report-email",
            post(report::send_report_email).options(preflight),
        )
}

/// Empty 200 for `OPTIONS` requests that are not CORS preflights.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Treat `None` and blank strings alike as missing.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
