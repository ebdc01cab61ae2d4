//! Sample status handlers.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mindwell_core::{Email, SubmissionStatus, TrackingId};

use super::{JsonBody, QueryParams, present};
use crate::error::{AppError, Result};
use crate::models::SubmissionSummary;
use crate::state::AppState;

const TRACKING_ID_REQUIRED: &str = "Tracking ID is required";
const SAMPLE_NOT_FOUND: &str = "Sample not found";

/// Body of `POST /mark-analyzed`.
#[derive(Debug, Deserialize)]
pub struct MarkAnalyzedRequest {
    pub tracking_id: Option<String>,
}

/// Query of `GET /sample-status`.
#[derive(Debug, Deserialize)]
pub struct SampleStatusQuery {
    pub tracking_id: Option<String>,
}

/// Body of `POST /update-sample-status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSampleStatusRequest {
    pub user_email: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkAnalyzedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateSampleStatusResponse {
    pub success: bool,
    pub status: SubmissionStatus,
    pub updated: usize,
    pub tracking_ids: Vec<TrackingId>,
}

fn required_tracking_id(raw: Option<&str>) -> Result<TrackingId> {
    present(raw)
        .and_then(|raw| TrackingId::parse(raw).ok())
        .ok_or_else(|| AppError::BadRequest(TRACKING_ID_REQUIRED.to_string()))
}

/// Mark a kit as analyzed.
///
/// POST /mark-analyzed
#[instrument(skip(state, body))]
pub async fn mark_analyzed(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<MarkAnalyzedRequest>,
) -> Result<Json<MarkAnalyzedResponse>> {
    let tracking_id = required_tracking_id(body.tracking_id.as_deref())?;

    let updated = state
        .submissions()
        .mark_analyzed(&tracking_id, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound(SAMPLE_NOT_FOUND.to_string()))?;

    tracing::info!(tracking_id = %updated.tracking_id, "Sample marked as analyzed");

    Ok(Json(MarkAnalyzedResponse {
        success: true,
        message: format!("Sample {tracking_id} marked as analyzed"),
    }))
}

/// Public status of a single kit. Never includes the owner's email.
///
/// GET /sample-status?tracking_id=...
#[instrument(skip(state, query))]
pub async fn sample_status(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SampleStatusQuery>,
) -> Result<Json<SubmissionSummary>> {
    let tracking_id = required_tracking_id(query.tracking_id.as_deref())?;

    let submission = state
        .submissions()
        .find_by_tracking_id(&tracking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SAMPLE_NOT_FOUND.to_string()))?;

    Ok(Json(submission))
}

/// Set the status of every kit owned by an email.
///
/// POST /update-sample-status
///
/// Stored owner emails match ignoring case. Besides the 400s for missing or
/// invalid fields, an email that owns no kits gets
/// 404 `{"error": "No submissions found for user"}` rather than a
/// zero-count success.
#[instrument(skip(state, body))]
pub async fn update_sample_status(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<UpdateSampleStatusRequest>,
) -> Result<Json<UpdateSampleStatusResponse>> {
    let (Some(raw_email), Some(raw_status)) = (
        present(body.user_email.as_deref()),
        present(body.status.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing userEmail or status".to_string(),
        ));
    };

    let email = Email::parse(raw_email)
        .map_err(|e| AppError::BadRequest(format!("Invalid userEmail: {e}")))?;
    let status: SubmissionStatus = raw_status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid status: {raw_status}")))?;

    let updated = state
        .submissions()
        .update_status_for_email(&email, status, Utc::now())
        .await?;

    if updated.is_empty() {
        return Err(AppError::NotFound(
            "No submissions found for user".to_string(),
        ));
    }

    tracing::info!(%status, count = updated.len(), "Sample status updated");

    Ok(Json(UpdateSampleStatusResponse {
        success: true,
        status,
        updated: updated.len(),
        tracking_ids: updated.into_iter().map(|s| s.tracking_id).collect(),
    }))
}
