//! Doctor report email handler.

use axum::{Json, extract::State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mindwell_core::Email;

use super::{JsonBody, present};
use crate::error::{AppError, Result};
use crate::services::{ReportEmailRequest, compose_report_email};
use crate::state::AppState;

/// Body of `POST /send-report-email`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReportEmailRequest {
    pub doctor_name: Option<String>,
    pub doctor_email: Option<String>,
    pub user_email: Option<String>,
    pub pdf_base64: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReportEmailResponse {
    pub success: bool,
    pub email_id: String,
}

/// Strip an optional `data:...;base64,` prefix and decode.
fn decode_pdf(raw: &str) -> Option<Vec<u8>> {
    let payload = raw
        .split_once(";base64,")
        .map_or(raw, |(_, data)| data)
        .trim();
    STANDARD.decode(payload).ok().filter(|bytes| !bytes.is_empty())
}

/// Email a PDF report to a doctor.
///
/// POST /send-report-email
#[instrument(skip(state, body))]
pub async fn send_report_email(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendReportEmailRequest>,
) -> Result<Json<SendReportEmailResponse>> {
    let (Some(doctor_name), Some(doctor_email), Some(user_email), Some(pdf_base64)) = (
        present(body.doctor_name.as_deref()),
        present(body.doctor_email.as_deref()),
        present(body.user_email.as_deref()),
        present(body.pdf_base64.as_deref()),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let doctor_email = Email::parse(doctor_email)
        .map_err(|e| AppError::BadRequest(format!("Invalid doctorEmail: {e}")))?;
    let pdf = decode_pdf(pdf_base64)
        .ok_or_else(|| AppError::BadRequest("Invalid pdfBase64 attachment".to_string()))?;

    let email = compose_report_email(
        ReportEmailRequest {
            doctor_name: doctor_name.to_string(),
            doctor_email,
            user_email: user_email.to_string(),
            pdf,
            notes: body.notes,
        },
        state.support_email(),
        Utc::now().date_naive(),
    )?;

    let email_id = state.mailer().send(email).await?;

    Ok(Json(SendReportEmailResponse {
        success: true,
        email_id,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pdf_plain_and_data_url() {
        assert_eq!(decode_pdf("JVBERg==").unwrap(), b"%PDF");
        assert_eq!(
            decode_pdf("data:application/pdf;base64,JVBERg==").unwrap(),
            b"%PDF"
        );
    }

    #[test]
    fn test_decode_pdf_rejects_garbage() {
        assert!(decode_pdf("not base64!!").is_none());
        assert!(decode_pdf("").is_none());
    }

    #[test]
    fn test_response_uses_camel_case() {
        let json = serde_json::to_value(SendReportEmailResponse {
            success: true,
            email_id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json["emailId"], "abc");
    }
}
