//! Mapping of backend error bodies onto [`StoreError`].
//!
//! Auth errors look like `{"code": 422, "error_code": "...", "msg": "..."}`
//! (older servers: `{"error": "...", "error_description": "..."}`). REST
//! errors look like `{"code": "42501", "message": "...", "details": ...}`.

use serde::Deserialize;

use crate::error::StoreError;

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ApiErrorBody {
    fn code(&self) -> Option<String> {
        self.error_code
            .clone()
            .or_else(|| match &self.code {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                _ => None,
            })
    }

    fn message(self) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_default()
    }
}

/// Classify a non-success response.
pub(crate) fn classify(status: u16, body: &str) -> StoreError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code();
    let message = parsed.message();
    let message = if message.is_empty() {
        body.to_string()
    } else {
        message
    };

    match code.as_deref() {
        Some("user_already_exists" | "email_exists") => StoreError::AlreadyExists,
        Some("over_email_send_rate_limit" | "over_request_rate_limit") => {
            StoreError::RateLimited(message)
        }
        Some("42501") => StoreError::PermissionDenied(message),
        Some("23505") => StoreError::Conflict(message),
        Some("PGRST116") => StoreError::NotFound,
        _ if status == 429 => StoreError::RateLimited(message),
        _ if message.contains("row-level security") => StoreError::PermissionDenied(message),
        _ if status == 422 && message.contains("already registered") => StoreError::AlreadyExists,
        _ => StoreError::Api {
            status,
            code,
            message,
        },
    }
}

/// Turn a response into `Ok(response)` or a classified error.
pub(crate) async fn error_from_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify(status.as_u16(), &body);
    tracing::debug!(status = status.as_u16(), error = %err, "Backend request failed");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_codes() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#;
        assert!(matches!(classify(422, body), StoreError::AlreadyExists));

        let body = r#"{"code":429,"error_code":"over_email_send_rate_limit","msg":"email rate limit exceeded"}"#;
        assert!(matches!(classify(429, body), StoreError::RateLimited(_)));
    }

    #[test]
    fn test_legacy_already_registered() {
        let body = r#"{"error":"invalid_request","error_description":"User already registered"}"#;
        assert!(matches!(classify(422, body), StoreError::AlreadyExists));
    }

    #[test]
    fn test_rest_error_codes() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy for table \"profiles\"","details":null,"hint":null}"#;
        assert!(matches!(classify(403, body), StoreError::PermissionDenied(_)));

        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"profiles_user_id_key\""}"#;
        assert!(matches!(classify(409, body), StoreError::Conflict(_)));
    }

    #[test]
    fn test_unknown_error_keeps_details() {
        match classify(500, "upstream timeout") {
            StoreError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 500);
                assert!(code.is_none());
                assert_eq!(message, "upstream timeout");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
