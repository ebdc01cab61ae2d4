//! Errors returned by the backend stores.

use thiserror::Error;

/// Errors from the identity, profile, and submission stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Sign-up rejected because the email already has an account.
    #[error("an account with this email already exists")]
    AlreadyExists,

    /// The backend is throttling requests (typically outbound auth emails).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Row-level security rejected the request, usually because the new
    /// session has not reached the data API yet.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The operation needs a signed-in identity and there is none.
    #[error("not signed in")]
    NotAuthenticated,

    /// Requested row was not found.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error that has no dedicated variant.
    #[error("API error: {status} {code:?} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether the error came from row-level authorization.
    ///
    /// Some backends only report this in the message text, so that is
    /// checked as well.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::PermissionDenied(_) => true,
            Self::Api { message, .. } => message.contains("row-level security"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_detection() {
        assert!(StoreError::PermissionDenied("denied".to_string()).is_permission_denied());
        assert!(
            StoreError::Api {
                status: 401,
                code: None,
                message: "new row violates row-level security policy".to_string(),
            }
            .is_permission_denied()
        );
        assert!(!StoreError::NotFound.is_permission_denied());
    }
}
