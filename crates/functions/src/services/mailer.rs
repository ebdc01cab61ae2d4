//! Email transport seam.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use mindwell_core::Email;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Email API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Failed to build the request or parse the response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A file attached to an outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A fully rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Email,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Send the email and return the provider's message ID.
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailerError>;
}

/// Mailer that records messages instead of sending them.
///
/// Used by tests and by local runs without an email API key.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    fail_with: Option<u16>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with the given API status.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            sent: Arc::default(),
            fail_with: Some(status),
        }
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportMailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailerError> {
        if let Some(status) = self.fail_with {
            return Err(MailerError::Api {
                status,
                message: "delivery rejected".to_string(),
            });
        }

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailerError::Parse("mailer lock poisoned".to_string()))?;
        sent.push(email);
        Ok(format!("memory-{}", sent.len()))
    }
}
