//! Resend email API client.
//!
//! Sends report emails through `POST {api_url}/emails` with attachments
//! base64-encoded in the JSON body.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::mailer::{MailerError, OutgoingEmail, ReportMailer};
use crate::config::ReportEmailConfig;

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentBody<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
    reply_to: String,
}

impl ResendMailer {
    /// Create a new Resend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ReportEmailConfig) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| MailerError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
            from: config.from.to_string(),
            reply_to: config.reply_to.to_string(),
        })
    }
}

#[async_trait]
impl ReportMailer for ResendMailer {
    #[tracing::instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: OutgoingEmail) -> Result<String, MailerError> {
        let body = SendEmailBody {
            from: &self.from,
            to: [email.to.as_str()],
            reply_to: &self.reply_to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Email API rejected message");
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| MailerError::Parse(e.to_string()))?;

        tracing::info!(email_id = %sent.id, "Report email sent");
        Ok(sent.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use mindwell_core::Email;

    use super::*;

    fn config(api_url: &str) -> ReportEmailConfig {
        ReportEmailConfig {
            api_key: SecretString::from("re_9fK2xQ7mZ4pL1vB8wT3c"),
            api_url: api_url.to_string(),
            from: Email::parse("reports@mindwell.app").unwrap(),
            reply_to: Email::parse("care@mindwell.app").unwrap(),
            support_email: "support@mindwell.app".to_string(),
        }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let mailer = ResendMailer::new(&config("https://api.resend.com/")).unwrap();
        assert_eq!(mailer.endpoint, "https://api.resend.com/emails");
        assert_eq!(mailer.reply_to, "care@mindwell.app");
    }

    #[test]
    fn test_attachment_body_is_base64() {
        let attachment = AttachmentBody {
            filename: "MindWell_Report_2025-03-07.pdf",
            content: STANDARD.encode(b"%PDF"),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["content"], "JVBERg==");
    }
}
