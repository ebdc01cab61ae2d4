//! Doctor report email composition.

use askama::Template;
use chrono::NaiveDate;

use mindwell_core::Email;

use super::mailer::{Attachment, MailerError, OutgoingEmail};

/// HTML body of the doctor report email.
#[derive(Template)]
#[template(path = "email/report.html")]
struct ReportEmailHtml<'a> {
    doctor_name: &'a str,
    patient_email: &'a str,
    note_lines: &'a [&'a str],
    support_email: &'a str,
}

/// Plain text body of the doctor report email.
#[derive(Template)]
#[template(path = "email/report.txt")]
struct ReportEmailText<'a> {
    doctor_name: &'a str,
    patient_email: &'a str,
    note_lines: &'a [&'a str],
    support_email: &'a str,
}

/// Validated input for a report email.
#[derive(Debug, Clone)]
pub struct ReportEmailRequest {
    pub doctor_name: String,
    pub doctor_email: Email,
    /// Patient identifier shown in the subject line.
    pub user_email: String,
    pub pdf: Vec<u8>,
    pub notes: Option<String>,
}

/// Attachment filename for a report generated on `date`.
#[must_use]
pub fn report_filename(date: NaiveDate) -> String {
    format!("MindWell_Report_{}.pdf", date.format("%Y-%m-%d"))
}

/// Render the report email for delivery.
///
/// # Errors
///
/// Returns `MailerError::Template` if a template fails to render.
pub fn compose_report_email(
    request: ReportEmailRequest,
    support_email: &str,
    today: NaiveDate,
) -> Result<OutgoingEmail, MailerError> {
    let note_lines: Vec<&str> = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.lines().collect())
        .unwrap_or_default();

    let html = ReportEmailHtml {
        doctor_name: &request.doctor_name,
        patient_email: &request.user_email,
        note_lines: &note_lines,
        support_email,
    }
    .render()?;
    let text = ReportEmailText {
        doctor_name: &request.doctor_name,
        patient_email: &request.user_email,
        note_lines: &note_lines,
        support_email,
    }
    .render()?;

    Ok(OutgoingEmail {
        subject: format!("MindWell Health Report for Patient: {}", request.user_email),
        to: request.doctor_email,
        html,
        text,
        attachments: vec![Attachment {
            filename: report_filename(today),
            content: request.pdf,
        }],
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(notes: Option<&str>) -> ReportEmailRequest {
        ReportEmailRequest {
            doctor_name: "Rivera".to_string(),
            doctor_email: Email::parse("dr.rivera@clinic.org").unwrap(),
            user_email: "patient@example.com".to_string(),
            pdf: b"%PDF-1.4".to_vec(),
            notes: notes.map(String::from),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename(today()), "MindWell_Report_2025-03-07.pdf");
    }

    #[test]
    fn test_compose_subject_and_attachment() {
        let email = compose_report_email(request(None), "support@mindwell.app", today()).unwrap();
        assert_eq!(
            email.subject,
            "MindWell Health Report for Patient: patient@example.com"
        );
        assert_eq!(email.to.as_str(), "dr.rivera@clinic.org");
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].filename, "MindWell_Report_2025-03-07.pdf");
        assert_eq!(email.attachments[0].content, b"%PDF-1.4");
        assert!(email.html.contains("Dear Dr. Rivera"));
        assert!(email.html.contains("support@mindwell.app"));
        assert!(!email.html.contains("Additional Notes"));
    }

    #[test]
    fn test_notes_rendered_with_line_breaks() {
        let email = compose_report_email(
            request(Some("Sleeping poorly\nStarted journaling")),
            "support@mindwell.app",
            today(),
        )
        .unwrap();
        assert!(email.html.contains("Sleeping poorly<br/>Started journaling"));
        assert!(email.text.contains("Sleeping poorly\nStarted journaling"));
    }

    #[test]
    fn test_notes_are_escaped_in_html() {
        let email = compose_report_email(
            request(Some("<script>alert(1)</script>")),
            "support@mindwell.app",
            today(),
        )
        .unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }
}
