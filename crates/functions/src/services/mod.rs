//! Outbound services used by the handlers.

pub mod mailer;
pub mod report;
pub mod resend;

pub use mailer::{Attachment, MailerError, MemoryMailer, OutgoingEmail, ReportMailer};
pub use report::{ReportEmailRequest, compose_report_email, report_filename};
pub use resend::ResendMailer;
