//! Share the health report with a doctor.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::instrument;

use mindwell_core::{Email, SubmissionStatus};

use crate::functions_client::{
    FunctionsClient, FunctionsError, ReportEmailPayload, ReportEmailReceipt, StatusUpdateReceipt,
};
use crate::notice::{Notice, Notifier};
use crate::report::{HealthReport, ReportError, ReportRenderer};

/// Handler calls used by the share page.
#[async_trait]
pub trait ReportDelivery: Send + Sync {
    async fn send_report_email(
        &self,
        payload: &ReportEmailPayload,
    ) -> Result<ReportEmailReceipt, FunctionsError>;

    async fn update_sample_status(
        &self,
        email: &Email,
        status: SubmissionStatus,
    ) -> Result<StatusUpdateReceipt, FunctionsError>;
}

#[async_trait]
impl ReportDelivery for FunctionsClient {
    async fn send_report_email(
        &self,
        payload: &ReportEmailPayload,
    ) -> Result<ReportEmailReceipt, FunctionsError> {
        Self::send_report_email(self, payload).await
    }

    async fn update_sample_status(
        &self,
        email: &Email,
        status: SubmissionStatus,
    ) -> Result<StatusUpdateReceipt, FunctionsError> {
        Self::update_sample_status(self, email, status).await
    }
}

/// Share failures.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("doctor name and email are required")]
    MissingInformation,
    #[error("invalid doctor email: {0}")]
    InvalidDoctorEmail(String),
    #[error(transparent)]
    Render(#[from] ReportError),
    #[error(transparent)]
    Delivery(#[from] FunctionsError),
}

/// Doctor contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorForm {
    pub name: String,
    pub email: String,
    /// Collected for the user's reference; not sent.
    pub phone: String,
    pub notes: String,
}

/// Share page actions.
pub struct ShareWithDoctor {
    delivery: Arc<dyn ReportDelivery>,
    renderer: Arc<dyn ReportRenderer>,
    notifier: Arc<dyn Notifier>,
}

impl ShareWithDoctor {
    #[must_use]
    pub fn new(
        delivery: Arc<dyn ReportDelivery>,
        renderer: Arc<dyn ReportRenderer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            delivery,
            renderer,
            notifier,
        }
    }

    /// Render `report` and email it to the doctor in `form`.
    ///
    /// On success the form is cleared.
    ///
    /// # Errors
    ///
    /// Returns `MissingInformation` or `InvalidDoctorEmail` before any
    /// remote call, otherwise the render or delivery error.
    #[instrument(skip_all, fields(patient = %user_email))]
    pub async fn send(
        &self,
        form: &mut DoctorForm,
        report: &HealthReport,
        user_email: &Email,
    ) -> Result<ReportEmailReceipt, ShareError> {
        let name = form.name.trim();
        if name.is_empty() || form.email.trim().is_empty() {
            self.notifier.notify(Notice::error(
                "Missing Information",
                "Please provide doctor's name and email address.",
            ));
            return Err(ShareError::MissingInformation);
        }
        let doctor_email = Email::parse(&form.email).map_err(|e| {
            self.notifier.notify(Notice::error(
                "Invalid Email",
                "Please provide a valid email address for your doctor.",
            ));
            ShareError::InvalidDoctorEmail(e.to_string())
        })?;

        let payload = ReportEmailPayload {
            doctor_name: name.to_string(),
            doctor_email,
            user_email: user_email.to_string(),
            pdf_base64: STANDARD.encode(self.renderer.render(report)?),
            notes: Some(form.notes.trim().to_string()).filter(|n| !n.is_empty()),
        };

        match self.delivery.send_report_email(&payload).await {
            Ok(receipt) => {
                tracing::info!(email_id = %receipt.email_id, "Report sent");
                self.notifier.notify(Notice::success(
                    "Report Sent Successfully",
                    format!(
                        "Your comprehensive report has been sent to Dr. {}.",
                        payload.doctor_name
                    ),
                ));
                *form = DoctorForm::default();
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sending report");
                self.notifier.notify(Notice::error(
                    "Send Failed",
                    "Failed to send report. Please try again.",
                ));
                Err(e.into())
            }
        }
    }

    /// Render `report` for download, returning the filename and bytes.
    ///
    /// # Errors
    ///
    /// Returns the render error.
    pub fn download(&self, report: &HealthReport) -> Result<(String, Vec<u8>), ShareError> {
        let bytes = self.renderer.render(report)?;
        self.notifier.notify(Notice::info(
            "Download Started",
            "Your full report is being downloaded.",
        ));
        Ok((report.filename(), bytes))
    }

    /// Mark every kit of `email` as analyzed.
    ///
    /// # Errors
    ///
    /// Returns the delivery error.
    #[instrument(skip(self))]
    pub async fn mark_complete(&self, email: &Email) -> Result<StatusUpdateReceipt, ShareError> {
        match self
            .delivery
            .update_sample_status(email, SubmissionStatus::Analyzed)
            .await
        {
            Ok(receipt) => {
                self.notifier.notify(Notice::success(
                    "Status Updated",
                    "Sample status has been updated to completed. All progress items are now marked as complete.",
                ));
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error updating status");
                self.notifier.notify(Notice::error(
                    "Error",
                    "Failed to update status. Please try again.",
                ));
                Err(e.into())
            }
        }
    }
}
