//! Sample status commands, via the request handlers.
//!
//! # Usage
//!
//! ```bash
//! mindwell sample status MW-2041
//! mindwell sample mark-analyzed MW-2041
//! mindwell sample set-status --email alex@example.com --status shipped
//! ```

use thiserror::Error;

use mindwell_app::AppConfig;
use mindwell_app::config::ConfigError;
use mindwell_app::functions_client::{FunctionsClient, FunctionsError};
use mindwell_core::{Email, SubmissionStatus, TrackingId};

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request failed: {0}")]
    Functions(#[from] FunctionsError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn client() -> Result<FunctionsClient, SampleError> {
    let config = AppConfig::from_env()?;
    Ok(FunctionsClient::new(&config)?)
}

fn tracking_id(raw: &str) -> Result<TrackingId, SampleError> {
    TrackingId::parse(raw).map_err(|e| SampleError::InvalidArgument(e.to_string()))
}

/// Print the public status of a kit.
///
/// # Errors
///
/// Returns error if the request fails or the kit is unknown.
pub async fn status(raw_id: &str) -> Result<(), SampleError> {
    let status = client()?.sample_status(&tracking_id(raw_id)?).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}: {} ({})", status.tracking_id, status.status, status.status.label());
        if let Some(at) = status.analyzed_at {
            println!("  analyzed at {at}");
        }
    }
    Ok(())
}

/// Mark one kit as analyzed.
///
/// # Errors
///
/// Returns error if the request fails or the kit is unknown.
pub async fn mark_analyzed(raw_id: &str) -> Result<(), SampleError> {
    let receipt = client()?.mark_analyzed(&tracking_id(raw_id)?).await?;
    tracing::info!("{}", receipt.message);
    Ok(())
}

/// Set the status of every kit owned by an email.
///
/// # Errors
///
/// Returns error if an argument is invalid or the request fails.
pub async fn set_status(email: &str, status: &str) -> Result<(), SampleError> {
    let email = Email::parse(email).map_err(|e| SampleError::InvalidArgument(e.to_string()))?;
    let status: SubmissionStatus = status
        .parse()
        .map_err(|e: mindwell_core::StatusParseError| SampleError::InvalidArgument(e.to_string()))?;

    let receipt = client()?.update_sample_status(&email, status).await?;
    tracing::info!(updated = receipt.updated, status = %receipt.status, "Sample status updated");
    Ok(())
}
