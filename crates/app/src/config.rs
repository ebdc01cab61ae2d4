//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MINDWELL_BACKEND_URL` - Base URL of the hosted backend (auth + REST)
//! - `MINDWELL_ANON_KEY` - Public anonymous API key
//! - `MINDWELL_SITE_URL` - Application root; magic links and confirmation
//!   emails redirect here
//!
//! ## Optional
//! - `MINDWELL_FUNCTIONS_URL` - Handler base URL (default: `<backend>/functions/v1`)
//! - `MINDWELL_SESSION_SETTLE_MS` - Pause after sign-up before the profile
//!   write (default: 200)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Backend base URL, always ending in `/`
    pub backend_url: Url,
    /// Anonymous API key sent as `apikey`
    pub anon_key: SecretString,
    /// Handler base URL, always ending in `/`
    pub functions_url: Url,
    /// Application root
    pub site_url: Url,
    /// Pause between identity creation and the profile write
    pub session_settle: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("functions_url", &self.functions_url.as_str())
            .field("site_url", &self.site_url.as_str())
            .field("session_settle", &self.session_settle)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let backend_url = get_url("MINDWELL_BACKEND_URL")?;
        let functions_url = match std::env::var("MINDWELL_FUNCTIONS_URL") {
            Ok(raw) => parse_url("MINDWELL_FUNCTIONS_URL", &raw)?,
            Err(_) => default_functions_url(&backend_url)?,
        };
        let settle_ms: u64 = std::env::var("MINDWELL_SESSION_SETTLE_MS")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("MINDWELL_SESSION_SETTLE_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            backend_url,
            anon_key: SecretString::from(get_required_env("MINDWELL_ANON_KEY")?),
            functions_url,
            site_url: get_url("MINDWELL_SITE_URL")?,
            session_settle: Duration::from_millis(settle_ms),
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_url(key: &str) -> Result<Url, ConfigError> {
    parse_url(key, &get_required_env(key)?)
}

/// Parse a base URL, forcing a trailing slash so `Url::join` appends.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_functions_url(backend: &Url) -> Result<Url, ConfigError> {
    backend
        .join("functions/v1/")
        .map_err(|e| ConfigError::InvalidEnvVar("MINDWELL_FUNCTIONS_URL".to_string(), e.to_string()))
}
