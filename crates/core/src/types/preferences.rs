//! Notification preferences captured during onboarding.

use serde::{Deserialize, Serialize};

/// Alert-preference bundle stored on a profile.
///
/// Every flag defaults to `true`; a user who skips the preferences step is
/// opted in to all three kinds of alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPreferences {
    /// Status updates by email.
    pub email_alerts: bool,
    /// Immediate notice of urgent results.
    pub critical_alerts: bool,
    /// Notice when sample analysis completes.
    pub analysis_alerts: bool,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            email_alerts: true,
            critical_alerts: true,
            analysis_alerts: true,
        }
    }
}
