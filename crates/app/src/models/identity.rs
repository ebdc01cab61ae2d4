//! Authenticated account.

use serde::{Deserialize, Serialize};

use mindwell_core::{Email, IdentityId};

/// An authenticated account as reported by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: Email,
}
