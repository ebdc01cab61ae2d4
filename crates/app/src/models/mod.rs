//! Client-side records exchanged with the backend.

pub mod identity;
pub mod profile;

pub use identity::Identity;
pub use profile::{Profile, ProfileFields};
