//! Public profile of the signed-in user and avatar uploads.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{Profile, ProfilePatch, AVATAR_MAX_BYTES};
pub use router::profile_router;
pub use service::ProfileService;
