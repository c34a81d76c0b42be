//! Partner server applications.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{PartnerApplication, PartnerForm, PartnerStatus};
pub use router::partnership_router;
pub use service::PartnershipService;
