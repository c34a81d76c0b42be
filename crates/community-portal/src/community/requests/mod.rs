//! Self-service account requests handled by admins: account deletion and
//! linked-ID changes.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    AccountDeletionRequest, DeletionForm, IdChangeForm, IdChangeRequest, IdKind, MyRequests,
    RequestStatus,
};
pub use router::request_router;
pub use service::RequestService;
