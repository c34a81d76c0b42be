//! Admin/moderator roles and the permission pre-checks every privileged
//! operation performs before touching the backend.

pub mod domain;
mod permissions;
pub mod router;
pub mod service;

pub use domain::{AdminRole, AdminUser, AdminUserView, NewAdminUser, RoleSummary};
pub use permissions::Permissions;
pub use router::role_router;
pub use service::RoleService;
