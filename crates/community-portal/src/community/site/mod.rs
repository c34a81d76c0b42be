//! Read-mostly data behind the public pages: site settings, store items,
//! and the latest server statistics.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{ServerStats, SiteSetting, StoreItem};
pub use router::site_router;
pub use service::SiteService;
