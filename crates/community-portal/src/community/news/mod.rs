//! Public news feed with a moderator-managed write side.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{NewsDraft, NewsItem};
pub use router::news_router;
pub use service::NewsService;
