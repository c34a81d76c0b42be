pub mod backend;
pub mod cache;
pub mod community;
pub mod config;
pub mod error;
pub mod telemetry;
