//! Domain access services for the community portal, one submodule per
//! entity group, plus the axum routers that expose them.

pub mod announcements;
pub mod applications;
mod envelope;
mod error;
mod extract;
pub mod news;
pub mod partnerships;
pub mod profiles;
pub mod requests;
pub mod review;
pub mod roles;
pub mod site;
pub mod team;
mod validation;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;

pub use envelope::ActionResponse;
pub use error::{FieldError, ServiceError, ValidationFailure};
pub use extract::BearerToken;

use crate::backend::RemoteBackend;
use crate::config::PortalConfig;
use announcements::{announcement_router, AnnouncementService};
use applications::{application_router, ApplicationService};
use news::{news_router, NewsService};
use partnerships::{partnership_router, PartnershipService};
use profiles::{profile_router, ProfileService};
use requests::{request_router, RequestService};
use roles::{role_router, RoleService};
use site::{site_router, SiteService};
use team::{team_router, TeamService};

/// Every domain service over one shared backend.
pub struct Portal<B> {
    pub roles: Arc<RoleService<B>>,
    pub announcements: Arc<AnnouncementService<B>>,
    pub news: Arc<NewsService<B>>,
    pub applications: Arc<ApplicationService<B>>,
    pub team: Arc<TeamService<B>>,
    pub partnerships: Arc<PartnershipService<B>>,
    pub requests: Arc<RequestService<B>>,
    pub profiles: Arc<ProfileService<B>>,
    pub site: Arc<SiteService<B>>,
    pub config: PortalConfig,
}

impl<B> Clone for Portal<B> {
    fn clone(&self) -> Self {
        Self {
            roles: Arc::clone(&self.roles),
            announcements: Arc::clone(&self.announcements),
            news: Arc::clone(&self.news),
            applications: Arc::clone(&self.applications),
            team: Arc::clone(&self.team),
            partnerships: Arc::clone(&self.partnerships),
            requests: Arc::clone(&self.requests),
            profiles: Arc::clone(&self.profiles),
            site: Arc::clone(&self.site),
            config: self.config.clone(),
        }
    }
}

impl<B: RemoteBackend + 'static> Portal<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        Self {
            roles: Arc::new(RoleService::new(Arc::clone(&backend), config)),
            announcements: Arc::new(AnnouncementService::new(Arc::clone(&backend))),
            news: Arc::new(NewsService::new(Arc::clone(&backend), config)),
            applications: Arc::new(ApplicationService::new(Arc::clone(&backend))),
            team: Arc::new(TeamService::new(Arc::clone(&backend), config)),
            partnerships: Arc::new(PartnershipService::new(Arc::clone(&backend))),
            requests: Arc::new(RequestService::new(Arc::clone(&backend))),
            profiles: Arc::new(ProfileService::new(Arc::clone(&backend))),
            site: Arc::new(SiteService::new(backend, config)),
            config: config.clone(),
        }
    }

    /// A fresh wizard using the configured post-submit redirect delay.
    pub fn wizard(&self) -> applications::ApplicationWizard {
        applications::ApplicationWizard::new(self.config.redirect_delay)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(role_router(Arc::clone(&self.roles)))
            .merge(announcement_router(Arc::clone(&self.announcements)))
            .merge(news_router(Arc::clone(&self.news)))
            .merge(application_router(Arc::clone(&self.applications)))
            .merge(team_router(Arc::clone(&self.team)))
            .merge(partnership_router(Arc::clone(&self.partnerships)))
            .merge(request_router(Arc::clone(&self.requests)))
            .merge(profile_router(Arc::clone(&self.profiles)))
            .merge(site_router(Arc::clone(&self.site)))
    }
}

/// Build the combined API router for a backend.
pub fn portal_router<B: RemoteBackend + 'static>(backend: Arc<B>, config: &PortalConfig) -> Router {
    Portal::new(backend, config).router()
}
