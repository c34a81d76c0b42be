use std::sync::Arc;

use tracing::debug;

use super::domain::{AdminRole, AdminUser};
use crate::backend::{decode_rows, BackendError, Query, RemoteBackend, Session, Table};
use crate::community::{BearerToken, ServiceError};

/// Resolves sessions and performs the role lookups behind `check_is_admin` /
/// `check_is_moderator`. Every check is a fresh remote lookup; the platform
/// enforces the same rules again on its side.
pub struct Permissions<B> {
    backend: Arc<B>,
}

impl<B> Clone for Permissions<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: RemoteBackend> Permissions<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn session(&self, token: &BearerToken) -> Result<Session, ServiceError> {
        self.backend
            .authenticate(&token.0)
            .await
            .map_err(|err| match err {
                BackendError::Unauthorized | BackendError::NotFound => {
                    ServiceError::Unauthenticated
                }
                other => ServiceError::Backend(other),
            })
    }

    pub async fn role_of(&self, session: &Session) -> Result<Option<AdminRole>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AdminUsers)
                    .eq("user_id", session.user_id)
                    .limit(1),
            )
            .await?;
        let admins: Vec<AdminUser> = decode_rows(Table::AdminUsers, rows)?;
        let role = admins.first().map(|admin| admin.role);
        debug!(user_id = %session.user_id, ?role, "role lookup");
        Ok(role)
    }

    pub async fn check_is_admin(&self, session: &Session) -> Result<bool, ServiceError> {
        Ok(self
            .role_of(session)
            .await?
            .map(AdminRole::is_admin)
            .unwrap_or(false))
    }

    pub async fn check_is_moderator(&self, session: &Session) -> Result<bool, ServiceError> {
        Ok(self
            .role_of(session)
            .await?
            .map(AdminRole::can_moderate)
            .unwrap_or(false))
    }

    pub async fn require_admin(&self, session: &Session) -> Result<(), ServiceError> {
        if self.check_is_admin(session).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("admin role required"))
        }
    }

    pub async fn require_moderator(&self, session: &Session) -> Result<(), ServiceError> {
        if self.check_is_moderator(session).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden("moderator role required"))
        }
    }
}
