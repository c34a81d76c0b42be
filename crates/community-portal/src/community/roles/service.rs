use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{AdminRole, AdminUser, AdminUserView, AuthUserEntry, NewAdminUser, RoleSummary};
use super::permissions::Permissions;
use crate::backend::{
    decode_row, decode_rows, BackendError, Filter, Query, RemoteBackend, Session, Table,
};
use crate::cache::SlotCache;
use crate::community::{ServiceError, ValidationFailure};
use crate::config::PortalConfig;

/// Management of the `admin_users` table.
pub struct RoleService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
    admins: SlotCache<Vec<AdminUserView>>,
}

impl<B: RemoteBackend> RoleService<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
            admins: SlotCache::new(config.cache_ttl),
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn my_roles(&self, session: &Session) -> Result<RoleSummary, ServiceError> {
        let role = self.permissions.role_of(session).await?;
        Ok(RoleSummary {
            is_admin: role.map(AdminRole::is_admin).unwrap_or(false),
            is_moderator: role.map(AdminRole::can_moderate).unwrap_or(false),
        })
    }

    /// List team roles with their auth emails. The email lookup is best-effort:
    /// when it fails the listing is still returned, without emails.
    pub async fn list_admin_users(
        &self,
        session: &Session,
    ) -> Result<Vec<AdminUserView>, ServiceError> {
        self.permissions.require_admin(session).await?;

        if let Some(cached) = self.admins.get(&()) {
            return Ok(cached);
        }

        let rows = self
            .backend
            .select(Some(session), Query::from(Table::AdminUsers).newest_first())
            .await?;
        let admins: Vec<AdminUser> = decode_rows(Table::AdminUsers, rows)?;
        let emails = self.lookup_emails(session, &admins).await;

        let views: Vec<AdminUserView> = admins
            .into_iter()
            .map(|admin| AdminUserView {
                email: emails.get(&admin.user_id).cloned(),
                user_id: admin.user_id,
                role: admin.role,
                created_at: admin.created_at,
            })
            .collect();

        self.admins.insert((), views.clone());
        Ok(views)
    }

    async fn lookup_emails(&self, session: &Session, admins: &[AdminUser]) -> HashMap<Uuid, String> {
        if admins.is_empty() {
            return HashMap::new();
        }

        let ids: Vec<Uuid> = admins.iter().map(|admin| admin.user_id).collect();
        let result = self
            .backend
            .rpc(session, "get_users_by_ids", json!({ "user_ids": ids }))
            .await
            .and_then(|value| {
                serde_json::from_value::<Vec<AuthUserEntry>>(value).map_err(|source| {
                    BackendError::Schema {
                        table: Table::AdminUsers,
                        source,
                    }
                })
            });

        match result {
            Ok(users) => users
                .into_iter()
                .filter_map(|user| user.email.map(|email| (user.id, email)))
                .collect(),
            Err(err) => {
                warn!(error = %err, "admin email enrichment failed; continuing without emails");
                HashMap::new()
            }
        }
    }

    pub async fn add_admin_user(
        &self,
        session: &Session,
        request: NewAdminUser,
    ) -> Result<AdminUser, ServiceError> {
        self.permissions.require_admin(session).await?;

        let email = request.email.trim().to_ascii_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationFailure::single("email", "a valid email address is required").into());
        }

        let found = self
            .backend
            .rpc(session, "find_users_by_email", json!({ "email": email }))
            .await?;
        let users: Vec<AuthUserEntry> = serde_json::from_value(found).map_err(|source| {
            BackendError::Schema {
                table: Table::AdminUsers,
                source,
            }
        })?;
        let user = users.into_iter().next().ok_or(ServiceError::NotFound("user"))?;

        let existing = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AdminUsers).eq("user_id", user.id).limit(1),
            )
            .await?;
        if !existing.is_empty() {
            return Err(ServiceError::Conflict(
                "user already has a team role".to_string(),
            ));
        }

        let row = self
            .backend
            .insert(
                session,
                Table::AdminUsers,
                json!({
                    "user_id": user.id,
                    "role": request.role,
                }),
            )
            .await?;
        self.admins.invalidate_all();
        info!(user_id = %user.id, role = request.role.label(), "team role granted");
        Ok(decode_row(Table::AdminUsers, row)?)
    }

    pub async fn update_admin_role(
        &self,
        session: &Session,
        user_id: Uuid,
        role: AdminRole,
    ) -> Result<AdminUser, ServiceError> {
        self.permissions.require_admin(session).await?;
        if user_id == session.user_id && role != AdminRole::Admin {
            return Err(ServiceError::Conflict(
                "you cannot demote your own role".to_string(),
            ));
        }

        let rows = self
            .backend
            .update(
                session,
                Table::AdminUsers,
                vec![Filter::eq("user_id", user_id)],
                json!({ "role": role }),
            )
            .await?;
        self.admins.invalidate_all();
        let row = rows.into_iter().next().ok_or(ServiceError::NotFound("admin user"))?;
        info!(%user_id, role = role.label(), "team role changed");
        Ok(decode_row(Table::AdminUsers, row)?)
    }

    pub async fn remove_admin_user(
        &self,
        session: &Session,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.permissions.require_admin(session).await?;
        if user_id == session.user_id {
            return Err(ServiceError::Conflict(
                "you cannot remove your own role".to_string(),
            ));
        }

        let removed = self
            .backend
            .delete(session, Table::AdminUsers, vec![Filter::eq("user_id", user_id)])
            .await?;
        self.admins.invalidate_all();
        if removed.is_empty() {
            return Err(ServiceError::NotFound("admin user"));
        }
        info!(%user_id, "team role revoked");
        Ok(())
    }
}
