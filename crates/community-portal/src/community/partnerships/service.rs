use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::domain::{PartnerApplication, PartnerForm, PartnerStatus};
use crate::backend::{decode_row, decode_rows, Filter, Query, RemoteBackend, Session, Table};
use crate::community::review::Decision;
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};

pub struct PartnershipService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
}

impl<B: RemoteBackend> PartnershipService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn submit_partner_application(
        &self,
        session: &Session,
        form: PartnerForm,
    ) -> Result<PartnerApplication, ServiceError> {
        let form = form.normalized();
        form.validate().map_err(ValidationFailure::from)?;

        let row = self
            .backend
            .insert(
                session,
                Table::PartnerApplications,
                json!({
                    "user_id": session.user_id,
                    "server_name": form.server_name,
                    "discord_invite": form.discord_invite,
                    "owner_discord_id": form.owner_discord_id,
                    "member_count": form.member_count,
                    "description": form.description,
                    "status": PartnerStatus::Pending,
                }),
            )
            .await?;
        let application: PartnerApplication = decode_row(Table::PartnerApplications, row)?;
        info!(id = %application.id, server = %application.server_name, "partner application submitted");
        Ok(application)
    }

    pub async fn my_partner_applications(
        &self,
        session: &Session,
    ) -> Result<Vec<PartnerApplication>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::PartnerApplications)
                    .eq("user_id", session.user_id)
                    .newest_first(),
            )
            .await?;
        Ok(decode_rows(Table::PartnerApplications, rows)?)
    }

    pub async fn list_partner_applications(
        &self,
        session: &Session,
        status: Option<PartnerStatus>,
    ) -> Result<Vec<PartnerApplication>, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let mut query = Query::from(Table::PartnerApplications).newest_first();
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let rows = self.backend.select(Some(session), query).await?;
        Ok(decode_rows(Table::PartnerApplications, rows)?)
    }

    pub async fn update_partner_status(
        &self,
        session: &Session,
        id: Uuid,
        decision: Decision,
    ) -> Result<PartnerApplication, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let rows = self
            .backend
            .update(
                session,
                Table::PartnerApplications,
                vec![
                    Filter::eq("id", id),
                    Filter::eq("status", PartnerStatus::Pending),
                ],
                json!({
                    "status": decision.outcome(),
                    "reviewed_by": session.user_id,
                }),
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => {
                let application: PartnerApplication = decode_row(Table::PartnerApplications, row)?;
                info!(%id, status = application.status.label(), "partner application reviewed");
                Ok(application)
            }
            None => {
                let existing = self
                    .backend
                    .select(
                        Some(session),
                        Query::from(Table::PartnerApplications).eq("id", id).limit(1),
                    )
                    .await?;
                if existing.is_empty() {
                    Err(ServiceError::NotFound("partner application"))
                } else {
                    Err(ServiceError::Conflict(
                        "partner application was already reviewed".to_string(),
                    ))
                }
            }
        }
    }

    pub async fn delete_partner_application(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        self.permissions.require_admin(session).await?;
        let removed = self
            .backend
            .delete(session, Table::PartnerApplications, vec![Filter::eq("id", id)])
            .await?;
        if removed.is_empty() {
            return Err(ServiceError::NotFound("partner application"));
        }
        info!(%id, "partner application deleted");
        Ok(())
    }
}
