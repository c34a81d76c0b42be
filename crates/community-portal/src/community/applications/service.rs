use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::domain::{
    Application, ApplicationData, ApplicationSeason, ApplicationStatus, NewApplication,
    SeasonDraft, StatusUpdate,
};
use crate::backend::{
    decode_row, decode_rows, encode_row, Filter, Query, RemoteBackend, Session, Table,
};
use crate::community::roles::Permissions;
use crate::community::validation::trimmed_opt;
use crate::community::{ServiceError, ValidationFailure};

const NOTIFICATION_FUNCTION: &str = "send-application-notification";

pub struct ApplicationService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
}

impl<B: RemoteBackend> ApplicationService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    /// Write a completed wizard draft as a pending application in the
    /// active season.
    pub async fn submit(
        &self,
        session: &Session,
        data: ApplicationData,
    ) -> Result<Application, ServiceError> {
        let data = data.normalized();
        data.check()?;
        if data.is_under12 {
            return Err(ValidationFailure::single(
                "age",
                "applicants must be at least 12 years old",
            )
            .into());
        }

        let season = self
            .active_season()
            .await?
            .ok_or_else(|| ServiceError::Conflict("applications are closed".to_string()))?;

        let pending = self
            .backend
            .select(
                Some(session),
                Query::from(Table::Applications)
                    .eq("user_id", session.user_id)
                    .eq("season_id", season.id)
                    .eq("status", ApplicationStatus::Pending)
                    .limit(1),
            )
            .await?;
        if !pending.is_empty() {
            return Err(ServiceError::Conflict(
                "you already have a pending application this season".to_string(),
            ));
        }

        let row = encode_row(
            Table::Applications,
            &NewApplication {
                user_id: session.user_id,
                season_id: season.id,
                basic: &data.basic,
                rules: &data.rules,
                situation: &data.situation,
                is_under12: data.is_under12,
                status: ApplicationStatus::Pending,
                updated_at: Utc::now(),
            },
        )?;
        let row = self.backend.insert(session, Table::Applications, row).await?;
        let application: Application = decode_row(Table::Applications, row)?;
        info!(id = %application.id, season = %season.name, "application submitted");

        if let Err(err) = self
            .backend
            .invoke(
                Some(session),
                NOTIFICATION_FUNCTION,
                json!({ "application_id": application.id }),
            )
            .await
        {
            warn!(id = %application.id, error = %err, "application notification failed");
        }
        Ok(application)
    }

    pub async fn my_applications(&self, session: &Session) -> Result<Vec<Application>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::Applications)
                    .eq("user_id", session.user_id)
                    .newest_first(),
            )
            .await?;
        Ok(decode_rows(Table::Applications, rows)?)
    }

    pub async fn list_applications(
        &self,
        session: &Session,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let mut query = Query::from(Table::Applications).newest_first();
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let rows = self.backend.select(Some(session), query).await?;
        Ok(decode_rows(Table::Applications, rows)?)
    }

    pub async fn update_application_status(
        &self,
        session: &Session,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<Application, ServiceError> {
        self.permissions.require_moderator(session).await?;
        if !update.status.is_final() {
            return Err(ValidationFailure::single(
                "status",
                "status must be approved or rejected",
            )
            .into());
        }

        let rows = self
            .backend
            .update(
                session,
                Table::Applications,
                vec![
                    Filter::eq("id", id),
                    Filter::eq("status", ApplicationStatus::Pending),
                ],
                json!({
                    "status": update.status,
                    "admin_notes": trimmed_opt(update.admin_notes),
                    "reviewed_by": session.user_id,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => {
                let application: Application = decode_row(Table::Applications, row)?;
                info!(%id, status = application.status.label(), "application reviewed");
                Ok(application)
            }
            None => {
                let existing = self
                    .backend
                    .select(
                        Some(session),
                        Query::from(Table::Applications).eq("id", id).limit(1),
                    )
                    .await?;
                match decode_rows::<Application>(Table::Applications, existing)?
                    .into_iter()
                    .next()
                {
                    None => Err(ServiceError::NotFound("application")),
                    Some(application) => Err(ServiceError::Conflict(format!(
                        "application was already {}",
                        application.status.label()
                    ))),
                }
            }
        }
    }

    pub async fn delete_application(&self, session: &Session, id: Uuid) -> Result<(), ServiceError> {
        self.permissions.require_admin(session).await?;
        let removed = self
            .backend
            .delete(session, Table::Applications, vec![Filter::eq("id", id)])
            .await?;
        if removed.is_empty() {
            return Err(ServiceError::NotFound("application"));
        }
        info!(%id, "application deleted");
        Ok(())
    }

    pub async fn list_seasons(&self) -> Result<Vec<ApplicationSeason>, ServiceError> {
        let rows = self
            .backend
            .select(None, Query::from(Table::ApplicationSeasons).newest_first())
            .await?;
        Ok(decode_rows(Table::ApplicationSeasons, rows)?)
    }

    pub async fn active_season(&self) -> Result<Option<ApplicationSeason>, ServiceError> {
        let rows = self
            .backend
            .select(
                None,
                Query::from(Table::ApplicationSeasons)
                    .eq("is_active", true)
                    .newest_first()
                    .limit(1),
            )
            .await?;
        Ok(decode_rows::<ApplicationSeason>(Table::ApplicationSeasons, rows)?
            .into_iter()
            .next())
    }

    /// Open a new season. Every other season is closed first so at most one
    /// is active.
    pub async fn create_application_season(
        &self,
        session: &Session,
        draft: SeasonDraft,
    ) -> Result<ApplicationSeason, ServiceError> {
        self.permissions.require_admin(session).await?;
        let draft = SeasonDraft {
            name: draft.name.trim().to_string(),
        };
        draft.validate().map_err(ValidationFailure::from)?;

        self.deactivate_all(session).await?;
        let row = self
            .backend
            .insert(
                session,
                Table::ApplicationSeasons,
                json!({ "name": draft.name, "is_active": true }),
            )
            .await?;
        let season: ApplicationSeason = decode_row(Table::ApplicationSeasons, row)?;
        info!(id = %season.id, name = %season.name, "application season opened");
        Ok(season)
    }

    pub async fn activate_season(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<ApplicationSeason, ServiceError> {
        self.permissions.require_admin(session).await?;
        let existing = self
            .backend
            .select(
                Some(session),
                Query::from(Table::ApplicationSeasons).eq("id", id).limit(1),
            )
            .await?;
        if existing.is_empty() {
            return Err(ServiceError::NotFound("season"));
        }

        self.deactivate_all(session).await?;
        let season = self.set_active(session, id, true).await?;
        info!(%id, "application season activated");
        Ok(season)
    }

    pub async fn close_season(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<ApplicationSeason, ServiceError> {
        self.permissions.require_admin(session).await?;
        let season = self.set_active(session, id, false).await?;
        info!(%id, "application season closed");
        Ok(season)
    }

    async fn deactivate_all(&self, session: &Session) -> Result<(), ServiceError> {
        self.backend
            .update(
                session,
                Table::ApplicationSeasons,
                vec![Filter::eq("is_active", true)],
                json!({ "is_active": false }),
            )
            .await?;
        Ok(())
    }

    async fn set_active(
        &self,
        session: &Session,
        id: Uuid,
        is_active: bool,
    ) -> Result<ApplicationSeason, ServiceError> {
        let rows = self
            .backend
            .update(
                session,
                Table::ApplicationSeasons,
                vec![Filter::eq("id", id)],
                json!({ "is_active": is_active }),
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("season"))?;
        Ok(decode_row(Table::ApplicationSeasons, row)?)
    }
}
