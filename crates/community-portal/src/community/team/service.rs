use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::domain::{AbsenceRequest, AbsenceStatus, TeamAbsence, TeamSettings, TeamSettingsPatch};
use crate::backend::{
    decode_row, decode_rows, encode_row, Filter, Query, RemoteBackend, Session, Table,
};
use crate::cache::SlotCache;
use crate::community::review::Decision;
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};
use crate::config::PortalConfig;

pub struct TeamService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
    settings: SlotCache<Option<TeamSettings>>,
}

impl<B: RemoteBackend> TeamService<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
            settings: SlotCache::new(config.cache_ttl),
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn team_settings(
        &self,
        session: &Session,
    ) -> Result<Option<TeamSettings>, ServiceError> {
        self.permissions.require_moderator(session).await?;
        if let Some(cached) = self.settings.get(&()) {
            return Ok(cached);
        }

        let settings = self.load_settings(session).await?;
        self.settings.insert((), settings.clone());
        Ok(settings)
    }

    async fn load_settings(&self, session: &Session) -> Result<Option<TeamSettings>, ServiceError> {
        let rows = self
            .backend
            .select(Some(session), Query::from(Table::TeamSettings).limit(1))
            .await?;
        Ok(decode_rows::<TeamSettings>(Table::TeamSettings, rows)?
            .into_iter()
            .next())
    }

    /// Update the settings row, creating it on first use.
    pub async fn update_team_settings(
        &self,
        session: &Session,
        patch: TeamSettingsPatch,
    ) -> Result<TeamSettings, ServiceError> {
        self.permissions.require_admin(session).await?;
        patch.validate().map_err(ValidationFailure::from)?;

        let mut row = encode_row(Table::TeamSettings, &patch)?;
        row["updated_at"] = json!(Utc::now());

        let saved = match self.load_settings(session).await? {
            Some(existing) => self
                .backend
                .update(
                    session,
                    Table::TeamSettings,
                    vec![Filter::eq("id", existing.id)],
                    row,
                )
                .await?
                .into_iter()
                .next()
                .ok_or(ServiceError::NotFound("team settings"))?,
            None => self.backend.insert(session, Table::TeamSettings, row).await?,
        };
        self.settings.invalidate_all();
        info!(user_id = %session.user_id, "team settings updated");
        Ok(decode_row(Table::TeamSettings, saved)?)
    }

    pub async fn request_absence(
        &self,
        session: &Session,
        request: AbsenceRequest,
    ) -> Result<TeamAbsence, ServiceError> {
        if !self.permissions.check_is_moderator(session).await? {
            return Err(ServiceError::Forbidden("only team members can request absences"));
        }
        let request = AbsenceRequest {
            reason: request.reason.trim().to_string(),
            ..request
        };
        request.validate().map_err(ValidationFailure::from)?;
        if request.end_date < request.start_date {
            return Err(ValidationFailure::single(
                "end_date",
                "end date must not be before the start date",
            )
            .into());
        }

        let row = self
            .backend
            .insert(
                session,
                Table::TeamAbsences,
                json!({
                    "user_id": session.user_id,
                    "start_date": request.start_date,
                    "end_date": request.end_date,
                    "reason": request.reason,
                    "status": AbsenceStatus::Pending,
                }),
            )
            .await?;
        let absence: TeamAbsence = decode_row(Table::TeamAbsences, row)?;
        info!(id = %absence.id, days = request.days(), "absence requested");
        Ok(absence)
    }

    pub async fn my_absences(&self, session: &Session) -> Result<Vec<TeamAbsence>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::TeamAbsences)
                    .eq("user_id", session.user_id)
                    .newest_first(),
            )
            .await?;
        Ok(decode_rows(Table::TeamAbsences, rows)?)
    }

    pub async fn list_absences(
        &self,
        session: &Session,
        status: Option<AbsenceStatus>,
    ) -> Result<Vec<TeamAbsence>, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let mut query = Query::from(Table::TeamAbsences).newest_first();
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let rows = self.backend.select(Some(session), query).await?;
        Ok(decode_rows(Table::TeamAbsences, rows)?)
    }

    /// Approve or reject a pending absence. Reviewed absences are final.
    pub async fn review_absence(
        &self,
        session: &Session,
        id: Uuid,
        decision: Decision,
    ) -> Result<TeamAbsence, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::TeamAbsences).eq("id", id).limit(1),
            )
            .await?;
        let absence = decode_rows::<TeamAbsence>(Table::TeamAbsences, rows)?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("absence"))?;
        if absence.status.is_final() {
            return Err(ServiceError::Conflict(format!(
                "absence was already {}",
                absence.status.label()
            )));
        }

        let rows = self
            .backend
            .update(
                session,
                Table::TeamAbsences,
                vec![
                    Filter::eq("id", id),
                    Filter::eq("status", AbsenceStatus::Pending),
                ],
                json!({
                    "status": decision.outcome(),
                    "reviewed_by": session.user_id,
                }),
            )
            .await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            ServiceError::Conflict("absence was reviewed concurrently".to_string())
        })?;
        let absence: TeamAbsence = decode_row(Table::TeamAbsences, row)?;
        info!(%id, status = absence.status.label(), "absence reviewed");
        Ok(absence)
    }
}
