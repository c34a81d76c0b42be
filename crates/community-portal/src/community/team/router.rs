use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{AbsenceRequest, TeamAbsence, TeamSettings, TeamSettingsPatch};
use super::service::TeamService;
use crate::backend::RemoteBackend;
use crate::community::review::{DecisionBody, StatusFilter};
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn team_router<B>(service: Arc<TeamService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/team/settings",
            get(settings_handler::<B>).put(update_settings_handler::<B>),
        )
        .route(
            "/api/v1/team/absences",
            get(list_absences_handler::<B>).post(request_absence_handler::<B>),
        )
        .route("/api/v1/team/absences/mine", get(my_absences_handler::<B>))
        .route(
            "/api/v1/team/absences/:id/review",
            post(review_absence_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn settings_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
) -> Result<Json<Option<TeamSettings>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.team_settings(&session).await?))
}

pub(crate) async fn update_settings_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
    Json(patch): Json<TeamSettingsPatch>,
) -> Result<ActionResponse<TeamSettings>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let settings = service.update_team_settings(&session, patch).await?;
    Ok(ActionResponse::with_message("team settings saved", settings))
}

pub(crate) async fn request_absence_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
    Json(request): Json<AbsenceRequest>,
) -> Result<(StatusCode, ActionResponse<TeamAbsence>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let absence = service.request_absence(&session, request).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("absence requested", absence),
    ))
}

pub(crate) async fn my_absences_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<TeamAbsence>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.my_absences(&session).await?))
}

pub(crate) async fn list_absences_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<TeamAbsence>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.list_absences(&session, filter.status).await?))
}

pub(crate) async fn review_absence_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<TeamService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<ActionResponse<TeamAbsence>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let absence = service.review_absence(&session, id, body.decision).await?;
    Ok(ActionResponse::with_message("absence reviewed", absence))
}
