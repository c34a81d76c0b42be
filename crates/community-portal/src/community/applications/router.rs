use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{Application, ApplicationData, ApplicationSeason, SeasonDraft, StatusUpdate};
use super::service::ApplicationService;
use crate::backend::RemoteBackend;
use crate::community::review::StatusFilter;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn application_router<B>(service: Arc<ApplicationService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_handler::<B>).post(submit_handler::<B>),
        )
        .route("/api/v1/applications/mine", get(mine_handler::<B>))
        .route(
            "/api/v1/applications/:id",
            delete(delete_handler::<B>),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(status_handler::<B>),
        )
        .route(
            "/api/v1/application-seasons",
            get(seasons_handler::<B>).post(create_season_handler::<B>),
        )
        .route(
            "/api/v1/application-seasons/active",
            get(active_season_handler::<B>),
        )
        .route(
            "/api/v1/application-seasons/:id/activate",
            post(activate_season_handler::<B>),
        )
        .route(
            "/api/v1/application-seasons/:id/close",
            post(close_season_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Json(data): Json<ApplicationData>,
) -> Result<(StatusCode, ActionResponse<Application>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let application = service.submit(&session, data).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("application submitted", application),
    ))
}

pub(crate) async fn list_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<Application>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.list_applications(&session, filter.status).await?))
}

pub(crate) async fn mine_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<Application>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.my_applications(&session).await?))
}

pub(crate) async fn status_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<ActionResponse<Application>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let application = service
        .update_application_status(&session, id, update)
        .await?;
    Ok(ActionResponse::with_message("application reviewed", application))
}

pub(crate) async fn delete_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.delete_application(&session, id).await?;
    Ok(ActionResponse::done("application deleted"))
}

pub(crate) async fn seasons_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
) -> Result<Json<Vec<ApplicationSeason>>, ServiceError> {
    Ok(Json(service.list_seasons().await?))
}

pub(crate) async fn active_season_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
) -> Result<Json<Option<ApplicationSeason>>, ServiceError> {
    Ok(Json(service.active_season().await?))
}

pub(crate) async fn create_season_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Json(draft): Json<SeasonDraft>,
) -> Result<(StatusCode, ActionResponse<ApplicationSeason>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let season = service.create_application_season(&session, draft).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("season opened", season),
    ))
}

pub(crate) async fn activate_season_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<ApplicationSeason>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let season = service.activate_season(&session, id).await?;
    Ok(ActionResponse::with_message("season activated", season))
}

pub(crate) async fn close_season_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ApplicationService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<ApplicationSeason>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let season = service.close_season(&session, id).await?;
    Ok(ActionResponse::with_message("season closed", season))
}
