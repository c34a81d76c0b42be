use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{PartnerApplication, PartnerForm};
use super::service::PartnershipService;
use crate::backend::RemoteBackend;
use crate::community::review::{DecisionBody, StatusFilter};
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn partnership_router<B>(service: Arc<PartnershipService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/partners",
            get(list_handler::<B>).post(submit_handler::<B>),
        )
        .route("/api/v1/partners/mine", get(mine_handler::<B>))
        .route("/api/v1/partners/:id", delete(delete_handler::<B>))
        .route("/api/v1/partners/:id/review", post(review_handler::<B>))
        .with_state(service)
}

pub(crate) async fn submit_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<PartnershipService<B>>>,
    token: BearerToken,
    Json(form): Json<PartnerForm>,
) -> Result<(StatusCode, ActionResponse<PartnerApplication>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let application = service.submit_partner_application(&session, form).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("partner application submitted", application),
    ))
}

pub(crate) async fn mine_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<PartnershipService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<PartnerApplication>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.my_partner_applications(&session).await?))
}

pub(crate) async fn list_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<PartnershipService<B>>>,
    token: BearerToken,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<PartnerApplication>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(
        service
            .list_partner_applications(&session, filter.status)
            .await?,
    ))
}

pub(crate) async fn review_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<PartnershipService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<ActionResponse<PartnerApplication>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let application = service
        .update_partner_status(&session, id, body.decision)
        .await?;
    Ok(ActionResponse::with_message("partner application reviewed", application))
}

pub(crate) async fn delete_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<PartnershipService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.delete_partner_application(&session, id).await?;
    Ok(ActionResponse::done("partner application deleted"))
}
