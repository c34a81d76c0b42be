use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{
    AccountDeletionRequest, DeletionForm, IdChangeForm, IdChangeRequest, MyRequests,
};
use super::service::RequestService;
use crate::backend::RemoteBackend;
use crate::community::review::{DecisionBody, StatusFilter};
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn request_router<B>(service: Arc<RequestService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route("/api/v1/requests/mine", get(mine_handler::<B>))
        .route(
            "/api/v1/requests/account-deletion",
            get(list_deletion_handler::<B>).post(request_deletion_handler::<B>),
        )
        .route(
            "/api/v1/requests/account-deletion/:id/process",
            post(process_deletion_handler::<B>),
        )
        .route(
            "/api/v1/requests/id-change",
            get(list_id_change_handler::<B>).post(request_id_change_handler::<B>),
        )
        .route(
            "/api/v1/requests/id-change/:id/process",
            post(process_id_change_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn mine_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
) -> Result<Json<MyRequests>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.my_requests(&session).await?))
}

pub(crate) async fn request_deletion_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Json(form): Json<DeletionForm>,
) -> Result<(StatusCode, ActionResponse<AccountDeletionRequest>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let request = service.request_account_deletion(&session, form).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("account deletion requested", request),
    ))
}

pub(crate) async fn list_deletion_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<AccountDeletionRequest>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(
        service.list_deletion_requests(&session, filter.status).await?,
    ))
}

pub(crate) async fn process_deletion_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<ActionResponse<AccountDeletionRequest>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let request = service
        .process_deletion_request(&session, id, body.decision)
        .await?;
    Ok(ActionResponse::with_message("request processed", request))
}

pub(crate) async fn request_id_change_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Json(form): Json<IdChangeForm>,
) -> Result<(StatusCode, ActionResponse<IdChangeRequest>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let request = service.request_id_change(&session, form).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("ID change requested", request),
    ))
}

pub(crate) async fn list_id_change_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<IdChangeRequest>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(
        service
            .list_id_change_requests(&session, filter.status)
            .await?,
    ))
}

pub(crate) async fn process_id_change_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RequestService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<ActionResponse<IdChangeRequest>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let request = service
        .process_id_change_request(&session, id, body.decision)
        .await?;
    Ok(ActionResponse::with_message("request processed", request))
}
