use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use super::domain::{
    Announcement, AnnouncementComment, AnnouncementDraft, CommentDraft, EmailQueueEntry,
};
use super::service::AnnouncementService;
use crate::backend::RemoteBackend;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn announcement_router<B>(service: Arc<AnnouncementService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/announcements",
            get(list_handler::<B>).post(create_handler::<B>),
        )
        .route("/api/v1/announcements/unread", get(unread_handler::<B>))
        .route("/api/v1/announcements/read-all", post(read_all_handler::<B>))
        .route(
            "/api/v1/announcements/email-queue",
            get(email_queue_handler::<B>),
        )
        .route(
            "/api/v1/announcements/email-queue/process",
            post(process_queue_handler::<B>),
        )
        .route(
            "/api/v1/announcements/:id",
            put(update_handler::<B>).delete(delete_handler::<B>),
        )
        .route("/api/v1/announcements/:id/read", post(mark_read_handler::<B>))
        .route(
            "/api/v1/announcements/:id/comments",
            get(list_comments_handler::<B>).post(add_comment_handler::<B>),
        )
        .route(
            "/api/v1/announcement-comments/:comment_id",
            delete(delete_comment_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
) -> Result<Json<Vec<Announcement>>, ServiceError> {
    Ok(Json(service.list_announcements(None).await?))
}

pub(crate) async fn create_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Json(draft): Json<AnnouncementDraft>,
) -> Result<(StatusCode, ActionResponse<Announcement>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let announcement = service.create_announcement(&session, draft).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("announcement created", announcement),
    ))
}

pub(crate) async fn update_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(draft): Json<AnnouncementDraft>,
) -> Result<ActionResponse<Announcement>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let announcement = service.update_announcement(&session, id, draft).await?;
    Ok(ActionResponse::with_message("announcement updated", announcement))
}

pub(crate) async fn delete_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.delete_announcement(&session, id).await?;
    Ok(ActionResponse::done("announcement deleted"))
}

pub(crate) async fn unread_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<Announcement>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(
        service.get_unread_server_wide_announcements(&session).await?,
    ))
}

pub(crate) async fn mark_read_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<Value>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let newly_marked = service.mark_announcement_as_read(&session, id).await?;
    Ok(ActionResponse::ok(json!({ "newly_marked": newly_marked })))
}

pub(crate) async fn read_all_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
) -> Result<ActionResponse<Value>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let marked = service.mark_all_as_read(&session).await?;
    Ok(ActionResponse::ok(json!({ "marked": marked })))
}

pub(crate) async fn list_comments_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AnnouncementComment>>, ServiceError> {
    Ok(Json(service.list_comments(None, id).await?))
}

pub(crate) async fn add_comment_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, ActionResponse<AnnouncementComment>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let comment = service.add_comment(&session, id, draft).await?;
    Ok((StatusCode::CREATED, ActionResponse::ok(comment)))
}

pub(crate) async fn delete_comment_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
    Path(comment_id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.delete_comment(&session, comment_id).await?;
    Ok(ActionResponse::done("comment deleted"))
}

pub(crate) async fn email_queue_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<EmailQueueEntry>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.email_queue(&session).await?))
}

pub(crate) async fn process_queue_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<AnnouncementService<B>>>,
    token: BearerToken,
) -> Result<ActionResponse<Value>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let result = service.process_email_queue(&session).await?;
    Ok(ActionResponse::with_message("email queue processed", result))
}
