use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use uuid::Uuid;

use super::domain::{NewsDraft, NewsItem};
use super::service::NewsService;
use crate::backend::RemoteBackend;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn news_router<B>(service: Arc<NewsService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/news",
            get(list_handler::<B>).post(create_handler::<B>),
        )
        .route(
            "/api/v1/news/:id",
            put(update_handler::<B>).delete(delete_handler::<B>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<NewsService<B>>>,
) -> Result<Json<Vec<NewsItem>>, ServiceError> {
    Ok(Json(service.fetch_news().await?))
}

pub(crate) async fn create_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<NewsService<B>>>,
    token: BearerToken,
    Json(draft): Json<NewsDraft>,
) -> Result<(StatusCode, ActionResponse<NewsItem>), ServiceError> {
    let session = service.permissions().session(&token).await?;
    let item = service.create_news(&session, draft).await?;
    Ok((
        StatusCode::CREATED,
        ActionResponse::with_message("news published", item),
    ))
}

pub(crate) async fn update_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<NewsService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
    Json(draft): Json<NewsDraft>,
) -> Result<ActionResponse<NewsItem>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let item = service.update_news(&session, id, draft).await?;
    Ok(ActionResponse::with_message("news updated", item))
}

pub(crate) async fn delete_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<NewsService<B>>>,
    token: BearerToken,
    Path(id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.delete_news(&session, id).await?;
    Ok(ActionResponse::done("news deleted"))
}
