use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::domain::{ServerStats, SiteSetting, StoreItem};
use super::service::SiteService;
use crate::backend::RemoteBackend;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn site_router<B>(service: Arc<SiteService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/settings/:key",
            get(setting_handler::<B>).put(update_setting_handler::<B>),
        )
        .route("/api/v1/store/items", get(store_items_handler::<B>))
        .route("/api/v1/stats", get(stats_handler::<B>))
        .with_state(service)
}

pub(crate) async fn setting_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<SiteService<B>>>,
    Path(key): Path<String>,
) -> Result<Json<SiteSetting>, ServiceError> {
    service
        .get_setting(&key)
        .await?
        .map(Json)
        .ok_or(ServiceError::NotFound("setting"))
}

pub(crate) async fn update_setting_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<SiteService<B>>>,
    token: BearerToken,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<ActionResponse<SiteSetting>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let setting = service.update_setting(&session, &key, value).await?;
    Ok(ActionResponse::with_message("setting saved", setting))
}

pub(crate) async fn store_items_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<SiteService<B>>>,
) -> Result<Json<Vec<StoreItem>>, ServiceError> {
    Ok(Json(service.store_items().await?))
}

pub(crate) async fn stats_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<SiteService<B>>>,
) -> Result<Json<Option<ServerStats>>, ServiceError> {
    Ok(Json(service.server_stats().await?))
}
