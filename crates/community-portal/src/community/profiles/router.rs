use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::domain::{Profile, ProfilePatch, AVATAR_MAX_BYTES};
use super::service::ProfileService;
use crate::backend::RemoteBackend;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn profile_router<B>(service: Arc<ProfileService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/profile",
            get(get_handler::<B>).patch(update_handler::<B>),
        )
        .route(
            "/api/v1/profile/avatar",
            // headroom so oversized files reach the size check instead of a bare 413
            post(avatar_handler::<B>).layer(DefaultBodyLimit::max(AVATAR_MAX_BYTES + 64 * 1024)),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvatarParams {
    pub(crate) file_name: String,
}

pub(crate) async fn get_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ProfileService<B>>>,
    token: BearerToken,
) -> Result<Json<Option<Profile>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.get_profile(&session).await?))
}

pub(crate) async fn update_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ProfileService<B>>>,
    token: BearerToken,
    Json(patch): Json<ProfilePatch>,
) -> Result<ActionResponse<Profile>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let profile = service.update_profile(&session, patch).await?;
    Ok(ActionResponse::with_message("profile updated", profile))
}

/// Raw image body with `?file_name=` naming the original file.
pub(crate) async fn avatar_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<ProfileService<B>>>,
    token: BearerToken,
    Query(params): Query<AvatarParams>,
    body: Bytes,
) -> Result<ActionResponse<Profile>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let profile = service
        .upload_avatar(&session, &params.file_name, body.to_vec())
        .await?;
    Ok(ActionResponse::with_message("avatar updated", profile))
}
