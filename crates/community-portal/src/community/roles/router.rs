use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::domain::{AdminRole, AdminUser, AdminUserView, NewAdminUser, RoleSummary};
use super::service::RoleService;
use crate::backend::RemoteBackend;
use crate::community::{ActionResponse, BearerToken, ServiceError};

pub fn role_router<B>(service: Arc<RoleService<B>>) -> Router
where
    B: RemoteBackend + 'static,
{
    Router::new()
        .route("/api/v1/me/roles", get(my_roles_handler::<B>))
        .route(
            "/api/v1/admin/users",
            get(list_handler::<B>).post(add_handler::<B>),
        )
        .route(
            "/api/v1/admin/users/:user_id",
            patch(update_handler::<B>).delete(remove_handler::<B>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleUpdate {
    pub(crate) role: AdminRole,
}

pub(crate) async fn my_roles_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RoleService<B>>>,
    token: BearerToken,
) -> Result<Json<RoleSummary>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.my_roles(&session).await?))
}

pub(crate) async fn list_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RoleService<B>>>,
    token: BearerToken,
) -> Result<Json<Vec<AdminUserView>>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    Ok(Json(service.list_admin_users(&session).await?))
}

pub(crate) async fn add_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RoleService<B>>>,
    token: BearerToken,
    Json(request): Json<NewAdminUser>,
) -> Result<ActionResponse<AdminUser>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let admin = service.add_admin_user(&session, request).await?;
    Ok(ActionResponse::with_message("team role granted", admin))
}

pub(crate) async fn update_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RoleService<B>>>,
    token: BearerToken,
    Path(user_id): Path<Uuid>,
    Json(update): Json<RoleUpdate>,
) -> Result<ActionResponse<AdminUser>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    let admin = service
        .update_admin_role(&session, user_id, update.role)
        .await?;
    Ok(ActionResponse::with_message("team role updated", admin))
}

pub(crate) async fn remove_handler<B: RemoteBackend + 'static>(
    State(service): State<Arc<RoleService<B>>>,
    token: BearerToken,
    Path(user_id): Path<Uuid>,
) -> Result<ActionResponse<()>, ServiceError> {
    let session = service.permissions().session(&token).await?;
    service.remove_admin_user(&session, user_id).await?;
    Ok(ActionResponse::done("team role revoked"))
}
