use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::domain::{Profile, ProfilePatch, AVATAR_BUCKET, AVATAR_MAX_BYTES};
use crate::backend::{
    decode_row, decode_rows, encode_row, Filter, Query, RemoteBackend, Session, StorageObject,
    Table,
};
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};

pub struct ProfileService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
}

impl<B: RemoteBackend> ProfileService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn get_profile(&self, session: &Session) -> Result<Option<Profile>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::Profiles).eq("id", session.user_id).limit(1),
            )
            .await?;
        Ok(decode_rows::<Profile>(Table::Profiles, rows)?
            .into_iter()
            .next())
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        patch: ProfilePatch,
    ) -> Result<Profile, ServiceError> {
        let patch = patch.normalized();
        patch.validate().map_err(ValidationFailure::from)?;
        if patch.is_empty() {
            return Err(ValidationFailure::single("profile", "nothing to update").into());
        }

        if let Some(username) = &patch.username {
            let taken = self
                .backend
                .select(
                    Some(session),
                    Query::from(Table::Profiles)
                        .eq("username", username)
                        .filter(Filter::neq("id", session.user_id))
                        .limit(1),
                )
                .await?;
            if !taken.is_empty() {
                return Err(ServiceError::Conflict("username is already taken".to_string()));
            }
        }

        let mut row = encode_row(Table::Profiles, &patch)?;
        row["updated_at"] = json!(Utc::now());
        let profile = self.upsert(session, row).await?;
        info!(user_id = %session.user_id, "profile updated");
        Ok(profile)
    }

    /// Store an avatar image and point both the auth metadata and the
    /// profile row at its public URL.
    pub async fn upload_avatar(
        &self,
        session: &Session,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Profile, ServiceError> {
        let content_type = mime_guess::from_path(file_name)
            .first()
            .filter(|mime| mime.type_() == mime::IMAGE)
            .ok_or_else(|| ValidationFailure::single("avatar", "avatar must be an image file"))?;
        if bytes.is_empty() {
            return Err(ValidationFailure::single("avatar", "avatar file is empty").into());
        }
        if bytes.len() > AVATAR_MAX_BYTES {
            return Err(ValidationFailure::single("avatar", "avatar must be at most 2 MiB").into());
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| content_type.subtype().as_str().to_string());
        let object = StorageObject {
            bucket: AVATAR_BUCKET,
            path: format!("{}/{}.{extension}", session.user_id, Uuid::new_v4()),
            content_type: content_type.essence_str().to_string(),
            bytes,
        };
        let size = object.bytes.len();
        let url = self.backend.upload(session, object).await?;

        self.backend
            .update_user_metadata(session, json!({ "avatar_url": url }))
            .await?;
        let profile = self
            .upsert(
                session,
                json!({ "avatar_url": url, "updated_at": Utc::now() }),
            )
            .await?;
        info!(user_id = %session.user_id, size, "avatar uploaded");
        Ok(profile)
    }

    async fn upsert(&self, session: &Session, mut row: Value) -> Result<Profile, ServiceError> {
        let updated = self
            .backend
            .update(
                session,
                Table::Profiles,
                vec![Filter::eq("id", session.user_id)],
                row.clone(),
            )
            .await?;
        let saved = match updated.into_iter().next() {
            Some(row) => row,
            None => {
                row["id"] = json!(session.user_id);
                self.backend.insert(session, Table::Profiles, row).await?
            }
        };
        Ok(decode_row(Table::Profiles, saved)?)
    }
}
