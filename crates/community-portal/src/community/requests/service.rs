use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::domain::{
    AccountDeletionRequest, DeletionForm, IdChangeForm, IdChangeRequest, MyRequests,
    RequestStatus,
};
use crate::backend::{decode_row, decode_rows, Filter, Query, RemoteBackend, Session, Table};
use crate::community::review::Decision;
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};

pub struct RequestService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
}

impl<B: RemoteBackend> RequestService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    async fn ensure_none_pending(
        &self,
        session: &Session,
        table: Table,
        what: &str,
    ) -> Result<(), ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(table)
                    .eq("user_id", session.user_id)
                    .eq("status", RequestStatus::Pending)
                    .limit(1),
            )
            .await?;
        if rows.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Conflict(format!(
                "you already have a pending {what} request"
            )))
        }
    }

    pub async fn request_account_deletion(
        &self,
        session: &Session,
        form: DeletionForm,
    ) -> Result<AccountDeletionRequest, ServiceError> {
        let form = form.normalized();
        form.validate().map_err(ValidationFailure::from)?;
        self.ensure_none_pending(session, Table::AccountDeletionRequests, "account deletion")
            .await?;

        let row = self
            .backend
            .insert(
                session,
                Table::AccountDeletionRequests,
                json!({
                    "user_id": session.user_id,
                    "reason": form.reason,
                    "status": RequestStatus::Pending,
                }),
            )
            .await?;
        let request: AccountDeletionRequest = decode_row(Table::AccountDeletionRequests, row)?;
        info!(id = %request.id, "account deletion requested");
        Ok(request)
    }

    pub async fn request_id_change(
        &self,
        session: &Session,
        form: IdChangeForm,
    ) -> Result<IdChangeRequest, ServiceError> {
        let form = form.normalized();
        form.validate().map_err(ValidationFailure::from)?;
        if form.current_id == form.requested_id {
            return Err(ValidationFailure::single(
                "requested_id",
                "the new ID must differ from the current one",
            )
            .into());
        }
        self.ensure_none_pending(session, Table::IdChangeRequests, "ID change")
            .await?;

        let row = self
            .backend
            .insert(
                session,
                Table::IdChangeRequests,
                json!({
                    "user_id": session.user_id,
                    "id_kind": form.id_kind,
                    "current_id": form.current_id,
                    "requested_id": form.requested_id,
                    "reason": form.reason,
                    "status": RequestStatus::Pending,
                }),
            )
            .await?;
        let request: IdChangeRequest = decode_row(Table::IdChangeRequests, row)?;
        info!(id = %request.id, kind = ?request.id_kind, "ID change requested");
        Ok(request)
    }

    pub async fn my_requests(&self, session: &Session) -> Result<MyRequests, ServiceError> {
        let deletion = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AccountDeletionRequests)
                    .eq("user_id", session.user_id)
                    .newest_first(),
            )
            .await?;
        let id_changes = self
            .backend
            .select(
                Some(session),
                Query::from(Table::IdChangeRequests)
                    .eq("user_id", session.user_id)
                    .newest_first(),
            )
            .await?;
        Ok(MyRequests {
            deletion: decode_rows(Table::AccountDeletionRequests, deletion)?,
            id_changes: decode_rows(Table::IdChangeRequests, id_changes)?,
        })
    }

    pub async fn list_deletion_requests(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> Result<Vec<AccountDeletionRequest>, ServiceError> {
        self.list(session, Table::AccountDeletionRequests, status).await
    }

    pub async fn list_id_change_requests(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> Result<Vec<IdChangeRequest>, ServiceError> {
        self.list(session, Table::IdChangeRequests, status).await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: Table,
        status: Option<RequestStatus>,
    ) -> Result<Vec<T>, ServiceError> {
        self.permissions.require_admin(session).await?;
        let mut query = Query::from(table).newest_first();
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        let rows = self.backend.select(Some(session), query).await?;
        Ok(decode_rows(table, rows)?)
    }

    pub async fn process_deletion_request(
        &self,
        session: &Session,
        id: Uuid,
        decision: Decision,
    ) -> Result<AccountDeletionRequest, ServiceError> {
        let row = self
            .process(session, Table::AccountDeletionRequests, id, decision)
            .await?;
        Ok(decode_row(Table::AccountDeletionRequests, row)?)
    }

    pub async fn process_id_change_request(
        &self,
        session: &Session,
        id: Uuid,
        decision: Decision,
    ) -> Result<IdChangeRequest, ServiceError> {
        let row = self
            .process(session, Table::IdChangeRequests, id, decision)
            .await?;
        Ok(decode_row(Table::IdChangeRequests, row)?)
    }

    /// Move a pending request to its final state. Processed requests are
    /// never touched again.
    async fn process(
        &self,
        session: &Session,
        table: Table,
        id: Uuid,
        decision: Decision,
    ) -> Result<Value, ServiceError> {
        self.permissions.require_admin(session).await?;
        let rows = self
            .backend
            .update(
                session,
                table,
                vec![
                    Filter::eq("id", id),
                    Filter::eq("status", RequestStatus::Pending),
                ],
                json!({
                    "status": decision.outcome(),
                    "processed_at": Utc::now(),
                    "processed_by": session.user_id,
                }),
            )
            .await?;
        if let Some(row) = rows.into_iter().next() {
            info!(%table, %id, status = decision.outcome().label(), "request processed");
            return Ok(row);
        }

        let existing = self
            .backend
            .select(Some(session), Query::from(table).eq("id", id).limit(1))
            .await?;
        if existing.is_empty() {
            Err(ServiceError::NotFound("request"))
        } else {
            Err(ServiceError::Conflict(
                "request was already processed".to_string(),
            ))
        }
    }
}
