//! HTTP client for the hosted platform's REST, RPC, functions, and storage APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BackendError, Direction, Filter, Query, RemoteBackend, Session, StorageObject, Table};

#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    email: Option<String>,
}

impl RestBackend {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorized(&self, builder: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        let token = session
            .map(|session| session.access_token.as_str())
            .unwrap_or(self.anon_key.as_str());
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, %body, "backend request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            StatusCode::NOT_FOUND => BackendError::NotFound,
            StatusCode::CONFLICT => BackendError::Conflict,
            other => BackendError::Remote {
                status: other.as_u16(),
                body,
            },
        })
    }

    async fn json_rows(&self, builder: RequestBuilder) -> Result<Vec<Value>, BackendError> {
        let response = self.send(builder).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }
}

/// Encode filters, ordering, and limits as PostgREST query parameters.
pub(crate) fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { column, value } => (column.to_string(), format!("eq.{}", literal(value))),
            Filter::Neq { column, value } => {
                (column.to_string(), format!("neq.{}", literal(value)))
            }
            Filter::In { column, values } => {
                let joined = values.iter().map(literal).collect::<Vec<_>>().join(",");
                (column.to_string(), format!("in.({joined})"))
            }
        })
        .collect()
}

pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn authenticate(&self, access_token: &str) -> Result<Session, BackendError> {
        let request = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        let user: AuthUser = self.send(request).await?.json().await?;
        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token: access_token.to_string(),
        })
    }

    async fn select(
        &self,
        session: Option<&Session>,
        query: Query,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(table = %query.table, "select");
        let request = self
            .client
            .get(self.table_url(query.table))
            .query(&query_params(&query));
        self.json_rows(self.authorized(request, session)).await
    }

    async fn insert(
        &self,
        session: &Session,
        table: Table,
        row: Value,
    ) -> Result<Value, BackendError> {
        debug!(%table, "insert");
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row);
        let rows = self.json_rows(self.authorized(request, Some(session))).await?;
        rows.into_iter().next().ok_or(BackendError::Remote {
            status: 201,
            body: format!("insert into {table} returned no row"),
        })
    }

    async fn update(
        &self,
        session: &Session,
        table: Table,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(%table, "update");
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&filter_params(&filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        self.json_rows(self.authorized(request, Some(session))).await
    }

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: Vec<Filter>,
    ) -> Result<Vec<Value>, BackendError> {
        debug!(%table, "delete");
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&filter_params(&filters))
            .header("Prefer", "return=representation");
        self.json_rows(self.authorized(request, Some(session))).await
    }

    async fn rpc(
        &self,
        session: &Session,
        function: &str,
        args: Value,
    ) -> Result<Value, BackendError> {
        let request = self
            .client
            .post(format!("{}/rest/v1/rpc/{function}", self.base_url))
            .json(&args);
        let response = self.send(self.authorized(request, Some(session))).await?;
        Ok(response.json().await?)
    }

    async fn invoke(
        &self,
        session: Option<&Session>,
        function: &str,
        body: Value,
    ) -> Result<Value, BackendError> {
        let request = self
            .client
            .post(format!("{}/functions/v1/{function}", self.base_url))
            .json(&body);
        let response = self.send(self.authorized(request, session)).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(json!({ "success": true }));
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn upload(
        &self,
        session: &Session,
        object: StorageObject,
    ) -> Result<String, BackendError> {
        let request = self
            .client
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, object.bucket, object.path
            ))
            .header("Content-Type", object.content_type)
            .header("x-upsert", "true")
            .body(object.bytes);
        self.send(self.authorized(request, Some(session))).await?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, object.bucket, object.path
        ))
    }

    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: Value,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .put(format!("{}/auth/v1/user", self.base_url))
            .json(&json!({ "data": metadata }));
        self.send(self.authorized(request, Some(session))).await?;
        Ok(())
    }
}
