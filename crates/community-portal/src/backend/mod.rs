//! Seam to the hosted backend platform.
//!
//! Every domain service talks to the platform exclusively through
//! [`RemoteBackend`]: table CRUD, RPC functions, edge functions, and object
//! storage. Rows cross this boundary as JSON and are decoded into the
//! hand-maintained row structs of each domain module via [`decode_rows`].

mod memory;
mod rest;

pub use memory::{InMemoryBackend, Invocation};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Tables consumed by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AdminUsers,
    Applications,
    ApplicationSeasons,
    Announcements,
    AnnouncementReads,
    AnnouncementComments,
    AnnouncementEmailQueue,
    News,
    TeamAbsences,
    TeamSettings,
    SiteSettings,
    Profiles,
    PartnerApplications,
    AccountDeletionRequests,
    IdChangeRequests,
    StoreItems,
    ServerStats,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Table::AdminUsers => "admin_users",
            Table::Applications => "applications",
            Table::ApplicationSeasons => "application_seasons",
            Table::Announcements => "announcements",
            Table::AnnouncementReads => "announcement_reads",
            Table::AnnouncementComments => "announcement_comments",
            Table::AnnouncementEmailQueue => "announcement_email_queue",
            Table::News => "news",
            Table::TeamAbsences => "team_absences",
            Table::TeamSettings => "team_settings",
            Table::SiteSettings => "site_settings",
            Table::Profiles => "profiles",
            Table::PartnerApplications => "partner_applications",
            Table::AccountDeletionRequests => "account_deletion_requests",
            Table::IdChangeRequests => "id_change_requests",
            Table::StoreItems => "store_items",
            Table::ServerStats => "server_stats",
        }
    }

    /// Columns that must be unique together, mirroring the remote schema.
    pub(crate) const fn unique_columns(self) -> &'static [&'static str] {
        match self {
            Table::AnnouncementReads => &["announcement_id", "user_id"],
            Table::AdminUsers => &["user_id"],
            Table::Profiles => &["id"],
            Table::SiteSettings => &["key"],
            _ => &[],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row filter understood by both backends.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: &'static str, value: Value },
    Neq { column: &'static str, value: Value },
    In { column: &'static str, values: Vec<Value> },
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Serialize) -> Self {
        Filter::Eq {
            column,
            value: to_value(value),
        }
    }

    pub fn neq(column: &'static str, value: impl Serialize) -> Self {
        Filter::Neq {
            column,
            value: to_value(value),
        }
    }

    pub fn in_list<T: Serialize>(column: &'static str, values: impl IntoIterator<Item = T>) -> Self {
        Filter::In {
            column,
            values: values.into_iter().map(to_value).collect(),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq { column, .. } | Filter::Neq { column, .. } | Filter::In { column, .. } => {
                column
            }
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq { value, .. } => field == value,
            Filter::Neq { value, .. } => field != value,
            Filter::In { values, .. } => values.iter().any(|candidate| candidate == field),
        }
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// Select statement against a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &'static str, value: impl Serialize) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn in_list<T: Serialize>(
        self,
        column: &'static str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.filter(Filter::in_list(column, values))
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some(Order { column, direction });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order_by("created_at", Direction::Descending)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Authenticated caller as resolved by the platform's auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
}

/// File destined for the storage service.
#[derive(Debug, Clone)]
pub struct StorageObject {
    pub bucket: &'static str,
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not authorized by the backend")]
    Unauthorized,
    #[error("row conflicts with an existing record")]
    Conflict,
    #[error("remote resource not found")]
    NotFound,
    #[error("backend responded with status {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("backend transport failure: {0}")]
    Transport(String),
    #[error("unexpected row shape in {table}: {source}")]
    Schema {
        table: Table,
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Client for the hosted platform. Implementations must be shareable across request tasks.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn authenticate(&self, access_token: &str) -> Result<Session, BackendError>;

    async fn select(
        &self,
        session: Option<&Session>,
        query: Query,
    ) -> Result<Vec<Value>, BackendError>;

    async fn insert(
        &self,
        session: &Session,
        table: Table,
        row: Value,
    ) -> Result<Value, BackendError>;

    async fn update(
        &self,
        session: &Session,
        table: Table,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError>;

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: Vec<Filter>,
    ) -> Result<Vec<Value>, BackendError>;

    async fn rpc(
        &self,
        session: &Session,
        function: &str,
        args: Value,
    ) -> Result<Value, BackendError>;

    async fn invoke(
        &self,
        session: Option<&Session>,
        function: &str,
        body: Value,
    ) -> Result<Value, BackendError>;

    /// Store an object and return its public URL.
    async fn upload(&self, session: &Session, object: StorageObject)
        -> Result<String, BackendError>;

    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: Value,
    ) -> Result<(), BackendError>;
}

pub fn decode_rows<T: DeserializeOwned>(
    table: Table,
    rows: Vec<Value>,
) -> Result<Vec<T>, BackendError> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

pub fn decode_row<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, BackendError> {
    serde_json::from_value(row).map_err(|source| BackendError::Schema { table, source })
}

pub(crate) fn encode_row(table: Table, row: &impl Serialize) -> Result<Value, BackendError> {
    serde_json::to_value(row).map_err(|source| BackendError::Schema { table, source })
}
