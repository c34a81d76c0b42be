use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{BackendError, Direction, Filter, Query, RemoteBackend, Session, StorageObject, Table};

/// Edge function call captured by the in-memory backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: String,
    pub caller: Option<Uuid>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct MemoryUser {
    email: String,
    metadata: Value,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Value>>,
    users: HashMap<Uuid, MemoryUser>,
    tokens: HashMap<String, Uuid>,
    objects: HashMap<String, Vec<u8>>,
    invocations: Vec<Invocation>,
    failing: HashSet<String>,
}

/// Process-local stand-in for the hosted platform, used by the demo, local
/// development, and tests.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an auth user and return a live session for it.
    pub fn register_user(&self, email: &str) -> Session {
        let user_id = Uuid::new_v4();
        let access_token = format!("token-{}", Uuid::new_v4().simple());
        let mut state = self.state();
        state.users.insert(
            user_id,
            MemoryUser {
                email: email.to_string(),
                metadata: json!({}),
            },
        );
        state.tokens.insert(access_token.clone(), user_id);
        Session {
            user_id,
            email: Some(email.to_string()),
            access_token,
        }
    }

    /// Insert a row directly, bypassing sessions. Returns the stored row.
    pub fn seed(&self, table: Table, row: Value) -> Result<Value, BackendError> {
        let mut state = self.state();
        insert_row(&mut state, table, row)
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.state().invocations.clone()
    }

    /// Make every later RPC or edge-function call with this name fail.
    pub fn fail_function(&self, name: &str) {
        self.state().failing.insert(name.to_string());
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.state().objects.get(&object_key(bucket, path)).cloned()
    }

    pub fn user_metadata(&self, user_id: Uuid) -> Option<Value> {
        self.state()
            .users
            .get(&user_id)
            .map(|user| user.metadata.clone())
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn insert_row(state: &mut MemoryState, table: Table, row: Value) -> Result<Value, BackendError> {
    let Value::Object(mut fields) = row else {
        return Err(BackendError::Remote {
            status: 400,
            body: format!("insert into {table} expects a JSON object"),
        });
    };

    fields
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    fields
        .entry("created_at")
        .or_insert_with(|| Value::String(timestamp_now()));
    let row = Value::Object(fields);

    let rows = state.tables.entry(table).or_default();
    let unique = table.unique_columns();
    if !unique.is_empty()
        && rows.iter().any(|existing| {
            unique
                .iter()
                .all(|column| existing.get(column) == row.get(column))
        })
    {
        return Err(BackendError::Conflict);
    }

    rows.push(row.clone());
    Ok(row)
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn matches_all(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|filter| filter.matches(row))
}

fn is_admin(state: &MemoryState, user_id: Uuid) -> bool {
    let id = Value::String(user_id.to_string());
    state
        .tables
        .get(&Table::AdminUsers)
        .map(|rows| {
            rows.iter().any(|row| {
                row.get("user_id") == Some(&id) && row.get("role") == Some(&json!("admin"))
            })
        })
        .unwrap_or(false)
}

fn user_entry(id: &Uuid, user: &MemoryUser) -> Value {
    json!({ "id": id, "email": user.email })
}

#[async_trait]
impl RemoteBackend for InMemoryBackend {
    async fn authenticate(&self, access_token: &str) -> Result<Session, BackendError> {
        let state = self.state();
        let user_id = *state
            .tokens
            .get(access_token)
            .ok_or(BackendError::Unauthorized)?;
        let email = state.users.get(&user_id).map(|user| user.email.clone());
        Ok(Session {
            user_id,
            email,
            access_token: access_token.to_string(),
        })
    }

    async fn select(
        &self,
        _session: Option<&Session>,
        query: Query,
    ) -> Result<Vec<Value>, BackendError> {
        let state = self.state();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(&query.filters, row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(order.column).unwrap_or(&Value::Null),
                    b.get(order.column).unwrap_or(&Value::Null),
                );
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(
        &self,
        _session: &Session,
        table: Table,
        row: Value,
    ) -> Result<Value, BackendError> {
        let mut state = self.state();
        insert_row(&mut state, table, row)
    }

    async fn update(
        &self,
        _session: &Session,
        table: Table,
        filters: Vec<Filter>,
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        let Value::Object(patch) = patch else {
            return Err(BackendError::Remote {
                status: 400,
                body: format!("update of {table} expects a JSON object"),
            });
        };

        let mut state = self.state();
        let rows = state.tables.entry(table).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| matches_all(&filters, row)) {
            if let Value::Object(fields) = row {
                for (key, value) in &patch {
                    fields.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        _session: &Session,
        table: Table,
        filters: Vec<Filter>,
    ) -> Result<Vec<Value>, BackendError> {
        let mut state = self.state();
        let rows = state.tables.entry(table).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) = rows
            .drain(..)
            .partition(|row| matches_all(&filters, row));
        *rows = kept;
        Ok(removed)
    }

    async fn rpc(
        &self,
        session: &Session,
        function: &str,
        args: Value,
    ) -> Result<Value, BackendError> {
        let state = self.state();
        if state.failing.contains(function) {
            return Err(BackendError::Remote {
                status: 500,
                body: format!("{function} failed"),
            });
        }

        match function {
            "get_users_by_ids" => {
                if !is_admin(&state, session.user_id) {
                    return Err(BackendError::Unauthorized);
                }
                let wanted: HashSet<String> = args
                    .get("user_ids")
                    .and_then(Value::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let users = state
                    .users
                    .iter()
                    .filter(|(id, _)| wanted.contains(&id.to_string()))
                    .map(|(id, user)| user_entry(id, user))
                    .collect();
                Ok(Value::Array(users))
            }
            "find_users_by_email" => {
                let email = args
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                let users = state
                    .users
                    .iter()
                    .filter(|(_, user)| user.email.to_ascii_lowercase() == email)
                    .map(|(id, user)| user_entry(id, user))
                    .collect();
                Ok(Value::Array(users))
            }
            other => Err(BackendError::Remote {
                status: 404,
                body: format!("unknown rpc function {other}"),
            }),
        }
    }

    async fn invoke(
        &self,
        session: Option<&Session>,
        function: &str,
        body: Value,
    ) -> Result<Value, BackendError> {
        let mut state = self.state();
        if state.failing.contains(function) {
            return Err(BackendError::Remote {
                status: 500,
                body: format!("{function} failed"),
            });
        }

        state.invocations.push(Invocation {
            function: function.to_string(),
            caller: session.map(|session| session.user_id),
            body,
        });

        if function == "send-announcement-emails" {
            let queue = state
                .tables
                .entry(Table::AnnouncementEmailQueue)
                .or_default();
            let mut processed = 0;
            for entry in queue
                .iter_mut()
                .filter(|entry| entry.get("status") == Some(&json!("pending")))
            {
                if let Value::Object(fields) = entry {
                    fields.insert("status".to_string(), json!("sent"));
                    processed += 1;
                }
            }
            return Ok(json!({ "success": true, "processed": processed }));
        }

        Ok(json!({ "success": true }))
    }

    async fn upload(
        &self,
        _session: &Session,
        object: StorageObject,
    ) -> Result<String, BackendError> {
        let key = object_key(object.bucket, &object.path);
        self.state().objects.insert(key.clone(), object.bytes);
        Ok(format!("memory://{key}"))
    }

    async fn update_user_metadata(
        &self,
        session: &Session,
        metadata: Value,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        let user = state
            .users
            .get_mut(&session.user_id)
            .ok_or(BackendError::NotFound)?;
        let merged = match (&user.metadata, metadata) {
            (Value::Object(existing), Value::Object(incoming)) => {
                let mut merged: Map<String, Value> = existing.clone();
                merged.extend(incoming);
                Value::Object(merged)
            }
            (_, replacement) => replacement,
        };
        user.metadata = merged;
        Ok(())
    }
}
