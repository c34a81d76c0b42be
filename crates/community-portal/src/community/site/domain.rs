use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Row of `site_settings`, keyed by `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSetting {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of `store_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Row of `server_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStats {
    pub id: Uuid,
    pub discord_members: u64,
    pub roblox_visits: u64,
    pub active_players: u64,
    pub recorded_at: DateTime<Utc>,
}
