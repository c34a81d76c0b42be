use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use super::domain::{ServerStats, SiteSetting, StoreItem};
use crate::backend::{decode_row, decode_rows, Direction, Filter, Query, RemoteBackend, Session, Table};
use crate::cache::{SlotCache, TtlCache};
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};
use crate::config::PortalConfig;

pub struct SiteService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
    settings: TtlCache<String, Option<SiteSetting>>,
    store: SlotCache<Vec<StoreItem>>,
    stats: SlotCache<Option<ServerStats>>,
}

impl<B: RemoteBackend> SiteService<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
            settings: TtlCache::new(config.cache_ttl),
            store: SlotCache::new(config.cache_ttl),
            stats: SlotCache::new(config.cache_ttl),
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<SiteSetting>, ServiceError> {
        if let Some(cached) = self.settings.get(&key.to_string()) {
            return Ok(cached);
        }

        let rows = self
            .backend
            .select(None, Query::from(Table::SiteSettings).eq("key", key).limit(1))
            .await?;
        let setting = decode_rows::<SiteSetting>(Table::SiteSettings, rows)?
            .into_iter()
            .next();
        self.settings.insert(key.to_string(), setting.clone());
        Ok(setting)
    }

    /// Insert or replace a setting value.
    pub async fn update_setting(
        &self,
        session: &Session,
        key: &str,
        value: Value,
    ) -> Result<SiteSetting, ServiceError> {
        self.permissions.require_admin(session).await?;
        let key = key.trim();
        if key.is_empty() || key.len() > 64 {
            return Err(ValidationFailure::single("key", "key must be 1-64 characters").into());
        }

        let now = Utc::now();
        let updated = self
            .backend
            .update(
                session,
                Table::SiteSettings,
                vec![Filter::eq("key", key)],
                json!({ "value": value, "updated_at": now }),
            )
            .await?;
        let row = match updated.into_iter().next() {
            Some(row) => row,
            None => {
                self.backend
                    .insert(
                        session,
                        Table::SiteSettings,
                        json!({ "key": key, "value": value, "updated_at": now }),
                    )
                    .await?
            }
        };
        self.settings.invalidate(&key.to_string());
        info!(%key, "site setting saved");
        Ok(decode_row(Table::SiteSettings, row)?)
    }

    /// Active store items in display order.
    pub async fn store_items(&self) -> Result<Vec<StoreItem>, ServiceError> {
        if let Some(cached) = self.store.get(&()) {
            return Ok(cached);
        }

        let rows = self
            .backend
            .select(
                None,
                Query::from(Table::StoreItems)
                    .eq("is_active", true)
                    .order_by("sort_order", Direction::Ascending),
            )
            .await?;
        let items: Vec<StoreItem> = decode_rows(Table::StoreItems, rows)?;
        self.store.insert((), items.clone());
        Ok(items)
    }

    /// Most recent statistics snapshot, if any was recorded.
    pub async fn server_stats(&self) -> Result<Option<ServerStats>, ServiceError> {
        if let Some(cached) = self.stats.get(&()) {
            return Ok(cached);
        }

        let rows = self
            .backend
            .select(
                None,
                Query::from(Table::ServerStats)
                    .order_by("recorded_at", Direction::Descending)
                    .limit(1),
            )
            .await?;
        let stats = decode_rows::<ServerStats>(Table::ServerStats, rows)?
            .into_iter()
            .next();
        self.stats.insert((), stats.clone());
        Ok(stats)
    }
}
