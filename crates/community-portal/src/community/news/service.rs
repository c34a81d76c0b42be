use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::domain::{NewsDraft, NewsItem};
use crate::backend::{decode_row, decode_rows, Filter, Query, RemoteBackend, Session, Table};
use crate::cache::SlotCache;
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};
use crate::config::PortalConfig;

pub struct NewsService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
    feed: SlotCache<Vec<NewsItem>>,
}

impl<B: RemoteBackend> NewsService<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
            feed: SlotCache::new(config.cache_ttl),
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    /// Newest-first feed, served from the cache while it is fresh.
    pub async fn fetch_news(&self) -> Result<Vec<NewsItem>, ServiceError> {
        if let Some(cached) = self.feed.get(&()) {
            return Ok(cached);
        }

        let rows = self
            .backend
            .select(None, Query::from(Table::News).newest_first())
            .await?;
        let items: Vec<NewsItem> = decode_rows(Table::News, rows)?;
        self.feed.insert((), items.clone());
        Ok(items)
    }

    pub async fn create_news(
        &self,
        session: &Session,
        draft: NewsDraft,
    ) -> Result<NewsItem, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let draft = draft.normalized();
        draft.validate().map_err(ValidationFailure::from)?;

        let row = self
            .backend
            .insert(
                session,
                Table::News,
                json!({
                    "title": draft.title,
                    "content": draft.content,
                    "image_url": draft.image_url,
                    "author_id": session.user_id,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;
        self.feed.invalidate_all();
        let item: NewsItem = decode_row(Table::News, row)?;
        info!(id = %item.id, "news published");
        Ok(item)
    }

    pub async fn update_news(
        &self,
        session: &Session,
        id: Uuid,
        draft: NewsDraft,
    ) -> Result<NewsItem, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let draft = draft.normalized();
        draft.validate().map_err(ValidationFailure::from)?;

        let rows = self
            .backend
            .update(
                session,
                Table::News,
                vec![Filter::eq("id", id)],
                json!({
                    "title": draft.title,
                    "content": draft.content,
                    "image_url": draft.image_url,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;
        self.feed.invalidate_all();
        let row = rows.into_iter().next().ok_or(ServiceError::NotFound("news item"))?;
        Ok(decode_row(Table::News, row)?)
    }

    pub async fn delete_news(&self, session: &Session, id: Uuid) -> Result<(), ServiceError> {
        self.permissions.require_moderator(session).await?;
        let removed = self
            .backend
            .delete(session, Table::News, vec![Filter::eq("id", id)])
            .await?;
        self.feed.invalidate_all();
        if removed.is_empty() {
            return Err(ServiceError::NotFound("news item"));
        }
        info!(%id, "news deleted");
        Ok(())
    }
}
