use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::domain::{
    Announcement, AnnouncementComment, AnnouncementDraft, AnnouncementRead, CommentDraft,
    EmailQueueEntry, QueueStatus,
};
use crate::backend::{
    decode_row, decode_rows, BackendError, Direction, Filter, Query, RemoteBackend, Session, Table,
};
use crate::community::roles::Permissions;
use crate::community::{ServiceError, ValidationFailure};

const EMAIL_FUNCTION: &str = "send-announcement-emails";

pub struct AnnouncementService<B> {
    backend: Arc<B>,
    permissions: Permissions<B>,
}

impl<B: RemoteBackend> AnnouncementService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            permissions: Permissions::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn permissions(&self) -> &Permissions<B> {
        &self.permissions
    }

    pub async fn list_announcements(
        &self,
        session: Option<&Session>,
    ) -> Result<Vec<Announcement>, ServiceError> {
        let rows = self
            .backend
            .select(session, Query::from(Table::Announcements).newest_first())
            .await?;
        Ok(decode_rows(Table::Announcements, rows)?)
    }

    pub async fn get_announcement(
        &self,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Announcement, ServiceError> {
        let rows = self
            .backend
            .select(session, Query::from(Table::Announcements).eq("id", id).limit(1))
            .await?;
        decode_rows::<Announcement>(Table::Announcements, rows)?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("announcement"))
    }

    pub async fn create_announcement(
        &self,
        session: &Session,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let draft = draft.normalized();
        draft.validate().map_err(ValidationFailure::from)?;

        let now = Utc::now();
        let published_at = draft.is_server_wide.then_some(now);
        let row = self
            .backend
            .insert(
                session,
                Table::Announcements,
                json!({
                    "title": draft.title,
                    "content": draft.content,
                    "status": draft.status,
                    "is_server_wide": draft.is_server_wide,
                    "author_id": session.user_id,
                    "updated_at": now,
                    "published_at": published_at,
                }),
            )
            .await?;
        let announcement: Announcement = decode_row(Table::Announcements, row)?;
        info!(id = %announcement.id, server_wide = announcement.is_server_wide, "announcement created");

        if announcement.is_server_wide {
            self.queue_broadcast(session, announcement.id).await;
        }
        Ok(announcement)
    }

    /// Update an announcement. `published_at` is only ever set on the first
    /// switch to server-wide, which also queues the broadcast email.
    pub async fn update_announcement(
        &self,
        session: &Session,
        id: Uuid,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, ServiceError> {
        self.permissions.require_moderator(session).await?;
        let draft = draft.normalized();
        draft.validate().map_err(ValidationFailure::from)?;

        let existing = self.get_announcement(Some(session), id).await?;
        let first_publication = draft.is_server_wide && existing.published_at.is_none();

        let now = Utc::now();
        let mut patch = json!({
            "title": draft.title,
            "content": draft.content,
            "status": draft.status,
            "is_server_wide": draft.is_server_wide,
            "updated_at": now,
        });
        if first_publication {
            patch["published_at"] = json!(now);
        }

        let rows = self
            .backend
            .update(session, Table::Announcements, vec![Filter::eq("id", id)], patch)
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("announcement"))?;
        let announcement: Announcement = decode_row(Table::Announcements, row)?;
        info!(%id, first_publication, "announcement updated");

        if first_publication {
            self.queue_broadcast(session, id).await;
        }
        Ok(announcement)
    }

    pub async fn delete_announcement(&self, session: &Session, id: Uuid) -> Result<(), ServiceError> {
        self.permissions.require_moderator(session).await?;
        let removed = self
            .backend
            .delete(session, Table::Announcements, vec![Filter::eq("id", id)])
            .await?;
        if removed.is_empty() {
            return Err(ServiceError::NotFound("announcement"));
        }
        info!(%id, "announcement deleted");
        Ok(())
    }

    /// Queue row plus edge-function kick. Neither step fails the triggering write.
    async fn queue_broadcast(&self, session: &Session, announcement_id: Uuid) {
        let queued = self
            .backend
            .insert(
                session,
                Table::AnnouncementEmailQueue,
                json!({ "announcement_id": announcement_id, "status": QueueStatus::Pending }),
            )
            .await;
        if let Err(err) = queued {
            warn!(%announcement_id, error = %err, "failed to queue announcement email");
            return;
        }

        if let Err(err) = self
            .backend
            .invoke(
                Some(session),
                EMAIL_FUNCTION,
                json!({ "announcement_id": announcement_id }),
            )
            .await
        {
            warn!(%announcement_id, error = %err, "announcement email function failed");
        }
    }

    /// Server-wide announcements the caller has not read yet, newest first.
    pub async fn get_unread_server_wide_announcements(
        &self,
        session: &Session,
    ) -> Result<Vec<Announcement>, ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::Announcements)
                    .eq("is_server_wide", true)
                    .newest_first(),
            )
            .await?;
        let announcements: Vec<Announcement> = decode_rows(Table::Announcements, rows)?;
        if announcements.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = announcements.iter().map(|item| item.id).collect();
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AnnouncementReads)
                    .eq("user_id", session.user_id)
                    .in_list("announcement_id", ids),
            )
            .await?;
        let read: HashSet<Uuid> = decode_rows::<AnnouncementRead>(Table::AnnouncementReads, rows)?
            .into_iter()
            .map(|marker| marker.announcement_id)
            .collect();

        Ok(announcements
            .into_iter()
            .filter(|item| item.is_server_wide && !read.contains(&item.id))
            .collect())
    }

    /// Insert-if-absent read marker. Returns `true` when a new marker was written.
    pub async fn mark_announcement_as_read(
        &self,
        session: &Session,
        announcement_id: Uuid,
    ) -> Result<bool, ServiceError> {
        self.get_announcement(Some(session), announcement_id).await?;
        self.insert_read_marker(session, announcement_id).await
    }

    async fn insert_read_marker(
        &self,
        session: &Session,
        announcement_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let existing = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AnnouncementReads)
                    .eq("announcement_id", announcement_id)
                    .eq("user_id", session.user_id)
                    .limit(1),
            )
            .await?;
        if !existing.is_empty() {
            return Ok(false);
        }

        let inserted = self
            .backend
            .insert(
                session,
                Table::AnnouncementReads,
                json!({
                    "announcement_id": announcement_id,
                    "user_id": session.user_id,
                    "read_at": Utc::now(),
                }),
            )
            .await;
        match inserted {
            Ok(_) => Ok(true),
            // another tab won the race
            Err(BackendError::Conflict) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn mark_all_as_read(&self, session: &Session) -> Result<usize, ServiceError> {
        let unread = self.get_unread_server_wide_announcements(session).await?;
        let mut marked = 0;
        for announcement in unread {
            if self.insert_read_marker(session, announcement.id).await?
            {
                marked += 1;
            }
        }
        Ok(marked)
    }

    pub async fn list_comments(
        &self,
        session: Option<&Session>,
        announcement_id: Uuid,
    ) -> Result<Vec<AnnouncementComment>, ServiceError> {
        let rows = self
            .backend
            .select(
                session,
                Query::from(Table::AnnouncementComments)
                    .eq("announcement_id", announcement_id)
                    .order_by("created_at", Direction::Ascending),
            )
            .await?;
        Ok(decode_rows(Table::AnnouncementComments, rows)?)
    }

    pub async fn add_comment(
        &self,
        session: &Session,
        announcement_id: Uuid,
        draft: CommentDraft,
    ) -> Result<AnnouncementComment, ServiceError> {
        let draft = CommentDraft {
            content: draft.content.trim().to_string(),
        };
        draft.validate().map_err(ValidationFailure::from)?;
        self.get_announcement(Some(session), announcement_id).await?;

        let row = self
            .backend
            .insert(
                session,
                Table::AnnouncementComments,
                json!({
                    "announcement_id": announcement_id,
                    "user_id": session.user_id,
                    "content": draft.content,
                }),
            )
            .await?;
        Ok(decode_row(Table::AnnouncementComments, row)?)
    }

    /// Authors may delete their own comments; moderators may delete any.
    pub async fn delete_comment(&self, session: &Session, comment_id: Uuid) -> Result<(), ServiceError> {
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AnnouncementComments)
                    .eq("id", comment_id)
                    .limit(1),
            )
            .await?;
        let comment = decode_rows::<AnnouncementComment>(Table::AnnouncementComments, rows)?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("comment"))?;

        if comment.user_id != session.user_id {
            self.permissions.require_moderator(session).await?;
        }

        self.backend
            .delete(
                session,
                Table::AnnouncementComments,
                vec![Filter::eq("id", comment_id)],
            )
            .await?;
        Ok(())
    }

    pub async fn email_queue(&self, session: &Session) -> Result<Vec<EmailQueueEntry>, ServiceError> {
        self.permissions.require_admin(session).await?;
        let rows = self
            .backend
            .select(
                Some(session),
                Query::from(Table::AnnouncementEmailQueue).newest_first(),
            )
            .await?;
        Ok(decode_rows(Table::AnnouncementEmailQueue, rows)?)
    }

    /// Ask the email function to drain pending queue entries.
    pub async fn process_email_queue(&self, session: &Session) -> Result<Value, ServiceError> {
        self.permissions.require_admin(session).await?;
        let result = self
            .backend
            .invoke(Some(session), EMAIL_FUNCTION, json!({}))
            .await?;
        info!(?result, "announcement email queue processed");
        Ok(result)
    }
}
