//! Announcements, per-user read tracking, comments, and the email broadcast queue.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Announcement, AnnouncementComment, AnnouncementDraft, AnnouncementStatus, CommentDraft,
    EmailQueueEntry, QueueStatus,
};
pub use router::announcement_router;
pub use service::AnnouncementService;
