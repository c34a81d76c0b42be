use super::common::*;
use crate::backend::{RemoteBackend, Table};
use crate::community::announcements::{AnnouncementDraft, AnnouncementStatus, CommentDraft};
use crate::community::ServiceError;

fn draft(title: &str, server_wide: bool) -> AnnouncementDraft {
    AnnouncementDraft {
        title: title.to_string(),
        content: "Server restart on Friday at 18:00.".to_string(),
        status: AnnouncementStatus::Announcement,
        is_server_wide: server_wide,
    }
}

#[tokio::test]
async fn non_server_wide_announcements_never_appear_unread() {
    let h = harness();
    let service = &h.portal.announcements;
    service
        .create_announcement(&h.moderator, draft("Roadmap", false))
        .await
        .expect("local announcement");
    let wide = service
        .create_announcement(&h.moderator, draft("Maintenance", true))
        .await
        .expect("server-wide announcement");

    let unread = service
        .get_unread_server_wide_announcements(&h.member)
        .await
        .expect("unread list");
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, wide.id);
    assert!(unread.iter().all(|item| item.is_server_wide));
}

#[tokio::test]
async fn marking_read_twice_keeps_a_single_marker() {
    let h = harness();
    let service = &h.portal.announcements;
    let wide = service
        .create_announcement(&h.moderator, draft("Maintenance", true))
        .await
        .expect("announcement");

    assert!(service
        .mark_announcement_as_read(&h.member, wide.id)
        .await
        .expect("first mark"));
    assert!(!service
        .mark_announcement_as_read(&h.member, wide.id)
        .await
        .expect("second mark"));

    assert_eq!(h.backend.rows(Table::AnnouncementReads).len(), 1);
    let unread = service
        .get_unread_server_wide_announcements(&h.member)
        .await
        .expect("unread list");
    assert!(unread.is_empty());
}

#[tokio::test]
async fn mark_all_as_read_counts_only_new_markers() {
    let h = harness();
    let service = &h.portal.announcements;
    let first = service
        .create_announcement(&h.moderator, draft("First", true))
        .await
        .expect("announcement");
    service
        .create_announcement(&h.moderator, draft("Second", true))
        .await
        .expect("announcement");
    service
        .mark_announcement_as_read(&h.member, first.id)
        .await
        .expect("mark");

    assert_eq!(service.mark_all_as_read(&h.member).await.expect("mark all"), 1);
    assert_eq!(service.mark_all_as_read(&h.member).await.expect("mark all"), 0);
}

#[tokio::test]
async fn published_at_is_set_once_on_first_server_wide_switch() {
    let h = harness();
    let service = &h.portal.announcements;
    let local = service
        .create_announcement(&h.moderator, draft("Draft", false))
        .await
        .expect("announcement");
    assert!(local.published_at.is_none());

    let published = service
        .update_announcement(&h.moderator, local.id, draft("Now public", true))
        .await
        .expect("publish");
    let first = published.published_at.expect("published");

    service
        .update_announcement(&h.moderator, local.id, draft("Hidden", false))
        .await
        .expect("hide");
    let republished = service
        .update_announcement(&h.moderator, local.id, draft("Public again", true))
        .await
        .expect("republish");
    assert_eq!(republished.published_at, Some(first));

    let queued = h.backend.rows(Table::AnnouncementEmailQueue);
    assert_eq!(queued.len(), 1, "broadcast queued only on first publication");
}

#[tokio::test]
async fn members_cannot_create_announcements() {
    let h = harness();
    match h
        .portal
        .announcements
        .create_announcement(&h.member, draft("Nope", true))
        .await
    {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    assert!(h.backend.rows(Table::Announcements).is_empty());
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_write() {
    let h = harness();
    match h
        .portal
        .announcements
        .create_announcement(&h.moderator, draft("   ", false))
        .await
    {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("title")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(h.backend.rows(Table::Announcements).is_empty());
}

#[tokio::test]
async fn failing_email_function_does_not_fail_the_write() {
    let h = harness();
    h.backend.fail_function("send-announcement-emails");
    let created = h
        .portal
        .announcements
        .create_announcement(&h.moderator, draft("Outage", true))
        .await
        .expect("write succeeds despite email failure");
    assert!(created.published_at.is_some());
    assert_eq!(h.backend.rows(Table::AnnouncementEmailQueue).len(), 1);
}

#[tokio::test]
async fn processing_the_queue_is_admin_only_and_drains_pending() {
    let h = harness();
    let service = &h.portal.announcements;
    service
        .create_announcement(&h.moderator, draft("Event", true))
        .await
        .expect("announcement");

    match service.process_email_queue(&h.moderator).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    // creation already triggered one drain
    let queue = service.email_queue(&h.admin).await.expect("queue");
    assert_eq!(queue.len(), 1);

    let result = service.process_email_queue(&h.admin).await.expect("processed");
    assert_eq!(result["success"], true);
    assert!(h
        .backend
        .invocations()
        .iter()
        .all(|call| call.function == "send-announcement-emails"));
}

#[tokio::test]
async fn comments_can_be_removed_by_author_or_moderator_only() {
    let h = harness();
    let service = &h.portal.announcements;
    let announcement = service
        .create_announcement(&h.moderator, draft("Feedback", false))
        .await
        .expect("announcement");
    let comment = service
        .add_comment(
            &h.member,
            announcement.id,
            CommentDraft {
                content: "  Looking forward to it!  ".to_string(),
            },
        )
        .await
        .expect("comment");
    assert_eq!(comment.content, "Looking forward to it!");

    let stranger = h.backend.register_user("stranger@portal.test");
    match service.delete_comment(&stranger, comment.id).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    service
        .delete_comment(&h.moderator, comment.id)
        .await
        .expect("moderator removes comment");
    let remaining = service
        .list_comments(None, announcement.id)
        .await
        .expect("comments");
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn session_resolution_rejects_unknown_tokens() {
    let h = harness();
    let err = h
        .backend
        .authenticate("forged")
        .await
        .expect_err("unknown token");
    let mapped = h
        .portal
        .announcements
        .permissions()
        .session(&crate::community::BearerToken("forged".to_string()))
        .await;
    assert!(matches!(mapped, Err(ServiceError::Unauthenticated)), "{err}");
}

#[tokio::test]
async fn marking_an_unknown_announcement_read_is_not_found() {
    let h = harness();
    match h
        .portal
        .announcements
        .mark_announcement_as_read(&h.member, uuid::Uuid::new_v4())
        .await
    {
        Err(ServiceError::NotFound("announcement")) => {}
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(h.backend.rows(Table::AnnouncementReads).is_empty());
}
