use super::common::*;
use crate::community::news::NewsDraft;
use crate::community::ServiceError;

fn draft(title: &str) -> NewsDraft {
    NewsDraft {
        title: title.to_string(),
        content: "Patch notes for the new police station.".to_string(),
        image_url: Some("https://cdn.portal.test/station.png".to_string()),
    }
}

#[tokio::test]
async fn writes_invalidate_the_cached_feed() {
    let h = harness();
    let service = &h.portal.news;
    assert!(service.fetch_news().await.expect("feed").is_empty());

    let item = service
        .create_news(&h.moderator, draft("Update 1.4"))
        .await
        .expect("created");
    let feed = service.fetch_news().await.expect("feed");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].author_id, Some(h.moderator.user_id));

    service
        .update_news(&h.moderator, item.id, draft("Update 1.4.1"))
        .await
        .expect("updated");
    assert_eq!(service.fetch_news().await.expect("feed")[0].title, "Update 1.4.1");

    service.delete_news(&h.admin, item.id).await.expect("deleted");
    assert!(service.fetch_news().await.expect("feed").is_empty());
}

#[tokio::test]
async fn members_cannot_publish_news() {
    let h = harness();
    match h.portal.news.create_news(&h.member, draft("Leak")).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_image_url_is_a_field_error() {
    let h = harness();
    let mut news = draft("Update");
    news.image_url = Some("not a url".to_string());
    match h.portal.news.create_news(&h.moderator, news).await {
        Err(ServiceError::Validation(failure)) => assert_eq!(failure.fields(), vec!["image_url"]),
        other => panic!("expected validation failure, got {other:?}"),
    }
}
