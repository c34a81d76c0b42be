use super::common::*;
use crate::community::requests::{DeletionForm, IdChangeForm, IdKind, RequestStatus};
use crate::community::review::Decision;
use crate::community::ServiceError;

fn id_change() -> IdChangeForm {
    IdChangeForm {
        id_kind: IdKind::Roblox,
        current_id: "55512345".to_string(),
        requested_id: "55599999".to_string(),
        reason: "Moved to a new account".to_string(),
    }
}

#[tokio::test]
async fn one_pending_request_per_kind() {
    let h = harness();
    let service = &h.portal.requests;

    service
        .request_account_deletion(&h.member, DeletionForm::default())
        .await
        .expect("deletion requested");
    match service
        .request_account_deletion(&h.member, DeletionForm::default())
        .await
    {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    service
        .request_id_change(&h.member, id_change())
        .await
        .expect("independent kind");

    let mine = service.my_requests(&h.member).await.expect("mine");
    assert_eq!(mine.deletion.len(), 1);
    assert_eq!(mine.id_changes.len(), 1);
}

#[tokio::test]
async fn id_change_requires_numeric_and_different_ids() {
    let h = harness();
    let service = &h.portal.requests;

    let mut form = id_change();
    form.requested_id = "abc".to_string();
    match service.request_id_change(&h.member, form).await {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("requested_id")),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let mut form = id_change();
    form.requested_id = form.current_id.clone();
    match service.request_id_change(&h.member, form).await {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("requested_id")),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn admins_process_requests_once_and_stamp_them() {
    let h = harness();
    let service = &h.portal.requests;
    let request = service
        .request_id_change(&h.member, id_change())
        .await
        .expect("requested");
    assert!(request.processed_at.is_none());

    assert!(matches!(
        service
            .process_id_change_request(&h.moderator, request.id, Decision::Approve)
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    let processed = service
        .process_id_change_request(&h.admin, request.id, Decision::Approve)
        .await
        .expect("processed");
    assert_eq!(processed.status, RequestStatus::Approved);
    assert!(processed.processed_at.is_some());
    assert_eq!(processed.processed_by, Some(h.admin.user_id));

    match service
        .process_id_change_request(&h.admin, request.id, Decision::Reject)
        .await
    {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    // a processed request no longer blocks a new one
    service
        .request_id_change(&h.member, id_change())
        .await
        .expect("new request allowed");
    let pending = service
        .list_id_change_requests(&h.admin, Some(RequestStatus::Pending))
        .await
        .expect("list");
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn deletion_requests_are_processed_by_admins() {
    let h = harness();
    let service = &h.portal.requests;
    let request = service
        .request_account_deletion(
            &h.member,
            DeletionForm {
                reason: Some("  Leaving the community ".to_string()),
            },
        )
        .await
        .expect("requested");
    assert_eq!(request.reason.as_deref(), Some("Leaving the community"));

    let rejected = service
        .process_deletion_request(&h.admin, request.id, Decision::Reject)
        .await
        .expect("processed");
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(
        service
            .list_deletion_requests(&h.admin, None)
            .await
            .expect("list")
            .len(),
        1
    );
}
