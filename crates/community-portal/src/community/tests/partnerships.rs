use super::common::*;
use crate::backend::Table;
use crate::community::partnerships::{PartnerForm, PartnerStatus};
use crate::community::review::Decision;
use crate::community::ServiceError;

fn form(invite: &str) -> PartnerForm {
    PartnerForm {
        server_name: "Harbor City RP".to_string(),
        discord_invite: invite.to_string(),
        owner_discord_id: "123456789012345678".to_string(),
        member_count: 120,
        description: "Community-driven city roleplay with active staff.".to_string(),
    }
}

#[tokio::test]
async fn invite_with_non_alphanumeric_characters_is_rejected() {
    let h = harness();
    match h
        .portal
        .partnerships
        .submit_partner_application(&h.member, form("discord.gg/harbor"))
        .await
    {
        Err(ServiceError::Validation(failure)) => {
            assert_eq!(failure.fields(), vec!["discord_invite"])
        }
        other => panic!("expected invite failure, got {other:?}"),
    }
    assert!(h.backend.rows(Table::PartnerApplications).is_empty());
}

#[tokio::test]
async fn partner_applications_are_reviewed_once() {
    let h = harness();
    let service = &h.portal.partnerships;
    let submitted = service
        .submit_partner_application(&h.member, form("HarborCity"))
        .await
        .expect("submitted");
    assert_eq!(submitted.status, PartnerStatus::Pending);
    assert_eq!(
        service.my_partner_applications(&h.member).await.expect("mine").len(),
        1
    );

    assert!(matches!(
        service
            .update_partner_status(&h.member, submitted.id, Decision::Approve)
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    let rejected = service
        .update_partner_status(&h.moderator, submitted.id, Decision::Reject)
        .await
        .expect("rejected");
    assert_eq!(rejected.status, PartnerStatus::Rejected);

    assert!(matches!(
        service
            .update_partner_status(&h.moderator, submitted.id, Decision::Approve)
            .await,
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        service
            .update_partner_status(&h.moderator, uuid::Uuid::new_v4(), Decision::Approve)
            .await,
        Err(ServiceError::NotFound(_))
    ));

    let listed = service
        .list_partner_applications(&h.moderator, Some(PartnerStatus::Rejected))
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);

    assert!(matches!(
        service.delete_partner_application(&h.moderator, submitted.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    service
        .delete_partner_application(&h.admin, submitted.id)
        .await
        .expect("deleted");
}
