use super::common::*;
use crate::community::roles::{AdminRole, NewAdminUser};
use crate::community::ServiceError;

#[tokio::test]
async fn role_checks_follow_admin_users_rows() {
    let h = harness();
    let permissions = h.portal.roles.permissions();

    assert!(permissions.check_is_admin(&h.admin).await.expect("lookup"));
    assert!(permissions.check_is_moderator(&h.admin).await.expect("lookup"));
    assert!(!permissions.check_is_admin(&h.moderator).await.expect("lookup"));
    assert!(permissions.check_is_moderator(&h.moderator).await.expect("lookup"));
    assert!(!permissions.check_is_moderator(&h.member).await.expect("lookup"));

    let summary = h.portal.roles.my_roles(&h.moderator).await.expect("summary");
    assert!(summary.is_moderator);
    assert!(!summary.is_admin);
}

#[tokio::test]
async fn admins_grant_roles_by_email() {
    let h = harness();
    let service = &h.portal.roles;
    let before = service.list_admin_users(&h.admin).await.expect("list");
    assert_eq!(before.len(), 2);

    let granted = service
        .add_admin_user(
            &h.admin,
            NewAdminUser {
                email: " Member@Portal.test ".to_string(),
                role: AdminRole::Moderator,
            },
        )
        .await
        .expect("granted");
    assert_eq!(granted.user_id, h.member.user_id);

    let after = service.list_admin_users(&h.admin).await.expect("list");
    assert_eq!(after.len(), 3);
    let member = after
        .iter()
        .find(|admin| admin.user_id == h.member.user_id)
        .expect("member listed");
    assert_eq!(member.email.as_deref(), Some("member@portal.test"));

    match service
        .add_admin_user(
            &h.admin,
            NewAdminUser {
                email: "member@portal.test".to_string(),
                role: AdminRole::Admin,
            },
        )
        .await
    {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_email_and_non_admin_callers_are_rejected() {
    let h = harness();
    let service = &h.portal.roles;
    let request = NewAdminUser {
        email: "ghost@portal.test".to_string(),
        role: AdminRole::Moderator,
    };

    match service.add_admin_user(&h.moderator, request.clone()).await {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    match service.add_admin_user(&h.admin, request).await {
        Err(ServiceError::NotFound("user")) => {}
        other => panic!("expected unknown user, got {other:?}"),
    }
}

#[tokio::test]
async fn admins_change_and_revoke_roles_but_not_their_own() {
    let h = harness();
    let service = &h.portal.roles;

    let promoted = service
        .update_admin_role(&h.admin, h.moderator.user_id, AdminRole::Admin)
        .await
        .expect("promoted");
    assert_eq!(promoted.role, AdminRole::Admin);

    match service.remove_admin_user(&h.admin, h.admin.user_id).await {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    service
        .remove_admin_user(&h.admin, h.moderator.user_id)
        .await
        .expect("revoked");
    assert!(!service
        .permissions()
        .check_is_moderator(&h.moderator)
        .await
        .expect("lookup"));
}

#[tokio::test]
async fn admin_listing_survives_failed_email_lookup() {
    let h = harness();
    h.backend.fail_function("get_users_by_ids");

    let admins = h
        .portal
        .roles
        .list_admin_users(&h.admin)
        .await
        .expect("listing still succeeds");
    assert_eq!(admins.len(), 2);
    assert!(admins.iter().all(|admin| admin.email.is_none()));
}

#[tokio::test]
async fn admins_cannot_demote_themselves() {
    let h = harness();
    let service = &h.portal.roles;

    match service
        .update_admin_role(&h.admin, h.admin.user_id, AdminRole::Moderator)
        .await
    {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
    assert!(service
        .permissions()
        .check_is_admin(&h.admin)
        .await
        .expect("lookup"));
}
