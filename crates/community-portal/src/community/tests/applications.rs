use std::time::Duration;

use super::common::*;
use crate::backend::Table;
use crate::community::applications::{
    ApplicationData, ApplicationStatus, SeasonDraft, StatusUpdate, StepOutcome, WizardError, WizardStep,
};
use crate::community::ServiceError;

fn season(name: &str) -> SeasonDraft {
    SeasonDraft {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn creating_a_season_leaves_exactly_one_active() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    open_season(&h.backend, "Legacy");

    let created = h
        .portal
        .applications
        .create_application_season(&h.admin, season("Season 2"))
        .await
        .expect("season created");

    let seasons = h.portal.applications.list_seasons().await.expect("seasons");
    let active: Vec<_> = seasons.iter().filter(|season| season.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, created.id);
    assert_eq!(active[0].name, "Season 2");
}

#[tokio::test]
async fn activating_and_closing_seasons_keeps_exclusivity() {
    let h = harness();
    let service = &h.portal.applications;
    let first = service
        .create_application_season(&h.admin, season("Spring"))
        .await
        .expect("season");
    let second = service
        .create_application_season(&h.admin, season("Summer"))
        .await
        .expect("season");

    service
        .activate_season(&h.admin, first.id)
        .await
        .expect("activate");
    let active = service.active_season().await.expect("active").expect("some");
    assert_eq!(active.id, first.id);
    let seasons = service.list_seasons().await.expect("seasons");
    assert_eq!(seasons.iter().filter(|s| s.is_active).count(), 1);
    assert!(seasons.iter().any(|s| s.id == second.id && !s.is_active));

    let closed = service.close_season(&h.admin, first.id).await.expect("close");
    assert!(!closed.is_active);
    assert!(service.active_season().await.expect("active").is_none());
}

#[tokio::test]
async fn season_management_requires_admin() {
    let h = harness();
    match h
        .portal
        .applications
        .create_application_season(&h.moderator, season("Season 3"))
        .await
    {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn wizard_submission_reaches_submitted_and_resets_draft() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let mut wizard = h.portal.wizard();

    match wizard.submit_basic_info(basic_info(25)).expect("step one") {
        StepOutcome::Advanced(WizardStep::Step2) => {}
        other => panic!("expected step two, got {other:?}"),
    }
    wizard.submit_rules_understanding(rules()).expect("step two");

    let step = wizard
        .submit_situation(&h.portal.applications, &h.member, situation())
        .await
        .expect("submitted")
        .clone();
    match step {
        WizardStep::Submitted {
            application_id,
            redirect_after,
        } => {
            assert_eq!(redirect_after, Duration::from_secs(3));
            let mine = h
                .portal
                .applications
                .my_applications(&h.member)
                .await
                .expect("applications");
            assert_eq!(mine.len(), 1);
            assert_eq!(mine[0].id, application_id);
            assert_eq!(mine[0].status, ApplicationStatus::Pending);
            assert!(mine[0].situation.accept_terms);
        }
        other => panic!("expected submitted, got {other:?}"),
    }
    assert_eq!(wizard.data(), &ApplicationData::default());

    let notifications: Vec<_> = h
        .backend
        .invocations()
        .into_iter()
        .filter(|call| call.function == "send-application-notification")
        .collect();
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn failed_submission_keeps_step_three_and_draft() {
    let h = harness();
    let mut wizard = h.portal.wizard();
    wizard.submit_basic_info(basic_info(19)).expect("step one");
    wizard.submit_rules_understanding(rules()).expect("step two");

    match wizard
        .submit_situation(&h.portal.applications, &h.member, situation())
        .await
    {
        Err(WizardError::Submission(ServiceError::Conflict(message))) => {
            assert_eq!(message, "applications are closed")
        }
        other => panic!("expected closed applications, got {other:?}"),
    }
    assert_eq!(wizard.step(), &WizardStep::Step3);
    assert_eq!(wizard.data().basic.age, 19);
    assert_eq!(wizard.data().situation, situation());
    assert!(h.backend.rows(Table::Applications).is_empty());
}

#[tokio::test]
async fn terms_must_be_accepted_for_remote_submission() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let mut data = application_data(22);
    data.situation.accept_terms = false;

    match h.portal.applications.submit(&h.member, data).await {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("accept_terms")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(h.backend.rows(Table::Applications).is_empty());
}

#[tokio::test]
async fn second_pending_application_in_season_conflicts() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let service = &h.portal.applications;
    service
        .submit(&h.member, application_data(30))
        .await
        .expect("first application");

    match service.submit(&h.member, application_data(30)).await {
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn under_twelve_flag_follows_age_and_blocks_submission() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let service = &h.portal.applications;

    let mut data = application_data(13);
    data.is_under12 = true;
    let application = service.submit(&h.member, data).await.expect("age 13 allowed");
    assert!(!application.is_under12);

    match service.submit(&h.moderator, application_data(11)).await {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("age")),
        other => panic!("expected age failure, got {other:?}"),
    }
}

#[tokio::test]
async fn notification_failure_does_not_fail_submission() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    h.backend.fail_function("send-application-notification");

    let application = h
        .portal
        .applications
        .submit(&h.member, application_data(40))
        .await
        .expect("submission stored");
    assert_eq!(h.backend.rows(Table::Applications).len(), 1);
    assert_eq!(application.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn moderators_review_applications() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let service = &h.portal.applications;
    let application = service
        .submit(&h.member, application_data(28))
        .await
        .expect("submitted");

    match service
        .update_application_status(
            &h.member,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Approved,
                admin_notes: None,
            },
        )
        .await
    {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    match service
        .update_application_status(
            &h.moderator,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Pending,
                admin_notes: None,
            },
        )
        .await
    {
        Err(ServiceError::Validation(failure)) => assert!(failure.has_field("status")),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let reviewed = service
        .update_application_status(
            &h.moderator,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Approved,
                admin_notes: Some("  Welcome aboard ".to_string()),
            },
        )
        .await
        .expect("reviewed");
    assert_eq!(reviewed.status, ApplicationStatus::Approved);
    assert_eq!(reviewed.admin_notes.as_deref(), Some("Welcome aboard"));
    assert_eq!(reviewed.reviewed_by, Some(h.moderator.user_id));

    let approved = service
        .list_applications(&h.moderator, Some(ApplicationStatus::Approved))
        .await
        .expect("list");
    assert_eq!(approved.len(), 1);
    let pending = service
        .list_applications(&h.moderator, Some(ApplicationStatus::Pending))
        .await
        .expect("list");
    assert!(pending.is_empty());
}

#[tokio::test]
async fn only_admins_delete_applications() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let service = &h.portal.applications;
    let application = service
        .submit(&h.member, application_data(28))
        .await
        .expect("submitted");

    assert!(matches!(
        service.delete_application(&h.moderator, application.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    service
        .delete_application(&h.admin, application.id)
        .await
        .expect("deleted");
    assert!(matches!(
        service.delete_application(&h.admin, application.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn reviewed_applications_cannot_be_reviewed_again() {
    let h = harness();
    open_season(&h.backend, "Season 1");
    let service = &h.portal.applications;
    let application = service
        .submit(&h.member, application_data(28))
        .await
        .expect("submitted");

    service
        .update_application_status(
            &h.moderator,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Approved,
                admin_notes: None,
            },
        )
        .await
        .expect("approved");

    match service
        .update_application_status(
            &h.admin,
            application.id,
            StatusUpdate {
                status: ApplicationStatus::Rejected,
                admin_notes: Some("changed my mind".to_string()),
            },
        )
        .await
    {
        Err(ServiceError::Conflict(message)) => assert!(message.contains("approved")),
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = service
        .list_applications(&h.admin, None)
        .await
        .expect("list");
    assert_eq!(stored[0].status, ApplicationStatus::Approved);
    assert_eq!(stored[0].reviewed_by, Some(h.moderator.user_id));

    match service
        .update_application_status(
            &h.admin,
            uuid::Uuid::new_v4(),
            StatusUpdate {
                status: ApplicationStatus::Rejected,
                admin_notes: None,
            },
        )
        .await
    {
        Err(ServiceError::NotFound("application")) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
