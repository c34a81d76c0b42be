use clap::Args;
use community_portal::backend::{InMemoryBackend, Session, Table};
use community_portal::community::announcements::{AnnouncementDraft, AnnouncementStatus};
use community_portal::community::applications::{
    ApplicationStatus, BasicInfo, RulesUnderstanding, SeasonDraft, Situation, StatusUpdate,
    StepOutcome, WizardStep,
};
use community_portal::community::partnerships::PartnerForm;
use community_portal::community::{Portal, ServiceError};
use community_portal::config::PortalConfig;
use community_portal::error::AppError;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Age entered on the first wizard step. Under 14 triggers the confirmation dialog.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u8).range(1..=120))]
    pub(crate) age: u8,
    /// Stop after the applicant submits; skip the admin review and announcements.
    #[arg(long)]
    pub(crate) skip_admin: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = Arc::new(InMemoryBackend::new());
    let admin = backend.register_user("admin@portal.local");
    let applicant = backend.register_user("applicant@portal.local");
    backend.seed(
        Table::AdminUsers,
        json!({ "user_id": admin.user_id, "role": "admin" }),
    )?;

    let portal = Portal::new(Arc::clone(&backend), &PortalConfig::default());

    println!("=== Community Portal Demo ===");
    let season = portal
        .applications
        .create_application_season(
            &admin,
            SeasonDraft {
                name: "Spring Season".to_string(),
            },
        )
        .await?;
    println!("Opened application season: {}", season.name);

    let Some(application_id) = run_wizard(&portal, &applicant, args.age).await? else {
        return Ok(());
    };

    if args.skip_admin {
        println!("\nSkipping admin review (--skip-admin).");
        return Ok(());
    }

    review_application(&portal, &admin, application_id).await?;
    announce(&portal, &admin, &applicant).await?;
    show_partner_validation(&portal, &applicant).await?;
    Ok(())
}

async fn run_wizard(
    portal: &Portal<InMemoryBackend>,
    applicant: &Session,
    age: u8,
) -> Result<Option<Uuid>, AppError> {
    println!("\n--- Application wizard (age {age}) ---");
    let mut wizard = portal.wizard();

    match wizard.submit_basic_info(basic_info(age))? {
        StepOutcome::ConfirmAge { is_under12 } => {
            println!(
                "Age confirmation requested (under twelve: {}). Applicant confirms.",
                if is_under12 { "yes" } else { "no" }
            );
            wizard.confirm_age()?;
        }
        StepOutcome::Advanced(step) => println!("Step 1 accepted, moved to {}", step.name()),
    }

    if wizard.step() == &WizardStep::Underage {
        println!("Applicants under twelve cannot apply. The wizard ends here.");
        return Ok(None);
    }

    let step = wizard.submit_rules_understanding(rules())?;
    println!("Step 2 accepted, moved to {}", step.name());

    let step = wizard
        .submit_situation(&portal.applications, applicant, situation())
        .await?;
    match step {
        WizardStep::Submitted {
            application_id,
            redirect_after,
        } => {
            println!(
                "Application {application_id} submitted; redirecting in {}s",
                redirect_after.as_secs()
            );
            Ok(Some(*application_id))
        }
        other => {
            println!("Wizard stopped on {}", other.name());
            Ok(None)
        }
    }
}

async fn review_application(
    portal: &Portal<InMemoryBackend>,
    admin: &Session,
    application_id: Uuid,
) -> Result<(), AppError> {
    println!("\n--- Admin review ---");
    let pending = portal
        .applications
        .list_applications(admin, Some(ApplicationStatus::Pending))
        .await?;
    println!("Pending applications: {}", pending.len());

    let reviewed = portal
        .applications
        .update_application_status(
            admin,
            application_id,
            StatusUpdate {
                status: ApplicationStatus::Approved,
                admin_notes: Some("Welcome aboard.".to_string()),
            },
        )
        .await?;
    println!(
        "Application {} is now {}",
        reviewed.id,
        reviewed.status.label()
    );
    Ok(())
}

async fn announce(
    portal: &Portal<InMemoryBackend>,
    admin: &Session,
    member: &Session,
) -> Result<(), AppError> {
    println!("\n--- Server-wide announcement ---");
    let announcement = portal
        .announcements
        .create_announcement(
            admin,
            AnnouncementDraft {
                title: "Server restart tonight".to_string(),
                content: "The city restarts at 22:00 for the weekly update.".to_string(),
                status: AnnouncementStatus::Announcement,
                is_server_wide: true,
            },
        )
        .await?;
    println!("Published: {}", announcement.title);

    let unread = portal
        .announcements
        .get_unread_server_wide_announcements(member)
        .await?;
    println!("Unread for the new member: {}", unread.len());

    let marked = portal.announcements.mark_all_as_read(member).await?;
    let unread = portal
        .announcements
        .get_unread_server_wide_announcements(member)
        .await?;
    println!("Marked {marked} as read; {} left unread", unread.len());
    Ok(())
}

async fn show_partner_validation(
    portal: &Portal<InMemoryBackend>,
    member: &Session,
) -> Result<(), AppError> {
    println!("\n--- Partner form validation ---");
    let form = PartnerForm {
        server_name: "Harbor City RP".to_string(),
        discord_invite: "discord.gg/harbor".to_string(),
        owner_discord_id: "123456789012345678".to_string(),
        member_count: 250,
        description: "A calm harbor town roleplay server.".to_string(),
    };

    match portal
        .partnerships
        .submit_partner_application(member, form)
        .await
    {
        Err(ServiceError::Validation(failure)) => {
            for error in &failure.errors {
                println!("  {}: {}", error.field, error.message);
            }
            Ok(())
        }
        Err(other) => Err(other.into()),
        Ok(application) => {
            println!("Unexpectedly accepted {}", application.server_name);
            Ok(())
        }
    }
}

fn answer() -> String {
    "I keep the scene going in character and contact staff through the ticket system.".to_string()
}

fn basic_info(age: u8) -> BasicInfo {
    BasicInfo {
        discord_id: "123456789012345678".to_string(),
        roblox_id: "55512345".to_string(),
        roblox_username: "Demo_Applicant".to_string(),
        age,
        activity_level: 4,
        other_servers: None,
    }
}

fn rules() -> RulesUnderstanding {
    RulesUnderstanding {
        frp_understanding: answer(),
        vdm_understanding: answer(),
        taschen_rp_understanding: answer(),
        server_age_understanding: answer(),
    }
}

fn situation() -> Situation {
    Situation {
        situation_handling: answer(),
        bodycam_understanding: answer(),
        friend_rule_violation: answer(),
        admin_experience: None,
        notes: None,
        accept_terms: true,
    }
}
