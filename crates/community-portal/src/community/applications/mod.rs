//! Team application workflow: the three-step wizard draft, its validation,
//! the remote submission, moderator review, and application seasons.

pub mod domain;
pub mod router;
pub mod service;
pub mod wizard;

pub use domain::{
    Application, ApplicationData, ApplicationSeason, ApplicationStatus, BasicInfo,
    RulesUnderstanding, SeasonDraft, Situation, StatusUpdate,
};
pub use router::application_router;
pub use service::ApplicationService;
pub use wizard::{ApplicationWizard, StepOutcome, WizardError, WizardStep};
