use std::time::Duration;

use uuid::Uuid;
use validator::Validate;

use super::domain::{ApplicationData, BasicInfo, RulesUnderstanding, Situation};
use super::service::ApplicationService;
use crate::backend::{RemoteBackend, Session};
use crate::community::{ServiceError, ValidationFailure};

/// Where the applicant currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStep {
    Step1,
    Step2,
    Step3,
    Submitted {
        application_id: Uuid,
        redirect_after: Duration,
    },
    /// Terminal screen for confirmed ages under twelve.
    Underage,
}

impl WizardStep {
    pub const fn name(&self) -> &'static str {
        match self {
            WizardStep::Step1 => "step1",
            WizardStep::Step2 => "step2",
            WizardStep::Step3 => "step3",
            WizardStep::Submitted { .. } => "submitted",
            WizardStep::Underage => "underage",
        }
    }
}

/// Result of submitting step one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(WizardStep),
    /// The applicant must confirm their age before anything is committed.
    ConfirmAge { is_under12: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{action} is not allowed on {current}")]
    WrongStep {
        action: &'static str,
        current: &'static str,
    },
    #[error("no age confirmation is pending")]
    NothingToConfirm,
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
    #[error(transparent)]
    Submission(ServiceError),
}

/// Linear three-step form: `Step1 -> Step2 -> Step3 -> Submitted`.
///
/// Each step validates and writes only its own part of the draft. Steps
/// cannot be skipped; `back` keeps what was entered.
#[derive(Debug, Clone)]
pub struct ApplicationWizard {
    step: WizardStep,
    data: ApplicationData,
    pending_basic: Option<BasicInfo>,
    redirect_after: Duration,
}

impl ApplicationWizard {
    pub fn new(redirect_after: Duration) -> Self {
        Self {
            step: WizardStep::Step1,
            data: ApplicationData::default(),
            pending_basic: None,
            redirect_after,
        }
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn data(&self) -> &ApplicationData {
        &self.data
    }

    pub fn awaiting_age_confirmation(&self) -> bool {
        self.pending_basic.is_some()
    }

    fn expect_step(&self, action: &'static str, expected: &WizardStep) -> Result<(), WizardError> {
        if &self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                current: self.step.name(),
            })
        }
    }

    pub fn submit_basic_info(&mut self, info: BasicInfo) -> Result<StepOutcome, WizardError> {
        self.expect_step("submit_basic_info", &WizardStep::Step1)?;
        let info = info.normalized();
        info.validate().map_err(ValidationFailure::from)?;

        if info.needs_age_confirmation() {
            let is_under12 = info.is_under12();
            self.pending_basic = Some(info);
            return Ok(StepOutcome::ConfirmAge { is_under12 });
        }

        self.pending_basic = None;
        self.commit_basic(info);
        Ok(StepOutcome::Advanced(self.step.clone()))
    }

    /// Accept the age shown in the confirmation dialog.
    pub fn confirm_age(&mut self) -> Result<&WizardStep, WizardError> {
        self.expect_step("confirm_age", &WizardStep::Step1)?;
        let info = self
            .pending_basic
            .take()
            .ok_or(WizardError::NothingToConfirm)?;
        self.commit_basic(info);
        Ok(&self.step)
    }

    pub fn cancel_age_confirmation(&mut self) {
        self.pending_basic = None;
    }

    fn commit_basic(&mut self, info: BasicInfo) {
        self.data.is_under12 = info.is_under12();
        self.step = if self.data.is_under12 {
            WizardStep::Underage
        } else {
            WizardStep::Step2
        };
        self.data.basic = info;
    }

    pub fn submit_rules_understanding(
        &mut self,
        rules: RulesUnderstanding,
    ) -> Result<&WizardStep, WizardError> {
        self.expect_step("submit_rules_understanding", &WizardStep::Step2)?;
        let rules = rules.normalized();
        rules.validate().map_err(ValidationFailure::from)?;
        self.data.rules = rules;
        self.step = WizardStep::Step3;
        Ok(&self.step)
    }

    /// Validate step three and store it in the draft without leaving Step3.
    pub fn stage_situation(&mut self, situation: Situation) -> Result<(), WizardError> {
        self.expect_step("submit_situation", &WizardStep::Step3)?;
        let situation = situation.normalized();
        situation.check()?;
        self.data.situation = situation;
        Ok(())
    }

    /// Final step: stage the answers and write the application. On failure
    /// the wizard stays on Step3 with the draft intact.
    pub async fn submit_situation<B: RemoteBackend>(
        &mut self,
        service: &ApplicationService<B>,
        session: &Session,
        situation: Situation,
    ) -> Result<&WizardStep, WizardError> {
        self.stage_situation(situation)?;
        let application = service
            .submit(session, self.data.clone())
            .await
            .map_err(WizardError::Submission)?;

        self.data = ApplicationData::default();
        self.step = WizardStep::Submitted {
            application_id: application.id,
            redirect_after: self.redirect_after,
        };
        Ok(&self.step)
    }

    pub fn back(&mut self) -> Result<&WizardStep, WizardError> {
        self.step = match self.step {
            WizardStep::Step2 => WizardStep::Step1,
            WizardStep::Step3 => WizardStep::Step2,
            _ => {
                return Err(WizardError::WrongStep {
                    action: "back",
                    current: self.step.name(),
                })
            }
        };
        Ok(&self.step)
    }

    /// Abandon the draft and start over.
    pub fn reset(&mut self) {
        *self = Self::new(self.redirect_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(age: u8) -> BasicInfo {
        BasicInfo {
            discord_id: "123456789012345678".to_string(),
            roblox_id: "987654321".to_string(),
            roblox_username: "BuilderMan".to_string(),
            age,
            activity_level: 4,
            other_servers: None,
        }
    }

    fn answer() -> String {
        "I would follow the rules and explain them calmly to others.".to_string()
    }

    fn rules() -> RulesUnderstanding {
        RulesUnderstanding {
            frp_understanding: answer(),
            vdm_understanding: answer(),
            taschen_rp_understanding: answer(),
            server_age_understanding: answer(),
        }
    }

    fn wizard() -> ApplicationWizard {
        ApplicationWizard::new(Duration::from_secs(3))
    }

    #[test]
    fn age_eleven_requires_confirmation_and_leaves_draft_unchanged() {
        let mut wizard = wizard();
        let outcome = wizard.submit_basic_info(basic(11)).expect("valid step");

        assert_eq!(outcome, StepOutcome::ConfirmAge { is_under12: true });
        assert_eq!(wizard.step(), &WizardStep::Step1);
        assert_eq!(wizard.data(), &ApplicationData::default());
        assert!(wizard.awaiting_age_confirmation());
    }

    #[test]
    fn confirming_thirteen_advances_with_flag_cleared() {
        let mut wizard = wizard();
        let outcome = wizard.submit_basic_info(basic(13)).expect("valid step");
        assert_eq!(outcome, StepOutcome::ConfirmAge { is_under12: false });

        assert_eq!(wizard.confirm_age().expect("confirm"), &WizardStep::Step2);
        assert_eq!(wizard.data().basic.age, 13);
        assert!(!wizard.data().is_under12);
    }

    #[test]
    fn confirming_under_twelve_ends_on_underage_screen() {
        let mut wizard = wizard();
        wizard.submit_basic_info(basic(10)).expect("valid step");
        assert_eq!(wizard.confirm_age().expect("confirm"), &WizardStep::Underage);
        assert!(wizard.data().is_under12);

        match wizard.submit_rules_understanding(rules()) {
            Err(WizardError::WrongStep { current, .. }) => assert_eq!(current, "underage"),
            other => panic!("expected wrong step, got {other:?}"),
        }
    }

    #[test]
    fn cancelling_confirmation_stays_on_step_one() {
        let mut wizard = wizard();
        wizard.submit_basic_info(basic(12)).expect("valid step");
        wizard.cancel_age_confirmation();

        assert_eq!(wizard.step(), &WizardStep::Step1);
        assert!(!wizard.awaiting_age_confirmation());
        assert!(matches!(
            wizard.confirm_age(),
            Err(WizardError::NothingToConfirm)
        ));
    }

    #[test]
    fn missing_identity_fields_fail_on_step_one() {
        for field in ["discord_id", "roblox_id", "roblox_username"] {
            let mut info = basic(25);
            match field {
                "discord_id" => info.discord_id = "  ".to_string(),
                "roblox_id" => info.roblox_id.clear(),
                _ => info.roblox_username.clear(),
            }

            let mut wizard = wizard();
            match wizard.submit_basic_info(info) {
                Err(WizardError::Invalid(failure)) => assert!(failure.has_field(field)),
                other => panic!("expected validation failure for {field}, got {other:?}"),
            }
            assert_eq!(wizard.step(), &WizardStep::Step1);
        }
    }

    #[test]
    fn steps_cannot_be_skipped_and_back_keeps_answers() {
        let mut wizard = wizard();
        assert!(matches!(
            wizard.submit_rules_understanding(rules()),
            Err(WizardError::WrongStep { .. })
        ));

        wizard.submit_basic_info(basic(25)).expect("step one");
        wizard.submit_rules_understanding(rules()).expect("step two");
        assert_eq!(wizard.step(), &WizardStep::Step3);

        assert_eq!(wizard.back().expect("back"), &WizardStep::Step2);
        assert_eq!(wizard.data().rules, rules());
        assert_eq!(wizard.back().expect("back"), &WizardStep::Step1);
        assert!(wizard.back().is_err());
    }

    #[test]
    fn short_rule_answers_are_rejected() {
        let mut wizard = wizard();
        wizard.submit_basic_info(basic(30)).expect("step one");
        let mut answers = rules();
        answers.vdm_understanding = "too short".to_string();

        match wizard.submit_rules_understanding(answers) {
            Err(WizardError::Invalid(failure)) => {
                assert_eq!(failure.fields(), vec!["vdm_understanding"])
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(wizard.step(), &WizardStep::Step2);
    }

    #[test]
    fn unaccepted_terms_are_a_field_error() {
        let mut wizard = wizard();
        wizard.submit_basic_info(basic(30)).expect("step one");
        wizard.submit_rules_understanding(rules()).expect("step two");

        let situation = Situation {
            situation_handling: answer(),
            bodycam_understanding: answer(),
            friend_rule_violation: answer(),
            accept_terms: false,
            ..Situation::default()
        };
        match wizard.stage_situation(situation) {
            Err(WizardError::Invalid(failure)) => {
                assert_eq!(failure.fields(), vec!["accept_terms"])
            }
            other => panic!("expected terms failure, got {other:?}"),
        }
    }

    #[test]
    fn reset_discards_progress() {
        let mut wizard = wizard();
        wizard.submit_basic_info(basic(25)).expect("step one");
        wizard.reset();
        assert_eq!(wizard.step(), &WizardStep::Step1);
        assert_eq!(wizard.data(), &ApplicationData::default());
    }
}
