//! Staff meeting settings and absence requests.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{AbsenceRequest, AbsenceStatus, TeamAbsence, TeamSettings, TeamSettingsPatch};
pub use router::team_router;
pub use service::TeamService;
