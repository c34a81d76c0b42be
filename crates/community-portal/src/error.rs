use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::backend::BackendError;
use crate::community::applications::WizardError;
use crate::community::ServiceError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Process-level failure while starting or running the portal service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("application wizard: {0}")]
    Wizard(#[from] WizardError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Service(err) => return err.into_response(),
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Wizard(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}
