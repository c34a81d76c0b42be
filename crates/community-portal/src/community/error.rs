use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::backend::BackendError;

/// Inline error attached to a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Client-side validation outcome. Raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed ({})", summarize(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<validator::ValidationErrors> for ValidationFailure {
    fn from(value: validator::ValidationErrors) -> Self {
        let mut errors: Vec<FieldError> = value
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| FieldError {
                    field: field.to_string(),
                    message: failure
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| failure.code.to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        Self { errors }
    }
}

/// Error raised by every domain access service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("sign in required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) | ServiceError::Backend(BackendError::Unauthorized) => {
                StatusCode::FORBIDDEN
            }
            ServiceError::NotFound(_) | ServiceError::Backend(BackendError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Conflict(_) | ServiceError::Backend(BackendError::Conflict) => {
                StatusCode::CONFLICT
            }
            ServiceError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = match &self {
            ServiceError::Validation(failure) => json!({
                "success": false,
                "message": self.to_string(),
                "errors": failure.errors,
            }),
            _ => json!({
                "success": false,
                "message": self.to_string(),
            }),
        };
        (status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        level: u8,
    }

    #[test]
    fn validator_errors_become_field_errors() {
        let form = Form {
            name: "x".to_string(),
            level: 9,
        };
        let failure = ValidationFailure::from(form.validate().expect_err("invalid form"));

        assert_eq!(failure.fields(), vec!["level", "name"]);
        assert_eq!(failure.errors[1].message, "too short");
        assert_eq!(failure.errors[0].message, "range");
    }

    #[test]
    fn validation_message_lists_every_field() {
        let failure = ValidationFailure {
            errors: vec![
                FieldError {
                    field: "title".to_string(),
                    message: "required".to_string(),
                },
                FieldError {
                    field: "content".to_string(),
                    message: "too short".to_string(),
                },
            ],
        };
        assert_eq!(
            failure.to_string(),
            "validation failed (title: required; content: too short)"
        );
        assert_eq!(
            ServiceError::from(failure.clone()).to_string(),
            failure.to_string()
        );
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ServiceError::Unauthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("admin role required").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Backend(BackendError::Transport("offline".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::from(ValidationFailure::single("title", "required")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
