use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{success, message?, data?}` body returned by write endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ActionResponse<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ActionResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
