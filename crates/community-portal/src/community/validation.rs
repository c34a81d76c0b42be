use std::borrow::Cow;

use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Letters and digits only, as accepted for Discord invite codes.
pub(crate) fn alphanumeric(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(failure(
            "alphanumeric",
            "may only contain letters a-z, A-Z and digits 0-9",
        ))
    }
}

/// Platform snowflake / numeric account identifiers.
pub(crate) fn numeric_id(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(failure("numeric_id", "must contain digits only"))
    }
}

pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

pub(crate) fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|inner| inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
}
