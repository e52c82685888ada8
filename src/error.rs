//! Error types for form loading, validation and submission

use thiserror::Error;

use crate::domain::validation::ValidationErrors;

/// Message shown when the form definition could not be loaded and the
/// collaborator gave no reason.
pub const DEFAULT_FETCH_ERROR: &str = "Failed to load form";

/// Message shown when a submission failed without a reason.
pub const DEFAULT_SUBMIT_ERROR: &str = "Failed to submit form";

/// Errors that can occur while driving a form
#[derive(Debug, Error)]
pub enum FormError {
    /// Loading the form definition failed; terminal for the current mount
    #[error("{0}")]
    FetchFailure(String),

    /// Relaying a submission failed; the user may resubmit
    #[error("{0}")]
    SubmitFailure(String),

    /// Local validation failed; nothing was sent
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A value was supplied for a field the form does not have
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// An option toggle targeted a field that is not a multiselect
    #[error("Field is not a multiselect: {0}")]
    NotMultiselect(String),

    /// The form definition has not been loaded (or failed to load)
    #[error("Form is not ready")]
    NotReady,

    /// A submission is already in flight
    #[error("A submission is already in progress")]
    SubmitInProgress,
}

impl FormError {
    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::FetchFailure(_) | Self::SubmitFailure(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownField(_) | Self::NotMultiselect(_) => StatusCode::BAD_REQUEST,
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::SubmitInProgress => StatusCode::CONFLICT,
        }
    }
}

/// Human-readable message for a collaborator error, falling back to
/// `default` when the error carries no text.
pub fn message_or(err: &anyhow::Error, default: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        default.to_string()
    } else {
        message
    }
}

/// Same as [`message_or`] for an optional message reported in a result.
pub fn reported_or(message: Option<&str>, default: &str) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => default.to_string(),
    }
}

/// Result type alias for form operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_or_falls_back_on_empty() {
        let err = anyhow::anyhow!("");
        assert_eq!(message_or(&err, DEFAULT_SUBMIT_ERROR), "Failed to submit form");

        let err = anyhow::anyhow!("connection refused");
        assert_eq!(message_or(&err, DEFAULT_SUBMIT_ERROR), "connection refused");
    }

    #[test]
    fn test_reported_or() {
        assert_eq!(reported_or(Some("not found"), DEFAULT_FETCH_ERROR), "not found");
        assert_eq!(reported_or(None, DEFAULT_FETCH_ERROR), "Failed to load form");
        assert_eq!(reported_or(Some(" "), DEFAULT_FETCH_ERROR), "Failed to load form");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            FormError::FetchFailure("x".into()).status_code(),
            axum::http::StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            FormError::UnknownField("x".into()).status_code(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
