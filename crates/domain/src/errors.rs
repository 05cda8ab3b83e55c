//! Domain error types with HTTP status code mappings.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response format.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Domain errors with HTTP status code mappings. Names mirror the abstract
/// error kinds of the allocation engine rather than any particular cause.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Unparseable seat number, empty required field, nonsensical weights (400).
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    /// Student, course, seat config, or enrollment missing (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Seat already taken, student already enrolled, CAS retry budget exceeded (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Action not permitted for the course's current booking status.
    #[error("State violation: {0}")]
    StateViolation(String),

    /// Course has completed; no further mutation is permitted (410).
    #[error("Course completed: {0}")]
    CourseCompleted(String),

    /// Storage timeout or event bus backpressure (503).
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Unexpected/defensive catch-all (500).
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::InputInvalid(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::StateViolation(_) => StatusCode::CONFLICT,
            DomainError::CourseCompleted(_) => StatusCode::GONE,
            DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable abstract kind name suitable for logging and client branching.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InputInvalid(_) => "INPUT_INVALID",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::Conflict(_) => "CONFLICT",
            DomainError::StateViolation(_) => "STATE_VIOLATION",
            DomainError::CourseCompleted(_) => "STATE_VIOLATION",
            DomainError::Unavailable(_) => "UNAVAILABLE",
            DomainError::Internal(_) => "INTERNAL",
        }
    }

    /// A short, stable English phrase suitable for logging or an AllocationResult.message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error
                            .message
                            .as_ref()
                            .unwrap_or(&std::borrow::Cow::Borrowed("validation failed"))
                    )
                })
            })
            .collect();

        if messages.is_empty() {
            DomainError::InputInvalid("invalid input".to_string())
        } else {
            DomainError::InputInvalid(messages.join("; "))
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if matches!(self, DomainError::Internal(_)) {
            tracing::error!(error = %self, "internal error");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            status: self.kind().to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}
