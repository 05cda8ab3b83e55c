//! `apply` / `book-seat` / `drop` handlers: the three operations that
//! mutate a student's standing in a course.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use registration_domain::dto::requests::{ApplyRequest, BookSeatRequest, DropRequest};
use registration_domain::{AllocationResult, DomainError};

use crate::AppState;

/// Builds the §6 "exit/error envelope" shape for a failed allocation call:
/// the body still looks like an `AllocationResult` (success:false,
/// status:REJECTED) rather than the generic error envelope, since callers
/// of these three endpoints expect that shape either way.
fn rejection(student_id: uuid::Uuid, course_id: &str, err: DomainError) -> impl IntoResponse {
    let status = err.status_code();
    let body = AllocationResult::rejected(student_id, course_id, err.message());
    (status, Json(body))
}

pub async fn apply(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApplyRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return DomainError::from_validation_errors(errors).into_response();
    }

    tracing::info!(
        student_id = %req.student_id,
        course_id = %req.course_id,
        auto_register = req.auto_register.unwrap_or(false),
        "apply received"
    );

    match state
        .orchestrator
        .apply(
            req.student_id,
            &req.course_id,
            req.preferred_seat,
            req.auto_register.unwrap_or(false),
        )
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            tracing::warn!(student_id = %req.student_id, course_id = %req.course_id, error = %err, "apply rejected");
            rejection(req.student_id, &req.course_id, err).into_response()
        }
    }
}

pub async fn book_seat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookSeatRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return DomainError::from_validation_errors(errors).into_response();
    }

    tracing::info!(
        student_id = %req.student_id,
        course_id = %req.course_id,
        seat_number = %req.seat_number,
        "book-seat received"
    );

    match state
        .orchestrator
        .book_seat(req.student_id, &req.course_id, req.seat_number.clone())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            tracing::warn!(student_id = %req.student_id, course_id = %req.course_id, error = %err, "book-seat rejected");
            rejection(req.student_id, &req.course_id, err).into_response()
        }
    }
}

pub async fn drop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DropRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return DomainError::from_validation_errors(errors).into_response();
    }

    tracing::info!(student_id = %req.student_id, course_id = %req.course_id, "drop received");

    match state.orchestrator.drop(req.student_id, &req.course_id).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            tracing::warn!(student_id = %req.student_id, course_id = %req.course_id, error = %err, "drop rejected");
            rejection(req.student_id, &req.course_id, err).into_response()
        }
    }
}
