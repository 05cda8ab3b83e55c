//! Read-only classroom and course-list views. These bypass the course
//! actor entirely: a snapshot read needs no SeatConfig lock, only a
//! consistent read of the repository (§4.7, §5).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use registration_domain::{ClassroomState, CourseSummary, DomainError};

use crate::AppState;

pub async fn classroom(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<ClassroomState>, DomainError> {
    let snapshot = state.orchestrator.get_classroom_state(&course_id).await?;
    Ok(Json(snapshot))
}

pub async fn courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseSummary>>, DomainError> {
    let summaries = state.orchestrator.list_courses().await?;
    Ok(Json(summaries))
}
