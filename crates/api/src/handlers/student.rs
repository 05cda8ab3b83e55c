//! Student-facing read views.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use registration_domain::{DomainError, StudentStatus};

use crate::AppState;

pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StudentStatus>, DomainError> {
    let status = state.orchestrator.get_student_status(student_id).await?;
    Ok(Json(status))
}
