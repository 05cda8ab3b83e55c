//! `open-booking` / `close-booking`: the only course-state-machine
//! transitions exposed over HTTP (§4.3, §4.4). Broader admin CRUD is an
//! out-of-scope external collaborator.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use registration_domain::{DomainError, SimpleOutcome};

use crate::AppState;

pub async fn open_booking(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<SimpleOutcome>, DomainError> {
    tracing::info!(course_id = %course_id, "open-booking received");
    let outcome = state.orchestrator.open_booking(&course_id).await?;
    Ok(Json(outcome))
}

pub async fn close_booking(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<SimpleOutcome>, DomainError> {
    tracing::info!(course_id = %course_id, "close-booking received");
    let outcome = state.orchestrator.close_booking(&course_id).await?;
    Ok(Json(outcome))
}
