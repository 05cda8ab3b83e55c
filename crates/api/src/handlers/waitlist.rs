//! `GET /waitlist/{courseId}` — the ordered waitlist view (§8 scenario S5).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use registration_domain::dto::requests::WaitlistQuery;
use registration_domain::{DomainError, WaitlistView};

use crate::AppState;

pub async fn waitlist(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    Query(query): Query<WaitlistQuery>,
) -> Result<Json<WaitlistView>, DomainError> {
    let view = state.orchestrator.get_waitlist(&course_id, query.limit).await?;
    Ok(Json(view))
}
