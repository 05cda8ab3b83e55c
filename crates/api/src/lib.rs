//! Registration engine HTTP + WebSocket server library.

pub mod handlers;
pub mod ws;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use registration_config::AppConfig;
use registration_core::AllocationOrchestrator;
use registration_domain::{HealthResponse, ReadyResponse};

use handlers::{admin, allocation, classroom, student, waitlist};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AllocationOrchestrator>,
    pub config: AppConfig,
    pub start_time: Instant,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_origin == "*" {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(
            state
                .config
                .cors_origin
                .parse::<axum::http::HeaderValue>()
                .expect("CORS_ORIGIN must be a valid header value"),
        )
    };

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/ready", get(ready))
        .route("/api/registration/apply", post(allocation::apply))
        .route("/api/registration/book-seat", post(allocation::book_seat))
        .route("/api/registration/drop", post(allocation::drop))
        .route("/api/registration/ws", get(ws::upgrade))
        .route("/classroom/{courseId}", get(classroom::classroom))
        .route("/courses", get(classroom::courses))
        .route("/student/{studentId}/status", get(student::status))
        .route("/waitlist/{courseId}", get(waitlist::waitlist))
        .route("/course/{courseId}/open-booking", post(admin::open_booking))
        .route("/course/{courseId}/close-booking", post(admin::close_booking))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        // TODO: Add rate limiting middleware (tower_governor or alternative)
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_sha: option_env!("BUILD_SHA").unwrap_or("dev").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

async fn ready(State(_state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ok".to_string(),
        store: "in-memory".to_string(),
    })
}
