//! Registration engine server entrypoint.

use std::sync::Arc;
use std::time::Instant;

use registration_api::{AppState, build_router};
use registration_config::AppConfig;
use registration_core::{AllocationOrchestrator, EventBus};
use registration_domain::{BookingStatus, Course, Difficulty, SeatConfig, Student};
use registration_storage::{InMemoryRepository, Repository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting registration server");

    let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    seed_demo_data(&repository).await?;

    let event_bus = Arc::new(EventBus::with_capacity(config.event_channel_capacity));
    let orchestrator = Arc::new(AllocationOrchestrator::new(repository, event_bus));

    let state = Arc::new(AppState {
        orchestrator,
        config: config.clone(),
        start_time: Instant::now(),
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seeds a single demo course and a handful of students so a freshly
/// started server has something to register against. The in-memory
/// repository otherwise starts empty.
async fn seed_demo_data(repository: &Arc<dyn Repository>) -> anyhow::Result<()> {
    let mut seat_config = SeatConfig::new("CS101", 2, 2);
    seat_config.booking_status = BookingStatus::Open;

    let course = Course {
        id: "CS101".to_string(),
        name: "Introduction to Computer Science".to_string(),
        category: "Computer Science".to_string(),
        difficulty: Difficulty::Beginner,
        min_gpa_recommended: 2.5,
        prerequisites: Vec::new(),
        keywords: ["programming", "algorithms"].into_iter().map(String::from).collect(),
        weekdays: ["mon", "wed"].into_iter().map(String::from).collect(),
        start_time: "09:00".to_string(),
        end_time: "10:00".to_string(),
        seat_config,
    };
    repository.put_course(course).await?;

    let students = [
        Student::new("STU1", "stu1@example.edu", 3.5, 2, "CSE"),
        Student::new("STU2", "stu2@example.edu", 3.2, 1, "CSE"),
    ];
    for student in students {
        repository.put_student(student).await?;
    }

    Ok(())
}
