use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use registration_api::{AppState, build_router};
use registration_config::AppConfig;
use registration_core::{AllocationOrchestrator, EventBus};
use registration_domain::{BookingStatus, Course, Difficulty, SeatConfig, Student};
use registration_storage::{InMemoryRepository, Repository};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn test_config() -> AppConfig {
    AppConfig {
        bind_address: "127.0.0.1:0".to_string(),
        log_filter: "info".to_string(),
        event_channel_capacity: 64,
        cors_origin: "*".to_string(),
    }
}

async fn seeded_app(rows: u32, seats_per_row: u32, status: BookingStatus) -> (Router, Vec<Uuid>) {
    let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());

    let mut seat_config = SeatConfig::new("CS101", rows, seats_per_row);
    seat_config.booking_status = status;
    let course = Course {
        id: "CS101".to_string(),
        name: "Intro to CS".to_string(),
        category: "core".to_string(),
        difficulty: Difficulty::Beginner,
        min_gpa_recommended: 0.0,
        prerequisites: Vec::new(),
        keywords: Default::default(),
        weekdays: Default::default(),
        start_time: "09:00".to_string(),
        end_time: "10:00".to_string(),
        seat_config,
    };
    repository.put_course(course).await.unwrap();

    let mut student_ids = Vec::new();
    for roll in ["STU1", "STU2", "STU3", "STU4", "STU5", "STU6"] {
        let student = Student::new(roll, format!("{roll}@example.edu"), 3.5, 2, "CSE");
        student_ids.push(student.id);
        repository.put_student(student).await.unwrap();
    }

    let event_bus = Arc::new(EventBus::new());
    let orchestrator = Arc::new(AllocationOrchestrator::new(repository, event_bus));
    let state = Arc::new(AppState {
        orchestrator,
        config: test_config(),
        start_time: Instant::now(),
    });

    (build_router(state), student_ids)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn direct_booking_on_open_course_succeeds() {
    let (app, students) = seeded_app(2, 2, BookingStatus::Open).await;
    let stu1 = students[0];

    let req = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu1, "courseId": "CS101", "seatNumber": "A1" }),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ENROLLED");
    assert_eq!(body["seatNumber"], "A1");

    let classroom_req = Request::builder()
        .uri("/classroom/CS101")
        .body(Body::empty())
        .unwrap();
    let classroom_resp = app.oneshot(classroom_req).await.unwrap();
    let classroom = json_body(classroom_resp).await;
    assert_eq!(classroom["availableSeats"], 3);
}

#[tokio::test]
async fn waitlist_on_closed_course_then_open_books_in_score_order() {
    let (app, students) = seeded_app(1, 2, BookingStatus::Closed).await;
    let stu1 = students[0];
    let stu2 = students[1];

    for student_id in [stu1, stu2] {
        let req = json_request(
            "POST",
            "/api/registration/apply",
            json!({ "studentId": student_id, "courseId": "CS101", "autoRegister": false }),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "WAITLISTED");
    }

    let open_req = Request::builder()
        .method("POST")
        .uri("/course/CS101/open-booking")
        .body(Body::empty())
        .unwrap();
    let open_resp = app.clone().oneshot(open_req).await.unwrap();
    assert_eq!(open_resp.status(), StatusCode::OK);

    let status_req = Request::builder()
        .uri(format!("/student/{stu1}/status"))
        .body(Body::empty())
        .unwrap();
    let status_resp = app.oneshot(status_req).await.unwrap();
    let status = json_body(status_resp).await;
    assert_eq!(status["enrolled"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_book_seat_on_same_seat_only_one_succeeds() {
    let (app, students) = seeded_app(1, 1, BookingStatus::Open).await;
    let stu1 = students[0];
    let stu2 = students[1];

    let req1 = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu1, "courseId": "CS101", "seatNumber": "A1" }),
    );
    let req2 = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu2, "courseId": "CS101", "seatNumber": "A1" }),
    );

    let (resp1, resp2) = tokio::join!(app.clone().oneshot(req1), app.clone().oneshot(req2));
    let body1 = json_body(resp1.unwrap()).await;
    let body2 = json_body(resp2.unwrap()).await;

    let successes = [&body1, &body2].into_iter().filter(|b| b["success"] == true).count();
    assert_eq!(successes, 1, "exactly one of the two concurrent bookings should succeed");
}

#[tokio::test]
async fn drop_triggers_auto_fill_from_waitlist() {
    let (app, students) = seeded_app(2, 2, BookingStatus::Open).await;
    let stu1 = students[0];
    let stu5 = students[4];
    let stu6 = students[5];

    for (student_id, seat) in [
        (students[0], "A1"),
        (students[1], "A2"),
        (students[2], "B1"),
        (students[3], "B2"),
    ] {
        let req = json_request(
            "POST",
            "/api/registration/book-seat",
            json!({ "studentId": student_id, "courseId": "CS101", "seatNumber": seat }),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    for student_id in [stu5, stu6] {
        let req = json_request(
            "POST",
            "/api/registration/apply",
            json!({ "studentId": student_id, "courseId": "CS101", "autoRegister": true }),
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["status"], "WAITLISTED");
    }

    let drop_req = json_request(
        "POST",
        "/api/registration/drop",
        json!({ "studentId": stu1, "courseId": "CS101" }),
    );
    let drop_resp = app.clone().oneshot(drop_req).await.unwrap();
    let drop_body = json_body(drop_resp).await;
    assert_eq!(drop_body["status"], "DROPPED");
    assert_eq!(drop_body["vacancyFilledBy"], stu5.to_string());

    let waitlist_req = Request::builder()
        .uri("/waitlist/CS101")
        .body(Body::empty())
        .unwrap();
    let waitlist_resp = app.oneshot(waitlist_req).await.unwrap();
    let waitlist = json_body(waitlist_resp).await;
    assert_eq!(waitlist["totalWaitlisted"], 1);
    assert_eq!(waitlist["entries"][0]["studentId"], stu6.to_string());
}

#[tokio::test]
async fn booking_a_seat_already_taken_is_rejected_with_conflict() {
    let (app, students) = seeded_app(1, 1, BookingStatus::Open).await;
    let stu1 = students[0];
    let stu2 = students[1];

    let first = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu1, "courseId": "CS101", "seatNumber": "A1" }),
    );
    let resp = app.clone().oneshot(first).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let second = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu2, "courseId": "CS101", "seatNumber": "A1" }),
    );
    let resp = app.oneshot(second).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "REJECTED");
}

#[tokio::test]
async fn lowercase_seat_number_conflicts_with_uppercase_booking() {
    let (app, students) = seeded_app(1, 1, BookingStatus::Open).await;
    let stu1 = students[0];
    let stu2 = students[1];

    let first = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu1, "courseId": "CS101", "seatNumber": "a1" }),
    );
    let resp = app.clone().oneshot(first).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["seatNumber"], "A1");

    let second = json_request(
        "POST",
        "/api/registration/book-seat",
        json!({ "studentId": stu2, "courseId": "CS101", "seatNumber": "A1" }),
    );
    let resp = app.clone().oneshot(second).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let classroom_req = Request::builder().uri("/classroom/CS101").body(Body::empty()).unwrap();
    let classroom_resp = app.oneshot(classroom_req).await.unwrap();
    let classroom = json_body(classroom_resp).await;
    assert_eq!(classroom["availableSeats"], 0);
    assert_eq!(classroom["seats"][0]["seatNumber"], "A1");
    assert_eq!(classroom["seats"][0]["isOccupied"], true);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _students) = seeded_app(1, 1, BookingStatus::Open).await;
    let req = Request::builder().uri("/v1/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
}
