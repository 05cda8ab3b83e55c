//! External-facing DTOs for the HTTP and streaming surfaces (§6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seat::BookingStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Enrolled,
    Waitlisted,
    Dropped,
    Rejected,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub student_id: Uuid,
    pub course_id: String,
    pub success: bool,
    pub status: AllocationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_filled_by: Option<Uuid>,
}

impl AllocationResult {
    pub fn enrolled(student_id: Uuid, course_id: impl Into<String>, seat_number: String) -> Self {
        Self {
            student_id,
            course_id: course_id.into(),
            success: true,
            status: AllocationStatus::Enrolled,
            message: "seat booked".to_string(),
            waitlist_position: None,
            score: None,
            seat_number: Some(seat_number),
            vacancy_filled_by: None,
        }
    }

    pub fn waitlisted(
        student_id: Uuid,
        course_id: impl Into<String>,
        position: usize,
        score: f64,
    ) -> Self {
        Self {
            student_id,
            course_id: course_id.into(),
            success: true,
            status: AllocationStatus::Waitlisted,
            message: "added to waitlist".to_string(),
            waitlist_position: Some(position),
            score: Some(score),
            seat_number: None,
            vacancy_filled_by: None,
        }
    }

    pub fn dropped(student_id: Uuid, course_id: impl Into<String>) -> Self {
        Self {
            student_id,
            course_id: course_id.into(),
            success: true,
            status: AllocationStatus::Dropped,
            message: "dropped".to_string(),
            waitlist_position: None,
            score: None,
            seat_number: None,
            vacancy_filled_by: None,
        }
    }

    pub fn rejected(student_id: Uuid, course_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            student_id,
            course_id: course_id.into(),
            success: false,
            status: AllocationStatus::Rejected,
            message: message.into(),
            waitlist_position: None,
            score: None,
            seat_number: None,
            vacancy_filled_by: None,
        }
    }

    pub fn with_vacancy_filled_by(mut self, student_id: Uuid) -> Self {
        self.vacancy_filled_by = Some(student_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat_number: String,
    pub row: u32,
    pub column: u32,
    pub is_occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

/// The full seat-grid snapshot of §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomState {
    pub course_id: String,
    pub course_name: String,
    pub total_seats: u32,
    pub available_seats: u32,
    pub occupied_seats: u32,
    pub booking_status: BookingStatus,
    pub last_updated: DateTime<Utc>,
    pub seats: Vec<SeatView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub course_id: String,
    pub seat_number: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistedCourse {
    pub course_id: String,
    pub position: usize,
    pub score: f64,
    pub applied_at: DateTime<Utc>,
}

/// §4.4 `getStudentStatus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatus {
    pub student_id: Uuid,
    pub enrolled: Vec<EnrolledCourse>,
    pub waitlisted: Vec<WaitlistedCourse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntryView {
    pub student_id: Uuid,
    pub position: usize,
    pub composite_score: f64,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_seat: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistView {
    pub total_waitlisted: usize,
    pub entries: Vec<WaitlistEntryView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleOutcome {
    pub success: bool,
    pub message: String,
}

/// Request bodies, validated at the HTTP boundary.
pub mod requests {
    use serde::Deserialize;
    use uuid::Uuid;
    use validator::Validate;

    #[derive(Debug, Clone, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct ApplyRequest {
        pub student_id: Uuid,
        #[validate(length(min = 1))]
        pub course_id: String,
        pub preferred_seat: Option<String>,
        pub auto_register: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct BookSeatRequest {
        pub student_id: Uuid,
        #[validate(length(min = 1))]
        pub course_id: String,
        #[validate(length(min = 2))]
        pub seat_number: String,
    }

    #[derive(Debug, Clone, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct DropRequest {
        pub student_id: Uuid,
        #[validate(length(min = 1))]
        pub course_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WaitlistQuery {
        pub limit: Option<usize>,
    }
}
