//! Enrollment: the course-level, seat-agnostic membership status of a student.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Pending,
    Enrolled,
    Dropped,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub course_id: String,
    pub student_id: Uuid,
    pub status: EnrollmentStatus,
    pub seat_number: Option<String>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub dropped_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn pending(course_id: impl Into<String>, student_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: course_id.into(),
            student_id,
            status: EnrollmentStatus::Pending,
            seat_number: None,
            enrolled_at: None,
            dropped_at: None,
        }
    }
}
