//! RegistrationEvent: the append-only audit log entry type, and the typed
//! envelope published on the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationEventType {
    Applied,
    SeatBooked,
    SeatReleased,
    Dropped,
    AutoAllocated,
    BookingStatusChanged,
}

/// Append-only audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub id: Uuid,
    pub event_type: RegistrationEventType,
    pub course_id: String,
    pub student_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Value,
}

impl RegistrationEvent {
    pub fn new(
        event_type: RegistrationEventType,
        course_id: impl Into<String>,
        student_id: Option<Uuid>,
        metadata: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            course_id: course_id.into(),
            student_id,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// The type tag of a bus envelope. Distinct from `RegistrationEventType`:
/// `WAITLIST_UPDATED` is a derived bus-only notification, never an audit
/// log entry in its own right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusEventType {
    Applied,
    SeatBooked,
    SeatReleased,
    StudentAutoEnrolled,
    WaitlistUpdated,
    BookingStatusChanged,
    Disconnect,
}

/// `Envelope = { type, courseId, studentId?, payload, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: BusEventType,
    pub course_id: String,
    pub student_id: Option<Uuid>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(
        event_type: BusEventType,
        course_id: impl Into<String>,
        student_id: Option<Uuid>,
        payload: Value,
    ) -> Self {
        Self {
            event_type,
            course_id: course_id.into(),
            student_id,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn course_topic(&self) -> String {
        format!("course:{}", self.course_id)
    }

    pub fn student_topic(&self) -> Option<String> {
        self.student_id.map(|id| format!("student:{id}"))
    }
}
