//! The abstract persistence boundary. Consumed by the core as an interface;
//! the only implementation carried in this repo is in-memory (§1's
//! "persistent store itself is out of scope, treated as an abstract
//! repository").

use async_trait::async_trait;
use uuid::Uuid;

use registration_domain::{
    Course, Enrollment, RegistrationEvent, SeatBooking, Student, WaitlistEntry, WaitlistStatus,
};

use crate::error::StorageError;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, StorageError>;
    async fn put_student(&self, student: Student) -> Result<(), StorageError>;

    async fn get_course(&self, course_id: &str) -> Result<Option<Course>, StorageError>;
    async fn put_course(&self, course: Course) -> Result<(), StorageError>;
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Active bookings for a course, in no particular order.
    async fn active_bookings(&self, course_id: &str) -> Result<Vec<SeatBooking>, StorageError>;
    async fn insert_booking(&self, booking: SeatBooking) -> Result<(), StorageError>;
    /// Marks a booking inactive; returns it if one existed for (course, student).
    async fn deactivate_booking(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<SeatBooking>, StorageError>;

    async fn get_enrollment(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError>;
    async fn put_enrollment(&self, enrollment: Enrollment) -> Result<(), StorageError>;
    async fn list_enrollments_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Enrollment>, StorageError>;

    async fn get_waitlist_entry(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<WaitlistEntry>, StorageError>;
    async fn put_waitlist_entry(&self, entry: WaitlistEntry) -> Result<(), StorageError>;
    /// All non-cancelled-or-terminal-excluded entries for a course, any status.
    async fn list_waitlist_entries(
        &self,
        course_id: &str,
    ) -> Result<Vec<WaitlistEntry>, StorageError>;
    async fn list_waitlist_entries_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<WaitlistEntry>, StorageError>;

    async fn append_event(&self, event: RegistrationEvent) -> Result<(), StorageError>;
    async fn list_events_for_course(
        &self,
        course_id: &str,
    ) -> Result<Vec<RegistrationEvent>, StorageError>;
}

/// Convenience filter, used by callers that only want entries in a given
/// waitlist status (most commonly WAITING).
pub fn filter_status(
    entries: Vec<WaitlistEntry>,
    status: WaitlistStatus,
) -> Vec<WaitlistEntry> {
    entries.into_iter().filter(|e| e.status == status).collect()
}
