//! In-memory `Repository` implementation. All cross-call atomicity for a
//! given course is provided by the per-course actor in `registration-core`,
//! which serializes every mutating call into this store — the maps here
//! only need to be safe for concurrent access, not transactional on their
//! own.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use registration_domain::{
    Course, Enrollment, RegistrationEvent, SeatBooking, Student, WaitlistEntry,
};

use crate::error::StorageError;
use crate::repository::Repository;

#[derive(Default)]
pub struct InMemoryRepository {
    students: DashMap<Uuid, Student>,
    courses: DashMap<String, Course>,
    bookings: DashMap<String, Vec<SeatBooking>>,
    enrollments: DashMap<(String, Uuid), Enrollment>,
    waitlist: DashMap<(String, Uuid), WaitlistEntry>,
    events: DashMap<String, Vec<RegistrationEvent>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>, StorageError> {
        Ok(self.students.get(&student_id).map(|s| s.clone()))
    }

    async fn put_student(&self, student: Student) -> Result<(), StorageError> {
        self.students.insert(student.id, student);
        Ok(())
    }

    async fn get_course(&self, course_id: &str) -> Result<Option<Course>, StorageError> {
        Ok(self.courses.get(course_id).map(|c| c.clone()))
    }

    async fn put_course(&self, course: Course) -> Result<(), StorageError> {
        self.courses.insert(course.id.clone(), course);
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        Ok(self.courses.iter().map(|c| c.clone()).collect())
    }

    async fn active_bookings(&self, course_id: &str) -> Result<Vec<SeatBooking>, StorageError> {
        Ok(self
            .bookings
            .get(course_id)
            .map(|bookings| bookings.iter().filter(|b| b.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_booking(&self, booking: SeatBooking) -> Result<(), StorageError> {
        self.bookings
            .entry(booking.course_id.clone())
            .or_default()
            .push(booking);
        Ok(())
    }

    async fn deactivate_booking(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<SeatBooking>, StorageError> {
        let Some(mut bookings) = self.bookings.get_mut(course_id) else {
            return Ok(None);
        };
        let found = bookings
            .iter_mut()
            .find(|b| b.is_active && b.student_id == student_id);
        match found {
            Some(booking) => {
                booking.is_active = false;
                Ok(Some(booking.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_enrollment(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(self
            .enrollments
            .get(&(course_id.to_string(), student_id))
            .map(|e| e.clone()))
    }

    async fn put_enrollment(&self, enrollment: Enrollment) -> Result<(), StorageError> {
        self.enrollments
            .insert((enrollment.course_id.clone(), enrollment.student_id), enrollment);
        Ok(())
    }

    async fn list_enrollments_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<Enrollment>, StorageError> {
        Ok(self
            .enrollments
            .iter()
            .filter(|e| e.key().1 == student_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn get_waitlist_entry(
        &self,
        course_id: &str,
        student_id: Uuid,
    ) -> Result<Option<WaitlistEntry>, StorageError> {
        Ok(self
            .waitlist
            .get(&(course_id.to_string(), student_id))
            .map(|e| e.clone()))
    }

    async fn put_waitlist_entry(&self, entry: WaitlistEntry) -> Result<(), StorageError> {
        self.waitlist
            .insert((entry.course_id.clone(), entry.student_id), entry);
        Ok(())
    }

    async fn list_waitlist_entries(
        &self,
        course_id: &str,
    ) -> Result<Vec<WaitlistEntry>, StorageError> {
        Ok(self
            .waitlist
            .iter()
            .filter(|e| e.key().0 == course_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn list_waitlist_entries_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<WaitlistEntry>, StorageError> {
        Ok(self
            .waitlist
            .iter()
            .filter(|e| e.key().1 == student_id)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn append_event(&self, event: RegistrationEvent) -> Result<(), StorageError> {
        self.events
            .entry(event.course_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    async fn list_events_for_course(
        &self,
        course_id: &str,
    ) -> Result<Vec<RegistrationEvent>, StorageError> {
        Ok(self.events.get(course_id).map(|v| v.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registration_domain::{Enrollment, EnrollmentStatus};

    #[tokio::test]
    async fn put_and_get_student_round_trips() {
        let repo = InMemoryRepository::new();
        let student = Student::new("R001", "r001@example.edu", 3.4, 2, "CSE");
        repo.put_student(student.clone()).await.unwrap();
        let fetched = repo.get_student(student.id).await.unwrap().unwrap();
        assert_eq!(fetched.roll_number, "R001");
    }

    #[tokio::test]
    async fn deactivate_booking_marks_inactive_and_is_excluded_from_active_list() {
        let repo = InMemoryRepository::new();
        let student_id = Uuid::new_v4();
        repo.insert_booking(SeatBooking {
            id: Uuid::new_v4(),
            course_id: "CS101".to_string(),
            student_id,
            seat_number: "A1".to_string(),
            row: 0,
            column: 1,
            is_active: true,
            booked_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

        assert_eq!(repo.active_bookings("CS101").await.unwrap().len(), 1);

        let released = repo.deactivate_booking("CS101", student_id).await.unwrap();
        assert!(released.is_some());
        assert!(repo.active_bookings("CS101").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn enrollment_round_trips_by_course_and_student() {
        let repo = InMemoryRepository::new();
        let student_id = Uuid::new_v4();
        let enrollment = Enrollment {
            status: EnrollmentStatus::Enrolled,
            ..Enrollment::pending("CS101", student_id)
        };
        repo.put_enrollment(enrollment).await.unwrap();
        let fetched = repo.get_enrollment("CS101", student_id).await.unwrap();
        assert_eq!(fetched.unwrap().status, EnrollmentStatus::Enrolled);
    }
}
