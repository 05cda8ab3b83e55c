//! The top-level API used by the `api` crate's handlers. Mutating calls are
//! delegated to the relevant course's actor (§5); reads go straight through
//! the repository and the projector, since a plain read needs no
//! SeatConfig lock.

use std::sync::Arc;

use dashmap::DashMap;
use kameo::actor::ActorRef;
use uuid::Uuid;

use registration_domain::dto::{
    AllocationResult, ClassroomState, EnrolledCourse, SimpleOutcome, StudentStatus,
    WaitlistEntryView, WaitlistView,
};
use registration_domain::{Course, CourseSummary, DomainError, EnrollmentStatus, WaitlistStatus};
use registration_storage::Repository;

use crate::course_actor::{Apply, BookSeat, CloseBooking, CourseActor, Drop, OpenBooking};
use crate::events::EventBus;
use crate::projector;
use crate::scoring::ScoringEngine;
use crate::waitlist_queue::WaitlistQueue;

pub struct AllocationOrchestrator {
    repository: Arc<dyn Repository>,
    event_bus: Arc<EventBus>,
    scoring: ScoringEngine,
    actors: DashMap<String, ActorRef<CourseActor>>,
}

impl AllocationOrchestrator {
    pub fn new(repository: Arc<dyn Repository>, event_bus: Arc<EventBus>) -> Self {
        Self {
            repository,
            event_bus,
            scoring: ScoringEngine::default(),
            actors: DashMap::new(),
        }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Returns the actor for `course_id`, spawning and caching it on first
    /// use. Two concurrent first-callers may both construct an actor; the
    /// loser's is simply dropped, since neither has been handed to a caller
    /// yet and kameo actors with no outstanding refs are torn down cleanly.
    async fn actor_for(&self, course_id: &str) -> Result<ActorRef<CourseActor>, DomainError> {
        if let Some(actor_ref) = self.actors.get(course_id) {
            return Ok(actor_ref.clone());
        }

        let course = self
            .repository
            .get_course(course_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("course '{course_id}' not found")))?;

        let entries = self.repository.list_waitlist_entries(course_id).await?;
        let waitlist = WaitlistQueue::load(entries.into_iter().filter(|e| !e.status.is_terminal()).collect());

        let actor = CourseActor::new(
            course,
            waitlist,
            self.repository.clone(),
            self.event_bus.clone(),
            self.scoring,
        );
        let actor_ref = kameo::spawn(actor);

        Ok(self
            .actors
            .entry(course_id.to_string())
            .or_insert(actor_ref)
            .clone())
    }

    fn unavailable<E: std::fmt::Display>(err: E) -> DomainError {
        DomainError::Unavailable(format!("course actor unavailable: {err}"))
    }

    pub async fn apply(
        &self,
        student_id: Uuid,
        course_id: &str,
        preferred_seat: Option<String>,
        auto_register: bool,
    ) -> Result<AllocationResult, DomainError> {
        let student = self
            .repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("student '{student_id}' not found")))?;

        let actor_ref = self.actor_for(course_id).await?;
        actor_ref
            .ask(Apply {
                student,
                preferred_seat,
                auto_register,
            })
            .await
            .map_err(Self::unavailable)?
    }

    pub async fn book_seat(
        &self,
        student_id: Uuid,
        course_id: &str,
        seat_number: String,
    ) -> Result<AllocationResult, DomainError> {
        self.repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("student '{student_id}' not found")))?;

        let actor_ref = self.actor_for(course_id).await?;
        actor_ref
            .ask(BookSeat { student_id, seat_number })
            .await
            .map_err(Self::unavailable)?
    }

    pub async fn drop(
        &self,
        student_id: Uuid,
        course_id: &str,
    ) -> Result<AllocationResult, DomainError> {
        let actor_ref = self.actor_for(course_id).await?;
        let (result, _outcomes) = actor_ref
            .ask(Drop { student_id })
            .await
            .map_err(Self::unavailable)??;
        Ok(result)
    }

    pub async fn open_booking(&self, course_id: &str) -> Result<SimpleOutcome, DomainError> {
        let actor_ref = self.actor_for(course_id).await?;
        let outcomes = actor_ref.ask(OpenBooking).await.map_err(Self::unavailable)??;
        Ok(SimpleOutcome {
            success: true,
            message: format!("booking opened; {} waitlisted student(s) auto-allocated", outcomes.len()),
        })
    }

    pub async fn close_booking(&self, course_id: &str) -> Result<SimpleOutcome, DomainError> {
        let actor_ref = self.actor_for(course_id).await?;
        actor_ref.ask(CloseBooking).await.map_err(Self::unavailable)??;
        Ok(SimpleOutcome {
            success: true,
            message: "booking closed to direct registration; waitlist remains open".to_string(),
        })
    }

    pub async fn get_classroom_state(&self, course_id: &str) -> Result<ClassroomState, DomainError> {
        let course = self
            .repository
            .get_course(course_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("course '{course_id}' not found")))?;
        projector::snapshot(&self.repository, &course).await
    }

    pub async fn get_student_status(&self, student_id: Uuid) -> Result<StudentStatus, DomainError> {
        self.repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("student '{student_id}' not found")))?;

        let enrollments = self.repository.list_enrollments_for_student(student_id).await?;
        let enrolled = enrollments
            .into_iter()
            .filter(|e| e.status == EnrollmentStatus::Enrolled)
            .filter_map(|e| {
                Some(EnrolledCourse {
                    course_id: e.course_id,
                    seat_number: e.seat_number?,
                    enrolled_at: e.enrolled_at?,
                })
            })
            .collect();

        let own_entries = self
            .repository
            .list_waitlist_entries_for_student(student_id)
            .await?
            .into_iter()
            .filter(|e| e.status == WaitlistStatus::Waiting || e.status == WaitlistStatus::Processing);

        let mut waitlisted = Vec::new();
        for entry in own_entries {
            let siblings = self.repository.list_waitlist_entries(&entry.course_id).await?;
            let position = rank_of(&siblings, entry.id);
            waitlisted.push(registration_domain::dto::WaitlistedCourse {
                course_id: entry.course_id,
                position,
                score: entry.composite_score,
                applied_at: entry.applied_at,
            });
        }

        Ok(StudentStatus {
            student_id,
            enrolled,
            waitlisted,
        })
    }

    pub async fn get_waitlist(&self, course_id: &str, limit: Option<usize>) -> Result<WaitlistView, DomainError> {
        let mut entries = self.repository.list_waitlist_entries(course_id).await?;
        entries.retain(|e| e.status == WaitlistStatus::Waiting);
        entries.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));

        let total = entries.len();
        let limited = entries.into_iter().take(limit.unwrap_or(usize::MAX));

        let views = limited
            .enumerate()
            .map(|(idx, e)| WaitlistEntryView {
                student_id: e.student_id,
                position: idx + 1,
                composite_score: e.composite_score,
                applied_at: e.applied_at,
                preferred_seat: e.preferred_seat,
            })
            .collect();

        Ok(WaitlistView {
            total_waitlisted: total,
            entries: views,
        })
    }

    pub async fn list_courses(&self) -> Result<Vec<CourseSummary>, DomainError> {
        let courses = self.repository.list_courses().await?;
        let mut summaries = Vec::with_capacity(courses.len());
        for course in courses {
            summaries.push(self.summarize(&course).await?);
        }
        Ok(summaries)
    }

    async fn summarize(&self, course: &Course) -> Result<CourseSummary, DomainError> {
        let occupied = self.repository.active_bookings(&course.id).await?.len() as u32;
        let total = course.seat_config.total_seats();
        Ok(CourseSummary {
            id: course.id.clone(),
            name: course.name.clone(),
            booking_status: course.seat_config.booking_status,
            total_seats: total,
            occupied_seats: occupied,
            available_seats: total.saturating_sub(occupied),
        })
    }
}

fn rank_of(entries: &[registration_domain::WaitlistEntry], entry_id: Uuid) -> usize {
    let mut waiting: Vec<&registration_domain::WaitlistEntry> = entries
        .iter()
        .filter(|e| e.status == WaitlistStatus::Waiting)
        .collect();
    waiting.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));
    waiting
        .iter()
        .position(|e| e.id == entry_id)
        .map(|idx| idx + 1)
        .unwrap_or(0)
}
