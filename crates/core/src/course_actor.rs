//! One actor per course. Every mutating operation on a course's SeatConfig,
//! bookings and waitlist is a message processed by that course's single
//! mailbox, which gives per-course mutual exclusion without an explicit
//! lock (§5). The Vacancy Filler (§4.5) is a private method called
//! directly from the handlers below rather than a message the actor sends
//! to itself, which would deadlock a single-mailbox actor.

use std::sync::Arc;

use kameo::Actor;
use kameo::message::{Context, Message};
use serde_json::json;
use uuid::Uuid;

use registration_domain::event::{BusEventType, Envelope, RegistrationEvent, RegistrationEventType};
use registration_domain::seat::{BookingStatus, SeatBooking, parse_seat_number};
use registration_domain::waitlist::WaitlistStatus;
use registration_domain::{AllocationResult, Course, DomainError, Enrollment, EnrollmentStatus};
use registration_storage::Repository;

use crate::events::EventBus;
use crate::scoring::ScoringEngine;
use crate::state_machine;
use crate::waitlist_queue::WaitlistQueue;

/// Result of a single Vacancy Filler iteration that successfully enrolled
/// a waitlisted student.
#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub student_id: Uuid,
    pub seat_number: String,
}

/// How many top waitlist entries a `WAITLIST_UPDATED` envelope carries (§4.6).
const WAITLIST_UPDATED_TOP_N: usize = 5;

/// Loaded with this course's Course and waitlist snapshot before being
/// spawned; `kameo` then owns it and serializes all message handling.
#[derive(Actor)]
pub struct CourseActor {
    course: Course,
    waitlist: WaitlistQueue,
    repository: Arc<dyn Repository>,
    event_bus: Arc<EventBus>,
    scoring: ScoringEngine,
}

impl CourseActor {
    pub fn new(
        course: Course,
        waitlist: WaitlistQueue,
        repository: Arc<dyn Repository>,
        event_bus: Arc<EventBus>,
        scoring: ScoringEngine,
    ) -> Self {
        Self {
            course,
            waitlist,
            repository,
            event_bus,
            scoring,
        }
    }

    fn status(&self) -> BookingStatus {
        self.course.seat_config.booking_status
    }

    async fn active_seat_numbers(&self) -> Result<std::collections::HashSet<String>, DomainError> {
        Ok(self
            .repository
            .active_bookings(&self.course.id)
            .await?
            .into_iter()
            .map(|b| b.seat_number)
            .collect())
    }

    async fn available_seats(&self) -> Result<u32, DomainError> {
        let occupied = self.active_seat_numbers().await?.len() as u32;
        Ok(self.course.seat_config.total_seats().saturating_sub(occupied))
    }

    /// Lexicographically first free seat in canonical (row, column) order.
    async fn first_available_seat(&self) -> Result<Option<String>, DomainError> {
        let occupied = self.active_seat_numbers().await?;
        Ok(self
            .course
            .seat_config
            .seat_labels()
            .into_iter()
            .find(|label| !occupied.contains(label)))
    }

    async fn enqueue_waitlist(
        &mut self,
        student: &registration_domain::Student,
        preferred_seat: Option<String>,
        applied_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AllocationResult, DomainError> {
        let preferred_seat = preferred_seat.map(|seat| seat.to_ascii_uppercase());
        let (components, composite) = self.scoring.score(student, &self.course, applied_at);
        let (entry, position) =
            self.waitlist
                .enqueue(&self.course.id, student.id, preferred_seat, components, composite);
        self.repository.put_waitlist_entry(entry.clone()).await?;
        self.publish_waitlist_updated();
        Ok(AllocationResult::waitlisted(student.id, self.course.id.clone(), position, composite))
    }

    /// Publishes `WAITLIST_UPDATED` (§4.6) with the current waiting count
    /// and the top-N entries. Called after any change to the waiting set.
    fn publish_waitlist_updated(&self) {
        let top = self
            .waitlist
            .peek_top(WAITLIST_UPDATED_TOP_N)
            .into_iter()
            .map(|entry| {
                json!({
                    "studentId": entry.student_id,
                    "compositeScore": entry.composite_score,
                    "appliedAt": entry.applied_at,
                })
            })
            .collect::<Vec<_>>();
        self.event_bus.publish(Envelope::new(
            BusEventType::WaitlistUpdated,
            self.course.id.clone(),
            None,
            json!({ "size": self.waitlist.size(), "top": top }),
        ));
    }

    /// Steps 2-6 of `bookSeat`'s contract: no status gating (the caller has
    /// already decided this booking is permitted), just the seat-contention
    /// and identity checks plus the write-through and event publication.
    async fn book_seat_internal(
        &mut self,
        student_id: Uuid,
        seat_number: &str,
        waitlist_entry_id: Option<Uuid>,
    ) -> Result<AllocationResult, DomainError> {
        let address = parse_seat_number(seat_number)?;
        // Seat numbers are case-insensitive (§6); canonicalize before the
        // conflict check and the write so "a1" and "A1" are the same seat.
        let seat_number = seat_number.to_ascii_uppercase();
        let seat_number = seat_number.as_str();

        let occupied = self.active_seat_numbers().await?;
        if occupied.contains(seat_number) {
            return Err(DomainError::Conflict(format!(
                "seat {seat_number} is already booked"
            )));
        }

        if let Some(enrollment) = self
            .repository
            .get_enrollment(&self.course.id, student_id)
            .await?
        {
            if enrollment.status == EnrollmentStatus::Enrolled {
                return Err(DomainError::Conflict(
                    "student already has an active booking in this course".to_string(),
                ));
            }
        }

        let booking = SeatBooking {
            id: Uuid::new_v4(),
            course_id: self.course.id.clone(),
            student_id,
            seat_number: seat_number.to_string(),
            row: address.row,
            column: address.column,
            is_active: true,
            booked_at: chrono::Utc::now(),
        };
        self.repository.insert_booking(booking).await?;

        let enrollment = Enrollment {
            status: EnrollmentStatus::Enrolled,
            seat_number: Some(seat_number.to_string()),
            enrolled_at: Some(chrono::Utc::now()),
            ..Enrollment::pending(self.course.id.clone(), student_id)
        };
        self.repository.put_enrollment(enrollment).await?;

        let entry_id = waitlist_entry_id.or_else(|| self.waitlist.get(student_id).map(|e| e.id));
        if let Some(id) = entry_id {
            self.waitlist.mark_allocated(id);
            if let Some(entry) = self.waitlist.get_by_id(id).cloned() {
                self.repository.put_waitlist_entry(entry).await?;
            }
        }

        self.repository
            .append_event(RegistrationEvent::new(
                RegistrationEventType::SeatBooked,
                self.course.id.clone(),
                Some(student_id),
                json!({ "seatNumber": seat_number }),
            ))
            .await?;
        self.event_bus.publish(Envelope::new(
            BusEventType::SeatBooked,
            self.course.id.clone(),
            Some(student_id),
            json!({ "seatNumber": seat_number }),
        ));

        Ok(AllocationResult::enrolled(
            student_id,
            self.course.id.clone(),
            seat_number.to_string(),
        ))
    }

    /// The Vacancy Filler (§4.5). Each iteration either enrols one waitlisted
    /// student or terminates; it never busy-waits and is only invoked from
    /// event handlers (drop, open-booking, admin fill).
    async fn drain_waitlist(&mut self) -> Result<Vec<FillOutcome>, DomainError> {
        let mut outcomes = Vec::new();
        loop {
            if self.available_seats().await? == 0 {
                break;
            }
            let Some(entry) = self.waitlist.pop_top() else {
                break;
            };

            let occupied = self.active_seat_numbers().await?;
            let seat = match entry.preferred_seat.as_deref().map(str::to_ascii_uppercase) {
                Some(preferred) if !occupied.contains(&preferred) => Some(preferred),
                _ => self.first_available_seat().await?,
            };

            let Some(seat_number) = seat else {
                self.waitlist.revert_to_waiting(entry.id);
                self.publish_waitlist_updated();
                break;
            };

            match self
                .book_seat_internal(entry.student_id, &seat_number, Some(entry.id))
                .await
            {
                Ok(_) => {
                    self.repository
                        .append_event(RegistrationEvent::new(
                            RegistrationEventType::AutoAllocated,
                            self.course.id.clone(),
                            Some(entry.student_id),
                            json!({ "seatNumber": seat_number }),
                        ))
                        .await?;
                    self.event_bus.publish(Envelope::new(
                        BusEventType::StudentAutoEnrolled,
                        self.course.id.clone(),
                        Some(entry.student_id),
                        json!({ "seatNumber": seat_number }),
                    ));
                    self.publish_waitlist_updated();
                    outcomes.push(FillOutcome {
                        student_id: entry.student_id,
                        seat_number,
                    });
                }
                Err(_) => {
                    self.waitlist.revert_to_waiting(entry.id);
                    self.publish_waitlist_updated();
                    break;
                }
            }
        }
        Ok(outcomes)
    }
}

pub struct Apply {
    pub student: registration_domain::Student,
    pub preferred_seat: Option<String>,
    pub auto_register: bool,
}

pub struct BookSeat {
    pub student_id: Uuid,
    pub seat_number: String,
}

pub struct Drop {
    pub student_id: Uuid,
}

pub struct OpenBooking;

pub struct CloseBooking;

/// Admin-initiated fill, per §4.5's third trigger. No HTTP route exposes
/// this directly (§6 defines no such endpoint); it exists for programmatic
/// callers and tests.
pub struct FillVacancies;

impl Message<Apply> for CourseActor {
    type Reply = Result<AllocationResult, DomainError>;

    async fn handle(&mut self, msg: Apply, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if let Some(enrollment) = self
            .repository
            .get_enrollment(&self.course.id, msg.student.id)
            .await?
        {
            if enrollment.status == EnrollmentStatus::Enrolled {
                return Err(DomainError::Conflict(
                    "student is already enrolled in this course".to_string(),
                ));
            }
        }

        let applied_at = chrono::Utc::now();
        let seats_available = self.available_seats().await? > 0;
        let route = state_machine::apply_route(self.status(), seats_available, msg.auto_register);

        let result = match route {
            state_machine::ApplyRoute::Reject => Err(DomainError::CourseCompleted(
                "course has completed; applications are no longer accepted".to_string(),
            )),
            state_machine::ApplyRoute::BookDirect => {
                let seat = match msg.preferred_seat.as_deref().map(str::to_ascii_uppercase) {
                    Some(seat) if !self.active_seat_numbers().await?.contains(&seat) => Some(seat),
                    _ => self.first_available_seat().await?,
                };
                match seat {
                    Some(seat_number) => self.book_seat_internal(msg.student.id, &seat_number, None).await,
                    None => self.enqueue_waitlist(&msg.student, msg.preferred_seat.clone(), applied_at).await,
                }
            }
            state_machine::ApplyRoute::EnqueueWaitlist => {
                self.enqueue_waitlist(&msg.student, msg.preferred_seat.clone(), applied_at).await
            }
        }?;

        self.repository
            .append_event(RegistrationEvent::new(
                RegistrationEventType::Applied,
                self.course.id.clone(),
                Some(msg.student.id),
                json!({ "autoRegister": msg.auto_register }),
            ))
            .await?;
        self.event_bus.publish(Envelope::new(
            BusEventType::Applied,
            self.course.id.clone(),
            Some(msg.student.id),
            json!({ "status": result.status }),
        ));

        Ok(result)
    }
}

impl Message<BookSeat> for CourseActor {
    type Reply = Result<AllocationResult, DomainError>;

    async fn handle(&mut self, msg: BookSeat, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let allowed = state_machine::book_seat_allowed(self.status())?;
        if !allowed {
            // WAITLIST_ONLY redirects bookSeat to a waitlist enqueue.
            let student = self
                .repository
                .get_student(msg.student_id)
                .await?
                .ok_or_else(|| DomainError::NotFound("student not found".to_string()))?;
            let result = self
                .enqueue_waitlist(&student, Some(msg.seat_number.clone()), chrono::Utc::now())
                .await?;

            self.repository
                .append_event(RegistrationEvent::new(
                    RegistrationEventType::Applied,
                    self.course.id.clone(),
                    Some(msg.student_id),
                    json!({ "requestedSeatNumber": msg.seat_number }),
                ))
                .await?;
            self.event_bus.publish(Envelope::new(
                BusEventType::Applied,
                self.course.id.clone(),
                Some(msg.student_id),
                json!({ "status": result.status }),
            ));

            return Ok(result);
        }
        self.book_seat_internal(msg.student_id, &msg.seat_number, None).await
    }
}

impl Message<Drop> for CourseActor {
    type Reply = Result<(AllocationResult, Vec<FillOutcome>), DomainError>;

    async fn handle(&mut self, msg: Drop, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let enrollment = self
            .repository
            .get_enrollment(&self.course.id, msg.student_id)
            .await?
            .filter(|e| e.status == EnrollmentStatus::Enrolled)
            .ok_or_else(|| {
                DomainError::NotFound("student has no active enrollment in this course".to_string())
            })?;

        let released = self
            .repository
            .deactivate_booking(&self.course.id, msg.student_id)
            .await?;

        let dropped = Enrollment {
            status: EnrollmentStatus::Dropped,
            dropped_at: Some(chrono::Utc::now()),
            ..enrollment
        };
        self.repository.put_enrollment(dropped).await?;

        if let Some(entry) = self.waitlist.get(msg.student_id).cloned() {
            self.waitlist.cancel(msg.student_id);
            self.repository.put_waitlist_entry(registration_domain::waitlist::WaitlistEntry {
                status: WaitlistStatus::Cancelled,
                ..entry
            }).await?;
            self.publish_waitlist_updated();
        }

        if let Some(booking) = &released {
            self.repository
                .append_event(RegistrationEvent::new(
                    RegistrationEventType::SeatReleased,
                    self.course.id.clone(),
                    Some(msg.student_id),
                    json!({ "seatNumber": booking.seat_number }),
                ))
                .await?;
            self.event_bus.publish(Envelope::new(
                BusEventType::SeatReleased,
                self.course.id.clone(),
                Some(msg.student_id),
                json!({ "seatNumber": booking.seat_number }),
            ));
        }

        let outcomes = self.drain_waitlist().await?;

        let mut result = AllocationResult::dropped(msg.student_id, self.course.id.clone());
        if let Some(first) = outcomes.first() {
            result = result.with_vacancy_filled_by(first.student_id);
        }

        Ok((result, outcomes))
    }
}

impl Message<OpenBooking> for CourseActor {
    type Reply = Result<Vec<FillOutcome>, DomainError>;

    async fn handle(&mut self, _msg: OpenBooking, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if self.status() == BookingStatus::Open {
            // Idempotent no-op: already open, nothing new to publish.
            return Ok(Vec::new());
        }

        let new_status = state_machine::transition(self.status(), BookingStatus::Open)?;
        self.course.seat_config.booking_status = new_status;
        self.course.seat_config.booking_opens_at = Some(chrono::Utc::now());
        self.repository.put_course(self.course.clone()).await?;

        self.repository
            .append_event(RegistrationEvent::new(
                RegistrationEventType::BookingStatusChanged,
                self.course.id.clone(),
                None,
                json!({ "bookingStatus": new_status }),
            ))
            .await?;
        self.event_bus.publish(Envelope::new(
            BusEventType::BookingStatusChanged,
            self.course.id.clone(),
            None,
            json!({ "bookingStatus": new_status }),
        ));

        self.drain_waitlist().await
    }
}

impl Message<CloseBooking> for CourseActor {
    type Reply = Result<(), DomainError>;

    async fn handle(&mut self, _msg: CloseBooking, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if self.status() == BookingStatus::WaitlistOnly {
            return Ok(());
        }

        let new_status = state_machine::transition(self.status(), BookingStatus::WaitlistOnly)?;
        self.course.seat_config.booking_status = new_status;
        self.repository.put_course(self.course.clone()).await?;

        self.repository
            .append_event(RegistrationEvent::new(
                RegistrationEventType::BookingStatusChanged,
                self.course.id.clone(),
                None,
                json!({ "bookingStatus": new_status }),
            ))
            .await?;
        self.event_bus.publish(Envelope::new(
            BusEventType::BookingStatusChanged,
            self.course.id.clone(),
            None,
            json!({ "bookingStatus": new_status }),
        ));

        Ok(())
    }
}

impl Message<FillVacancies> for CourseActor {
    type Reply = Result<Vec<FillOutcome>, DomainError>;

    async fn handle(&mut self, _msg: FillVacancies, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.drain_waitlist().await
    }
}
