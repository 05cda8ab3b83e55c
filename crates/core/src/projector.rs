//! Reads seat-config and active bookings into the full seat-grid snapshot
//! consumed by viewers, and applies bus events incrementally to a cached
//! projection in between snapshots.

use std::sync::Arc;

use chrono::Utc;

use registration_domain::event::{BusEventType, Envelope};
use registration_domain::{ClassroomState, Course, DomainError, SeatView};
use registration_storage::Repository;

/// Builds a consistent snapshot from a single read of SeatConfig and the
/// course's active bookings. "Consistent" here means: computed from one
/// `active_bookings` call, not interleaved with further repository writes.
pub async fn snapshot(
    repository: &Arc<dyn Repository>,
    course: &Course,
) -> Result<ClassroomState, DomainError> {
    let bookings = repository.active_bookings(&course.id).await?;

    let mut seats: Vec<SeatView> = course
        .seat_config
        .seat_labels()
        .into_iter()
        .map(|label| SeatView {
            seat_number: label,
            row: 0,
            column: 0,
            is_occupied: false,
            student_id: None,
            student_name: None,
        })
        .collect();

    // Re-derive row/column for each label from its position in canonical order.
    for (idx, seat) in seats.iter_mut().enumerate() {
        let row = idx as u32 / course.seat_config.seats_per_row;
        let column = idx as u32 % course.seat_config.seats_per_row + 1;
        seat.row = row;
        seat.column = column;
    }

    for booking in &bookings {
        if let Some(seat) = seats.iter_mut().find(|s| s.seat_number == booking.seat_number) {
            seat.is_occupied = true;
            seat.student_id = Some(booking.student_id);
            seat.student_name = repository
                .get_student(booking.student_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.roll_number);
        }
    }

    let occupied = bookings.len() as u32;
    Ok(ClassroomState {
        course_id: course.id.clone(),
        course_name: course.name.clone(),
        total_seats: course.seat_config.total_seats(),
        available_seats: course.seat_config.total_seats().saturating_sub(occupied),
        occupied_seats: occupied,
        booking_status: course.seat_config.booking_status,
        last_updated: Utc::now(),
        seats,
    })
}

/// Applies one bus event to a cached projection, per §4.7:
/// SEAT_BOOKED fills a seat; SEAT_RELEASED clears it (or re-fills it when
/// `payload.fromWaitlist` is set, which in practice is immediately followed
/// by a separate STUDENT_AUTO_ENROLLED event carrying the actual
/// occupant — so the release itself still only clears the seat here, and
/// the subsequent event performs the re-fill); BOOKING_STATUS_CHANGED
/// updates only the status field.
pub fn apply_incremental(state: &mut ClassroomState, envelope: &Envelope) {
    match envelope.event_type {
        BusEventType::SeatBooked | BusEventType::StudentAutoEnrolled => {
            let Some(seat_number) = envelope.payload.get("seatNumber").and_then(|v| v.as_str())
            else {
                return;
            };
            if let Some(seat) = state.seats.iter_mut().find(|s| s.seat_number == seat_number) {
                let was_occupied = seat.is_occupied;
                seat.is_occupied = true;
                seat.student_id = envelope.student_id;
                if !was_occupied {
                    state.occupied_seats += 1;
                    state.available_seats = state.available_seats.saturating_sub(1);
                }
            }
        }
        BusEventType::SeatReleased => {
            let Some(seat_number) = envelope.payload.get("seatNumber").and_then(|v| v.as_str())
            else {
                return;
            };
            if let Some(seat) = state.seats.iter_mut().find(|s| s.seat_number == seat_number) {
                if seat.is_occupied {
                    seat.is_occupied = false;
                    seat.student_id = None;
                    seat.student_name = None;
                    state.occupied_seats = state.occupied_seats.saturating_sub(1);
                    state.available_seats += 1;
                }
            }
        }
        BusEventType::BookingStatusChanged => {
            if let Some(status) = envelope
                .payload
                .get("bookingStatus")
                .and_then(|v| v.as_str())
            {
                if let Ok(parsed) = serde_json::from_value(serde_json::Value::String(status.to_string())) {
                    state.booking_status = parsed;
                }
            }
        }
        BusEventType::Applied | BusEventType::WaitlistUpdated | BusEventType::Disconnect => {}
    }
    state.last_updated = envelope.timestamp;
}

#[cfg(test)]
mod tests {
    use super::*;
    use registration_domain::BookingStatus;
    use serde_json::json;
    use uuid::Uuid;

    fn empty_state() -> ClassroomState {
        ClassroomState {
            course_id: "CS101".to_string(),
            course_name: "Intro".to_string(),
            total_seats: 4,
            available_seats: 4,
            occupied_seats: 0,
            booking_status: BookingStatus::Open,
            last_updated: Utc::now(),
            seats: vec![SeatView {
                seat_number: "A1".to_string(),
                row: 0,
                column: 1,
                is_occupied: false,
                student_id: None,
                student_name: None,
            }],
        }
    }

    #[test]
    fn seat_booked_increments_occupied_and_decrements_available() {
        let mut state = empty_state();
        let student = Uuid::new_v4();
        let envelope = Envelope::new(
            BusEventType::SeatBooked,
            "CS101",
            Some(student),
            json!({ "seatNumber": "A1" }),
        );
        apply_incremental(&mut state, &envelope);
        assert!(state.seats[0].is_occupied);
        assert_eq!(state.occupied_seats, 1);
        assert_eq!(state.available_seats, 3);
    }

    #[test]
    fn seat_released_frees_the_seat() {
        let mut state = empty_state();
        state.seats[0].is_occupied = true;
        state.occupied_seats = 1;
        state.available_seats = 3;

        let envelope = Envelope::new(
            BusEventType::SeatReleased,
            "CS101",
            None,
            json!({ "seatNumber": "A1" }),
        );
        apply_incremental(&mut state, &envelope);
        assert!(!state.seats[0].is_occupied);
        assert_eq!(state.occupied_seats, 0);
        assert_eq!(state.available_seats, 4);
    }
}
