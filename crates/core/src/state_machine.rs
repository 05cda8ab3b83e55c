//! The course's booking-status transitions and apply-gating matrix (§4.3).

use registration_domain::BookingStatus;
use registration_domain::errors::DomainError;

/// What `apply` should do in the current state, absent `autoRegister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyRoute {
    BookDirect,
    EnqueueWaitlist,
    Reject,
}

/// Decides the apply route per the §4.3 gating matrix.
pub fn apply_route(status: BookingStatus, seats_available: bool, auto_register: bool) -> ApplyRoute {
    if auto_register {
        return ApplyRoute::EnqueueWaitlist;
    }
    match status {
        BookingStatus::Closed => ApplyRoute::EnqueueWaitlist,
        BookingStatus::Open if seats_available => ApplyRoute::BookDirect,
        BookingStatus::Open => ApplyRoute::EnqueueWaitlist,
        BookingStatus::WaitlistOnly => ApplyRoute::EnqueueWaitlist,
        BookingStatus::Started => ApplyRoute::EnqueueWaitlist,
        BookingStatus::Completed => ApplyRoute::Reject,
    }
}

/// Validates that `bookSeat` (an explicit seat choice) is permitted in the
/// current status. WAITLIST_ONLY redirects to enqueue rather than erroring;
/// callers should treat `Ok(false)` as "fall back to waitlist enqueue".
pub fn book_seat_allowed(status: BookingStatus) -> Result<bool, DomainError> {
    match status {
        BookingStatus::Open | BookingStatus::Closed | BookingStatus::Started => Ok(true),
        BookingStatus::WaitlistOnly => Ok(false),
        BookingStatus::Completed => Err(DomainError::CourseCompleted(
            "course has completed; bookings are no longer accepted".to_string(),
        )),
    }
}

/// Validates a manual status transition, returning the new status or a
/// StateViolation naming the rejected edge.
pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, DomainError> {
    use BookingStatus::*;
    let allowed = matches!(
        (from, to),
        (Closed, Open)
            | (Closed, WaitlistOnly)
            | (Open, WaitlistOnly)
            | (Open, Started)
            | (WaitlistOnly, Started)
            | (Started, Completed)
    );
    if allowed {
        Ok(to)
    } else {
        Err(DomainError::StateViolation(format!(
            "cannot transition booking status from {from:?} to {to:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn open_with_free_seats_books_directly() {
        assert_eq!(apply_route(Open, true, false), ApplyRoute::BookDirect);
    }

    #[test]
    fn open_without_free_seats_enqueues() {
        assert_eq!(apply_route(Open, false, false), ApplyRoute::EnqueueWaitlist);
    }

    #[test]
    fn auto_register_always_enqueues_even_when_open_with_seats() {
        assert_eq!(apply_route(Open, true, true), ApplyRoute::EnqueueWaitlist);
    }

    #[test]
    fn closed_always_enqueues() {
        assert_eq!(apply_route(Closed, true, false), ApplyRoute::EnqueueWaitlist);
    }

    #[test]
    fn completed_rejects() {
        assert_eq!(apply_route(Completed, true, false), ApplyRoute::Reject);
    }

    #[test]
    fn book_seat_allowed_in_closed_and_started() {
        assert!(book_seat_allowed(Closed).unwrap());
        assert!(book_seat_allowed(Started).unwrap());
        assert!(book_seat_allowed(Open).unwrap());
    }

    #[test]
    fn book_seat_falls_back_to_waitlist_in_waitlist_only() {
        assert!(!book_seat_allowed(WaitlistOnly).unwrap());
    }

    #[test]
    fn book_seat_rejected_when_completed() {
        assert!(book_seat_allowed(Completed).is_err());
    }

    #[test]
    fn valid_transitions_succeed() {
        assert_eq!(transition(Closed, Open).unwrap(), Open);
        assert_eq!(transition(Open, WaitlistOnly).unwrap(), WaitlistOnly);
        assert_eq!(transition(WaitlistOnly, Started).unwrap(), Started);
        assert_eq!(transition(Started, Completed).unwrap(), Completed);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        assert!(transition(Completed, Open).is_err());
        assert!(transition(Open, Closed).is_err());
    }
}
