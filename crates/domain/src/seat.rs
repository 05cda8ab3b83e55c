//! SeatConfig and SeatBooking: the capacity and active-claim model of a
//! course's classroom.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Closed,
    Open,
    WaitlistOnly,
    Started,
    Completed,
}

/// The capacity and state envelope of a course's room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatConfig {
    pub course_id: String,
    pub rows: u32,
    pub seats_per_row: u32,
    pub booking_status: BookingStatus,
    pub booking_opens_at: Option<DateTime<Utc>>,
    pub booking_closes_at: Option<DateTime<Utc>>,
}

impl SeatConfig {
    pub fn new(course_id: impl Into<String>, rows: u32, seats_per_row: u32) -> Self {
        Self {
            course_id: course_id.into(),
            rows,
            seats_per_row,
            booking_status: BookingStatus::Closed,
            booking_opens_at: None,
            booking_closes_at: None,
        }
    }

    pub fn total_seats(&self) -> u32 {
        self.rows * self.seats_per_row
    }

    /// Seat labels in canonical order: row A..{rows}, column 1..{seats_per_row}.
    pub fn seat_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.total_seats() as usize);
        for row in 0..self.rows {
            let row_letter = row_index_to_letters(row);
            for col in 1..=self.seats_per_row {
                labels.push(format!("{row_letter}{col}"));
            }
        }
        labels
    }
}

/// Converts a 0-based row index to spreadsheet-style letters (A, B, ..., Z, AA, ...).
/// The seeded configs never exceed 13 rows, but the conversion is general.
fn row_index_to_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    loop {
        let rem = (index % 26) as u8;
        letters.push(b'A' + rem);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii uppercase letters")
}

/// A parsed seat identifier: case-insensitive `^[A-Z]+[0-9]+$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatAddress {
    pub row: u32,
    pub column: u32,
}

/// Parses a seat number into (row, column). Row letters map to a 0-based
/// row index using the same base-26 scheme as `row_index_to_letters`.
pub fn parse_seat_number(seat_number: &str) -> Result<SeatAddress, DomainError> {
    let upper = seat_number.to_ascii_uppercase();
    let split_at = upper.find(|c: char| c.is_ascii_digit());
    let Some(split_at) = split_at else {
        return Err(DomainError::InputInvalid(format!(
            "seat number '{seat_number}' has no column digits"
        )));
    };
    let (letters, digits) = upper.split_at(split_at);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(DomainError::InputInvalid(format!(
            "seat number '{seat_number}' has no row letters"
        )));
    }
    let column: u32 = digits.parse().map_err(|_| {
        DomainError::InputInvalid(format!("seat number '{seat_number}' has an invalid column"))
    })?;
    if column == 0 {
        return Err(DomainError::InputInvalid(format!(
            "seat number '{seat_number}' column must be 1-based"
        )));
    }
    let mut row: u32 = 0;
    for b in letters.bytes() {
        row = row * 26 + (b - b'A') as u32 + 1;
    }
    Ok(SeatAddress {
        row: row - 1,
        column,
    })
}

/// An active claim on a seat by a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatBooking {
    pub id: Uuid,
    pub course_id: String,
    pub student_id: Uuid,
    pub seat_number: String,
    pub row: u32,
    pub column: u32,
    pub is_active: bool,
    pub booked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_labels_are_canonical_order() {
        let cfg = SeatConfig::new("CS101", 2, 2);
        assert_eq!(cfg.seat_labels(), vec!["A1", "A2", "B1", "B2"]);
    }

    #[test]
    fn parses_simple_seat_number() {
        let addr = parse_seat_number("A1").unwrap();
        assert_eq!(addr, SeatAddress { row: 0, column: 1 });
        let addr = parse_seat_number("b2").unwrap();
        assert_eq!(addr, SeatAddress { row: 1, column: 2 });
    }

    #[test]
    fn rejects_malformed_seat_numbers() {
        assert!(parse_seat_number("1A").is_err());
        assert!(parse_seat_number("A0").is_err());
        assert!(parse_seat_number("A").is_err());
        assert!(parse_seat_number("").is_err());
    }
}
