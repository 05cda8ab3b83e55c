//! Course entity and its owned SeatConfig.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::seat::SeatConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A course and the single SeatConfig it exclusively owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub min_gpa_recommended: f64,
    /// Ordered set of external course ids; order is admission-hint only.
    pub prerequisites: Vec<String>,
    pub keywords: HashSet<String>,
    pub weekdays: HashSet<String>,
    pub start_time: String,
    pub end_time: String,
    pub seat_config: SeatConfig,
}

impl Course {
    /// Preferred years of study by difficulty, per the scoring engine's yearScore table.
    pub fn preferred_years(&self) -> &'static [u8] {
        match self.difficulty {
            Difficulty::Beginner => &[1, 2],
            Difficulty::Intermediate => &[2, 3],
            Difficulty::Advanced => &[3, 4],
        }
    }
}

/// Lightweight course summary used by `GET /courses`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub booking_status: crate::seat::BookingStatus,
    pub total_seats: u32,
    pub occupied_seats: u32,
    pub available_seats: u32,
}

/// Marker timestamp type alias kept for readability at call sites.
pub type Timestamp = DateTime<Utc>;
