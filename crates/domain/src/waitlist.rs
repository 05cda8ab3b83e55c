//! WaitlistEntry: a pending claim ordered by composite priority score.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    Waiting,
    Processing,
    Allocated,
    Cancelled,
}

impl WaitlistStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WaitlistStatus::Allocated | WaitlistStatus::Cancelled)
    }
}

/// The five component scores that make up a composite priority score, kept
/// alongside the entry so `GET /waitlist` can show its breakdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ScoreComponents {
    pub gpa_score: f64,
    pub interest_score: f64,
    pub time_score: f64,
    pub year_score: f64,
    pub prereq_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub course_id: String,
    pub student_id: Uuid,
    pub applied_at: DateTime<Utc>,
    pub preferred_seat: Option<String>,
    pub components: ScoreComponents,
    pub composite_score: f64,
    pub status: WaitlistStatus,
}

impl WaitlistEntry {
    /// The strict total order of §4.2: `(compositeScore DESC, appliedAt ASC, id ASC)`.
    pub fn priority_key(&self) -> WaitlistPriorityKey {
        WaitlistPriorityKey {
            composite_score: self.composite_score,
            applied_at: self.applied_at,
            id: self.id,
        }
    }
}

/// Comparable projection of a WaitlistEntry used for ordering. Implements
/// `Ord` so a WAITING entry set can be held in a `BinaryHeap` or sorted
/// directly; higher priority compares as "greater".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitlistPriorityKey {
    pub composite_score: f64,
    pub applied_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Eq for WaitlistPriorityKey {}

impl PartialOrd for WaitlistPriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WaitlistPriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.composite_score
            .partial_cmp(&other.composite_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.applied_at.cmp(&self.applied_at))
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(score: f64, hours_ago: i64, id: Uuid) -> WaitlistPriorityKey {
        WaitlistPriorityKey {
            composite_score: score,
            applied_at: Utc::now() - chrono::Duration::hours(hours_ago),
            id,
        }
    }

    #[test]
    fn higher_composite_score_ranks_first() {
        let a = key(0.9, 1, Uuid::new_v4());
        let b = key(0.5, 1, Uuid::new_v4());
        assert!(a > b);
    }

    #[test]
    fn earlier_applied_at_breaks_score_ties() {
        let earlier = key(0.7, 10, Uuid::new_v4());
        let later = key(0.7, 1, Uuid::new_v4());
        assert!(earlier > later);
    }

    #[test]
    fn id_breaks_final_ties() {
        let now = Utc::now();
        let a = WaitlistPriorityKey {
            composite_score: 0.7,
            applied_at: now,
            id: Uuid::from_u128(1),
        };
        let b = WaitlistPriorityKey {
            composite_score: 0.7,
            applied_at: now,
            id: Uuid::from_u128(2),
        };
        assert!(a > b);
    }
}
