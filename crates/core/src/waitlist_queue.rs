//! An in-process per-course waitlist queue. Instances of this type are
//! only ever touched from inside the owning course's actor mailbox (see
//! `course_actor`), so `pop_top`'s "compare-and-swap" requirement falls out
//! of single-threaded access rather than needing an explicit CAS loop.

use chrono::Utc;
use uuid::Uuid;

use registration_domain::waitlist::{ScoreComponents, WaitlistEntry, WaitlistStatus};

#[derive(Debug, Default)]
pub struct WaitlistQueue {
    entries: Vec<WaitlistEntry>,
}

impl WaitlistQueue {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn load(entries: Vec<WaitlistEntry>) -> Self {
        Self { entries }
    }

    /// Upserts a WAITING entry for (student, course) and returns it plus its
    /// 1-indexed rank among WAITING entries.
    pub fn enqueue(
        &mut self,
        course_id: &str,
        student_id: Uuid,
        preferred_seat: Option<String>,
        components: ScoreComponents,
        composite_score: f64,
    ) -> (WaitlistEntry, usize) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.student_id == student_id && !e.status.is_terminal())
        {
            existing.preferred_seat = preferred_seat;
            existing.components = components;
            existing.composite_score = composite_score;
            existing.status = WaitlistStatus::Waiting;
            let entry = existing.clone();
            return (entry.clone(), self.position_of(&entry.id));
        }

        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            course_id: course_id.to_string(),
            student_id,
            applied_at: Utc::now(),
            preferred_seat,
            components,
            composite_score,
            status: WaitlistStatus::Waiting,
        };
        self.entries.push(entry.clone());
        (entry.clone(), self.position_of(&entry.id))
    }

    /// WAITING -> CANCELLED. Idempotent; returns whether a change occurred.
    pub fn cancel(&mut self, student_id: Uuid) -> bool {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.student_id == student_id && e.status == WaitlistStatus::Waiting)
        {
            entry.status = WaitlistStatus::Cancelled;
            true
        } else {
            false
        }
    }

    /// Up to `n` WAITING entries in priority order, without mutation.
    pub fn peek_top(&self, n: usize) -> Vec<WaitlistEntry> {
        let mut waiting: Vec<&WaitlistEntry> = self
            .entries
            .iter()
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .collect();
        waiting.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));
        waiting.into_iter().take(n).cloned().collect()
    }

    /// Picks the highest-priority WAITING entry and moves it to PROCESSING.
    pub fn pop_top(&mut self) -> Option<WaitlistEntry> {
        let top_id = {
            let mut waiting: Vec<&WaitlistEntry> = self
                .entries
                .iter()
                .filter(|e| e.status == WaitlistStatus::Waiting)
                .collect();
            waiting.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));
            waiting.first().map(|e| e.id)
        }?;

        let entry = self.entries.iter_mut().find(|e| e.id == top_id)?;
        entry.status = WaitlistStatus::Processing;
        Some(entry.clone())
    }

    pub fn mark_allocated(&mut self, entry_id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.status = WaitlistStatus::Allocated;
        }
    }

    pub fn revert_to_waiting(&mut self, entry_id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.status = WaitlistStatus::Waiting;
        }
    }

    pub fn size(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .count()
    }

    pub fn get(&self, student_id: Uuid) -> Option<&WaitlistEntry> {
        self.entries
            .iter()
            .find(|e| e.student_id == student_id && !e.status.is_terminal())
    }

    pub fn get_by_id(&self, entry_id: Uuid) -> Option<&WaitlistEntry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    fn position_of(&self, entry_id: &Uuid) -> usize {
        let mut waiting: Vec<&WaitlistEntry> = self
            .entries
            .iter()
            .filter(|e| e.status == WaitlistStatus::Waiting)
            .collect();
        waiting.sort_by(|a, b| b.priority_key().cmp(&a.priority_key()));
        waiting
            .iter()
            .position(|e| &e.id == entry_id)
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> ScoreComponents {
        ScoreComponents::default()
    }

    #[test]
    fn enqueue_assigns_rank_by_composite_score() {
        let mut queue = WaitlistQueue::new();
        let low = Uuid::new_v4();
        let high = Uuid::new_v4();
        queue.enqueue("CS101", low, None, components(), 0.3);
        let (_, position) = queue.enqueue("CS101", high, None, components(), 0.9);
        assert_eq!(position, 1);
    }

    #[test]
    fn pop_top_transitions_to_processing_and_is_not_popped_twice() {
        let mut queue = WaitlistQueue::new();
        let student = Uuid::new_v4();
        queue.enqueue("CS101", student, None, components(), 0.5);

        let popped = queue.pop_top().unwrap();
        assert_eq!(popped.student_id, student);
        assert!(queue.pop_top().is_none());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut queue = WaitlistQueue::new();
        let student = Uuid::new_v4();
        queue.enqueue("CS101", student, None, components(), 0.5);
        assert!(queue.cancel(student));
        assert!(!queue.cancel(student));
    }

    #[test]
    fn revert_to_waiting_makes_entry_visible_to_pop_top_again() {
        let mut queue = WaitlistQueue::new();
        let student = Uuid::new_v4();
        queue.enqueue("CS101", student, None, components(), 0.5);
        let popped = queue.pop_top().unwrap();
        queue.revert_to_waiting(popped.id);
        assert!(queue.pop_top().is_some());
    }
}
