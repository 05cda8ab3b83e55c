//! Student entity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student's identity and academic/behavioural attributes. Immutable in
/// the core; other subsystems (admin CRUD, out of scope here) may mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub roll_number: String,
    pub email: String,
    /// GPA in [0, 4].
    pub gpa: f64,
    /// Year of study, 1..=5.
    pub year_of_study: u8,
    pub branch: String,
    pub interests: HashSet<String>,
    /// External course ids the student has completed.
    pub completed_courses: HashSet<String>,
}

impl Student {
    pub fn new(
        roll_number: impl Into<String>,
        email: impl Into<String>,
        gpa: f64,
        year_of_study: u8,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            roll_number: roll_number.into(),
            email: email.into(),
            gpa,
            year_of_study,
            branch: branch.into(),
            interests: HashSet::new(),
            completed_courses: HashSet::new(),
        }
    }
}
