//! Computes the composite priority score for a (student, course, appliedAt)
//! triple.

use chrono::{DateTime, Utc};

use registration_domain::{Course, Student, waitlist::ScoreComponents};

#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub gpa: f64,
    pub interest: f64,
    pub time: f64,
    pub year: f64,
    pub prereq: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            gpa: 0.35,
            interest: 0.30,
            time: 0.20,
            year: 0.10,
            prereq: 0.05,
        }
    }
}

impl ScoringWeights {
    fn sum(&self) -> f64 {
        self.gpa + self.interest + self.time + self.year + self.prereq
    }

    /// Warns (per §4.1) when the weights deviate from a unit sum by more
    /// than the documented tolerance; never fails, since mis-weighted
    /// scoring is a soft configuration concern, not a correctness one.
    pub fn validate(&self) {
        let deviation = (self.sum() - 1.0).abs();
        if deviation > 0.01 {
            tracing::warn!(
                sum = self.sum(),
                deviation,
                "scoring weights deviate from 1.0 by more than the 0.01 tolerance"
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    pub weights: ScoringWeights,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        weights.validate();
        Self { weights }
    }
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        weights.validate();
        Self { weights }
    }

    /// Computes the full component breakdown and the weighted composite.
    pub fn score(&self, student: &Student, course: &Course, applied_at: DateTime<Utc>) -> (ScoreComponents, f64) {
        let components = ScoreComponents {
            gpa_score: gpa_score(student, course),
            interest_score: interest_score(student, course),
            time_score: time_score(course, applied_at),
            year_score: year_score(student, course),
            prereq_score: prereq_score(student, course),
        };

        let composite = self.weights.gpa * components.gpa_score
            + self.weights.interest * components.interest_score
            + self.weights.time * components.time_score
            + self.weights.year * components.year_score
            + self.weights.prereq * components.prereq_score;

        (components, composite)
    }
}

fn gpa_score(student: &Student, course: &Course) -> f64 {
    if student.gpa < course.min_gpa_recommended {
        return 0.0;
    }
    let base = student.gpa / 4.0;
    let bonus = (0.05 * (student.gpa - course.min_gpa_recommended)).min(0.10);
    (base + bonus).min(1.0)
}

fn interest_score(student: &Student, course: &Course) -> f64 {
    let mut student_set: std::collections::HashSet<String> = student
        .interests
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    student_set.insert(student.branch.to_lowercase());

    let course_set: std::collections::HashSet<String> =
        course.keywords.iter().map(|s| s.to_lowercase()).collect();

    if student_set.is_empty() || course_set.is_empty() {
        return 0.5;
    }

    let intersection = student_set.intersection(&course_set).count();
    let union = student_set.union(&course_set).count();
    if union == 0 {
        0.5
    } else {
        intersection as f64 / union as f64
    }
}

fn time_score(course: &Course, applied_at: DateTime<Utc>) -> f64 {
    let delta_hours = match course.seat_config.booking_opens_at {
        Some(opens_at) => (applied_at - opens_at).num_milliseconds() as f64 / 3_600_000.0,
        None => 0.0,
    };
    let value = (-std::f64::consts::LN_2 * delta_hours / 168.0).exp();
    value.clamp(0.0, 1.0)
}

fn year_score(student: &Student, course: &Course) -> f64 {
    let preferred = course.preferred_years();
    if preferred.contains(&student.year_of_study) {
        return 1.0;
    }
    let adjacent = preferred
        .iter()
        .any(|&y| (y as i16 - student.year_of_study as i16).abs() == 1);
    if adjacent { 0.5 } else { 0.25 }
}

fn prereq_score(student: &Student, course: &Course) -> f64 {
    if course.prerequisites.is_empty() {
        return 1.0;
    }
    let completed = course
        .prerequisites
        .iter()
        .filter(|p| student.completed_courses.contains(*p))
        .count();
    completed as f64 / course.prerequisites.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use registration_domain::{Course, Difficulty, SeatConfig, Student};
    use std::collections::HashSet;

    fn course(min_gpa: f64, difficulty: Difficulty, prereqs: Vec<&str>, keywords: Vec<&str>) -> Course {
        Course {
            id: "CS101".to_string(),
            name: "Intro".to_string(),
            category: "core".to_string(),
            difficulty,
            min_gpa_recommended: min_gpa,
            prerequisites: prereqs.into_iter().map(String::from).collect(),
            keywords: keywords.into_iter().map(String::from).collect(),
            weekdays: HashSet::new(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            seat_config: SeatConfig::new("CS101", 2, 2),
        }
    }

    #[test]
    fn gpa_exactly_at_minimum_is_positive_not_zero() {
        let student = Student::new("R1", "r1@x.edu", 3.0, 2, "CSE");
        let course = course(3.0, Difficulty::Beginner, vec![], vec![]);
        assert!(gpa_score(&student, &course) > 0.0);
    }

    #[test]
    fn gpa_below_minimum_is_zero() {
        let student = Student::new("R1", "r1@x.edu", 2.5, 2, "CSE");
        let course = course(3.0, Difficulty::Beginner, vec![], vec![]);
        assert_eq!(gpa_score(&student, &course), 0.0);
    }

    #[test]
    fn time_score_at_one_week_is_half() {
        let mut course = course(0.0, Difficulty::Beginner, vec![], vec![]);
        let opened = Utc::now() - chrono::Duration::hours(168);
        course.seat_config.booking_opens_at = Some(opened);
        let score = time_score(&course, Utc::now());
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn prereq_score_full_when_no_prerequisites() {
        let student = Student::new("R1", "r1@x.edu", 3.0, 2, "CSE");
        let course = course(0.0, Difficulty::Beginner, vec![], vec![]);
        assert_eq!(prereq_score(&student, &course), 1.0);
    }

    #[test]
    fn empty_interest_sets_default_to_half() {
        let mut student = Student::new("R1", "r1@x.edu", 3.0, 2, "");
        student.branch = "".to_string();
        let course = course(0.0, Difficulty::Beginner, vec![], vec![]);
        assert_eq!(interest_score(&student, &course), 0.5);
    }

    #[test]
    fn weights_default_sums_to_one() {
        ScoringWeights::default().validate();
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 0.01);
    }
}
