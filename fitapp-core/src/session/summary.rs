//! Finished-workout records and the numbers shown after a workout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::model::{ExerciseEntry, Session};
use crate::timer::whole_seconds_between;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub volume: f64,
    pub reps: u64,
}

/// Volume and reps over completed sets that have both weight and reps.
pub fn compute_totals(exercises: &[ExerciseEntry]) -> Totals {
    exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter_map(|s| s.counted_work())
        .fold(Totals::default(), |acc, (weight, reps)| Totals {
            volume: acc.volume + weight * reps as f64,
            reps: acc.reps + reps as u64,
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub workout_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    #[serde(alias = "duration")]
    pub duration_seconds: u64,
    pub exercises: Vec<ExerciseEntry>,
    pub total_volume: f64,
    pub total_reps: u64,
}

impl HistoryRecord {
    pub fn from_session(session: &Session, ended_at: DateTime<Utc>) -> Self {
        let totals = compute_totals(&session.exercises);
        Self {
            id: format!("history_{}", Uuid::new_v4().simple()),
            workout_id: session.workout_id.clone(),
            started_at: session.started_at,
            ended_at,
            duration_seconds: whole_seconds_between(session.started_at, ended_at).as_secs(),
            exercises: session.exercises.clone(),
            total_volume: totals.volume,
            total_reps: totals.reps,
        }
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(ExerciseEntry::completed_sets).sum()
    }

    /// Distinct muscle groups in the order they first appear.
    pub fn muscle_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for exercise in &self.exercises {
            let group = &exercise.exercise.muscle_group;
            if !group.is_empty() && !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        groups
    }
}

/// `Hh Mm` for an hour or more, otherwise `M min`.
pub fn format_duration_summary(seconds: u64) -> String {
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let rem = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, rem)
    } else {
        format!("{} min", rem)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    pub duration: String,
    pub total_volume: f64,
    pub total_reps: u64,
    pub exercise_count: usize,
    pub completed_sets: usize,
    pub muscle_groups: Vec<String>,
}

impl From<&HistoryRecord> for CompletionSummary {
    fn from(record: &HistoryRecord) -> Self {
        CompletionSummary {
            duration: format_duration_summary(record.duration_seconds),
            total_volume: record.total_volume,
            total_reps: record.total_reps,
            exercise_count: record.exercises.len(),
            completed_sets: record.completed_sets(),
            muscle_groups: record.muscle_groups(),
        }
    }
}
