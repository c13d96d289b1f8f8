use std::time::Duration;

use crate::catalog::{TemplateExercise, TemplateSet, WorkoutTemplate};
use crate::session::{
    CompletionSummary, ExerciseEntry, HistoryRecord, Session, SetField, SetRecord,
};
use crate::timer::{format_elapsed, format_rest};

#[derive(Debug, Clone, uniffi::Enum)]
pub enum SetFieldKind {
    Weight,
    Reps,
}

impl From<SetFieldKind> for SetField {
    fn from(kind: SetFieldKind) -> Self {
        match kind {
            SetFieldKind::Weight => SetField::Weight,
            SetFieldKind::Reps => SetField::Reps,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SetEntry {
    pub target_reps: String,
    pub rep_placeholder: String,
    pub completed: bool,
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<u32>,
}

impl From<&SetRecord> for SetEntry {
    fn from(s: &SetRecord) -> Self {
        SetEntry {
            target_reps: s.target_reps.clone(),
            rep_placeholder: s.rep_placeholder().to_string(),
            completed: s.completed,
            actual_weight: s.actual_weight,
            actual_reps: s.actual_reps,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ExerciseState {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub completed: bool,
    pub progress: String,
    pub sets: Vec<SetEntry>,
}

impl From<&ExerciseEntry> for ExerciseState {
    fn from(e: &ExerciseEntry) -> Self {
        ExerciseState {
            id: e.exercise.id.clone(),
            name: e.exercise.name.clone(),
            muscle_group: e.exercise.muscle_group.clone(),
            completed: e.is_completed(),
            progress: e.set_progress().to_string(),
            sets: e.sets.iter().map(SetEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ActiveWorkoutState {
    pub workout_id: String,
    pub started_at: String,
    pub current_exercise_index: u32,
    pub exercises: Vec<ExerciseState>,
    pub elapsed: String,
    pub rest: String,
    pub resting: bool,
}

impl ActiveWorkoutState {
    pub fn new(session: &Session, elapsed: Duration, rest: Duration, resting: bool) -> Self {
        ActiveWorkoutState {
            workout_id: session.workout_id.clone(),
            started_at: session.started_at.to_rfc3339(),
            current_exercise_index: session.current_exercise_index as u32,
            exercises: session.exercises.iter().map(ExerciseState::from).collect(),
            elapsed: format_elapsed(elapsed),
            rest: format_rest(rest),
            resting,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutHistoryEntry {
    pub id: String,
    pub workout_id: String,
    pub started_at: String,
    pub ended_at: String,
    pub duration_seconds: u64,
    pub duration_text: String,
    pub total_volume: f64,
    pub total_reps: u64,
    pub exercise_count: u32,
    pub completed_sets: u32,
    pub muscle_groups: Vec<String>,
}

impl From<&HistoryRecord> for WorkoutHistoryEntry {
    fn from(r: &HistoryRecord) -> Self {
        let summary = CompletionSummary::from(r);
        WorkoutHistoryEntry {
            id: r.id.clone(),
            workout_id: r.workout_id.clone(),
            started_at: r.started_at.to_rfc3339(),
            ended_at: r.ended_at.to_rfc3339(),
            duration_seconds: r.duration_seconds,
            duration_text: summary.duration,
            total_volume: summary.total_volume,
            total_reps: summary.total_reps,
            exercise_count: summary.exercise_count as u32,
            completed_sets: summary.completed_sets as u32,
            muscle_groups: summary.muscle_groups,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct TemplateExerciseInput {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub target_reps: Option<Vec<String>>,
}

pub fn template_from_inputs(workout_id: String, inputs: Vec<TemplateExerciseInput>) -> WorkoutTemplate {
    WorkoutTemplate {
        id: workout_id,
        name: String::new(),
        exercises: inputs
            .into_iter()
            .map(|input| TemplateExercise {
                id: input.id,
                name: input.name,
                muscle_group: input.muscle_group,
                sets: input
                    .target_reps
                    .map(|reps| reps.into_iter().map(|reps| TemplateSet { reps }).collect()),
            })
            .collect(),
    }
}
