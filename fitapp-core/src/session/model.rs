use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{TemplateExercise, WorkoutTemplate};
use crate::error::{IndexKind, Result, SessionError};
use crate::timer::whole_seconds_between;

pub const DEFAULT_TARGET_REPS: &str = "6-8";
pub const DEFAULT_SET_COUNT: usize = 2;
const FALLBACK_REP_PLACEHOLDER: &str = "8";

/// Exercise identity copied into a session when it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub muscle_group: String,
}

/// One set of an exercise. Un-completing a set keeps the entered actuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    #[serde(alias = "reps")]
    pub target_reps: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub actual_weight: Option<f64>,
    #[serde(default)]
    pub actual_reps: Option<u32>,
}

impl SetRecord {
    pub fn new(target_reps: &str) -> Self {
        Self {
            target_reps: target_reps.to_string(),
            completed: false,
            actual_weight: None,
            actual_reps: None,
        }
    }

    /// Upper end of the target scheme, shown as the reps hint ("6-8" gives "8").
    pub fn rep_placeholder(&self) -> &str {
        let target = self.target_reps.trim();
        match target.split_once('-') {
            Some((_, upper)) if !upper.trim().is_empty() => upper.trim(),
            Some(_) => FALLBACK_REP_PLACEHOLDER,
            None if target.is_empty() => FALLBACK_REP_PLACEHOLDER,
            None => target,
        }
    }

    pub fn apply(&mut self, value: SetValue) {
        match value {
            SetValue::Weight(weight) => self.actual_weight = weight,
            SetValue::Reps(reps) => self.actual_reps = reps,
        }
    }

    /// Weight and reps, if this set counts towards the workout totals.
    pub fn counted_work(&self) -> Option<(f64, u32)> {
        if !self.completed {
            return None;
        }
        Some((self.actual_weight?, self.actual_reps?))
    }
}

impl Default for SetRecord {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_REPS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Weight,
    Reps,
}

/// An already-validated value for one of a set's actual fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetValue {
    Weight(Option<f64>),
    Reps(Option<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetProgress {
    pub current: usize,
    pub total: usize,
}

impl fmt::Display for SetProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Set {} of {}", self.current, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    #[serde(flatten)]
    pub exercise: ExerciseRef,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

impl ExerciseEntry {
    pub fn new(exercise: ExerciseRef, sets: Vec<SetRecord>) -> Self {
        Self { exercise, sets }
    }

    pub fn with_default_sets(exercise: ExerciseRef) -> Self {
        Self::new(exercise, vec![SetRecord::default(); DEFAULT_SET_COUNT])
    }

    fn from_template(template: &TemplateExercise, exercise: ExerciseRef) -> Self {
        match &template.sets {
            Some(sets) => Self::new(exercise, sets.iter().map(|s| SetRecord::new(&s.reps)).collect()),
            None => Self::with_default_sets(exercise),
        }
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    /// True when every set is completed. An exercise without sets is not.
    pub fn is_completed(&self) -> bool {
        !self.sets.is_empty() && self.sets.iter().all(|s| s.completed)
    }

    pub fn set_progress(&self) -> SetProgress {
        let total = self.sets.len();
        SetProgress {
            current: (self.completed_sets() + 1).min(total.max(1)),
            total,
        }
    }

    pub fn set(&self, index: usize) -> Result<&SetRecord> {
        let len = self.sets.len();
        self.sets
            .get(index)
            .ok_or(SessionError::out_of_range(IndexKind::Set, index, len))
    }

    pub fn set_mut(&mut self, index: usize) -> Result<&mut SetRecord> {
        let len = self.sets.len();
        self.sets
            .get_mut(index)
            .ok_or(SessionError::out_of_range(IndexKind::Set, index, len))
    }
}

/// The in-progress workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub workout_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub current_exercise_index: usize,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

impl Session {
    pub fn from_template(template: &WorkoutTemplate, started_at: DateTime<Utc>) -> Self {
        Self::from_template_with(template, started_at, TemplateExercise::exercise_ref)
    }

    /// Materializes a session, resolving each exercise's identity with `resolve`.
    pub fn from_template_with<F>(
        template: &WorkoutTemplate,
        started_at: DateTime<Utc>,
        resolve: F,
    ) -> Self
    where
        F: Fn(&TemplateExercise) -> ExerciseRef,
    {
        Self {
            workout_id: template.id.clone(),
            started_at,
            current_exercise_index: 0,
            exercises: template
                .exercises
                .iter()
                .map(|e| ExerciseEntry::from_template(e, resolve(e)))
                .collect(),
        }
    }

    pub fn current_exercise(&self) -> Option<&ExerciseEntry> {
        self.exercises.get(self.current_exercise_index)
    }

    pub fn exercise(&self, index: usize) -> Result<&ExerciseEntry> {
        let len = self.exercises.len();
        self.exercises
            .get(index)
            .ok_or(SessionError::out_of_range(IndexKind::Exercise, index, len))
    }

    pub fn exercise_mut(&mut self, index: usize) -> Result<&mut ExerciseEntry> {
        let len = self.exercises.len();
        self.exercises
            .get_mut(index)
            .ok_or(SessionError::out_of_range(IndexKind::Exercise, index, len))
    }

    pub fn set_mut(&mut self, exercise_index: usize, set_index: usize) -> Result<&mut SetRecord> {
        self.exercise_mut(exercise_index)?.set_mut(set_index)
    }

    /// Time since the workout started, floored to whole seconds.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        whole_seconds_between(self.started_at, now)
    }
}
