//! Read-only exercise catalog and workout templates.
//!
//! Catalog and template editing live outside this crate; the session core only
//! reads them when a workout is started.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::session::ExerciseRef;
use crate::store::{EXERCISES_KEY, Storage, WORKOUTS_KEY, load_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Exercise {
    pub fn to_ref(&self) -> ExerciseRef {
        ExerciseRef {
            id: self.id.clone(),
            name: self.name.clone(),
            muscle_group: self.muscle_group.clone(),
        }
    }
}

pub trait Catalog {
    fn list(&self) -> Vec<Exercise>;
    fn get_by_id(&self, id: &str) -> Option<Exercise>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    exercises: Vec<Exercise>,
}

impl MemoryCatalog {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }

    pub fn load<S: Storage + ?Sized>(storage: &S) -> Result<Self> {
        Ok(Self::new(
            load_json(storage, EXERCISES_KEY)?.unwrap_or_default(),
        ))
    }
}

impl Catalog for MemoryCatalog {
    fn list(&self) -> Vec<Exercise> {
        self.exercises.clone()
    }

    fn get_by_id(&self, id: &str) -> Option<Exercise> {
        self.exercises.iter().find(|e| e.id == id).cloned()
    }
}

/// One planned set in a template, e.g. `{"reps": "6-8"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub reps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<Vec<TemplateSet>>,
}

impl TemplateExercise {
    pub fn exercise_ref(&self) -> ExerciseRef {
        ExerciseRef {
            id: self.id.clone(),
            name: self.name.clone(),
            muscle_group: self.muscle_group.clone(),
        }
    }
}

impl From<&Exercise> for TemplateExercise {
    fn from(e: &Exercise) -> Self {
        TemplateExercise {
            id: e.id.clone(),
            name: e.name.clone(),
            muscle_group: e.muscle_group.clone(),
            sets: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<TemplateExercise>,
}

impl WorkoutTemplate {
    /// Builds a template from catalog exercise ids, in the given order.
    pub fn from_catalog<C: Catalog + ?Sized>(
        id: &str,
        name: &str,
        exercise_ids: &[&str],
        catalog: &C,
    ) -> Result<Self, SessionError> {
        let exercises = exercise_ids
            .iter()
            .map(|exercise_id| {
                catalog
                    .get_by_id(exercise_id)
                    .map(|e| TemplateExercise::from(&e))
                    .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            exercises,
        })
    }
}

pub fn load_templates<S: Storage + ?Sized>(storage: &S) -> Result<Vec<WorkoutTemplate>> {
    Ok(load_json(storage, WORKOUTS_KEY)?.unwrap_or_default())
}

pub fn find_template<S: Storage + ?Sized>(storage: &S, id: &str) -> Result<Option<WorkoutTemplate>> {
    Ok(load_templates(storage)?.into_iter().find(|t| t.id == id))
}
