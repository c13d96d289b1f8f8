use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::catalog::{MemoryCatalog, find_template};
use crate::clock::SystemClock;
use crate::db::SqliteStorage;
use crate::session::{HistoryRecord, SessionManager};
use crate::store;
use crate::timer::{format_elapsed, format_rest};
use crate::uniffi_interface::errors::FitError;
use crate::uniffi_interface::objects::{
    ActiveWorkoutState, SetFieldKind, TemplateExerciseInput, WorkoutHistoryEntry,
    template_from_inputs,
};

type Manager = SessionManager<SqliteStorage, SystemClock>;

#[derive(uniffi::Object)]
pub struct WorkoutTracker {
    manager: Mutex<Manager>,
}

impl WorkoutTracker {
    fn lock(&self) -> Result<MutexGuard<'_, Manager>, FitError> {
        self.manager
            .lock()
            .map_err(|_| FitError::Common("workout tracker lock poisoned".to_string()))
    }

    fn state_of(manager: &Manager) -> Result<ActiveWorkoutState, FitError> {
        Ok(ActiveWorkoutState::new(
            manager.session()?,
            manager.elapsed_time()?,
            manager.rest_elapsed(),
            manager.rest_timer_running(),
        ))
    }
}

#[uniffi::export]
impl WorkoutTracker {
    /// Opens the store at `db_path` and resumes any workout left in it.
    #[uniffi::constructor]
    pub fn new(db_path: String) -> Result<Arc<Self>, FitError> {
        let storage = SqliteStorage::open(&db_path)?;
        let manager = SessionManager::open(storage, SystemClock)?;
        Ok(Arc::new(Self {
            manager: Mutex::new(manager),
        }))
    }

    pub fn active_state(&self) -> Result<Option<ActiveWorkoutState>, FitError> {
        let manager = self.lock()?;
        if manager.active().is_none() {
            return Ok(None);
        }
        Ok(Some(Self::state_of(&manager)?))
    }

    pub fn start_workout(
        &self,
        workout_id: String,
        exercises: Vec<TemplateExerciseInput>,
    ) -> Result<ActiveWorkoutState, FitError> {
        let template = template_from_inputs(workout_id, exercises);
        let mut manager = self.lock()?;
        manager.start(&template)?;
        Self::state_of(&manager)
    }

    /// Starts a template saved in the store, refreshing exercise names from
    /// the stored catalog.
    pub fn start_saved_workout(&self, workout_id: String) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        let template = find_template(manager.storage(), &workout_id)?
            .ok_or_else(|| FitError::Common(format!("workout {} not found", workout_id)))?;
        let catalog = MemoryCatalog::load(manager.storage())?;
        debug!("Starting saved workout {}", workout_id);
        manager.start_with_catalog(&template, &catalog)?;
        Self::state_of(&manager)
    }

    pub fn select_exercise(&self, index: u32) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        manager.select_exercise(index as usize)?;
        Self::state_of(&manager)
    }

    pub fn update_set_field(
        &self,
        exercise_index: u32,
        set_index: u32,
        field: SetFieldKind,
        raw_value: String,
    ) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        manager.update_set_field(
            exercise_index as usize,
            set_index as usize,
            field.into(),
            &raw_value,
        )?;
        Self::state_of(&manager)
    }

    pub fn toggle_set_completion(
        &self,
        exercise_index: u32,
        set_index: u32,
    ) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        manager.toggle_set_completion(exercise_index as usize, set_index as usize)?;
        Self::state_of(&manager)
    }

    pub fn add_set(&self, exercise_index: u32) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        manager.add_set(exercise_index as usize)?;
        Self::state_of(&manager)
    }

    pub fn move_set(
        &self,
        exercise_index: u32,
        from: u32,
        to: u32,
    ) -> Result<ActiveWorkoutState, FitError> {
        let mut manager = self.lock()?;
        manager.move_set(exercise_index as usize, from as usize, to as usize)?;
        Self::state_of(&manager)
    }

    pub fn elapsed_time(&self) -> Result<String, FitError> {
        Ok(format_elapsed(self.lock()?.elapsed_time()?))
    }

    pub fn rest_elapsed(&self) -> Result<String, FitError> {
        Ok(format_rest(self.lock()?.rest_elapsed()))
    }

    pub fn reset_rest_timer(&self) -> Result<(), FitError> {
        self.lock()?.reset_rest_timer();
        Ok(())
    }

    pub fn finish(&self) -> Result<WorkoutHistoryEntry, FitError> {
        let record = self.lock()?.finish()?;
        Ok(WorkoutHistoryEntry::from(&record))
    }

    pub fn discard(&self) -> Result<(), FitError> {
        self.lock()?.discard()?;
        Ok(())
    }

    pub fn last_completed(&self) -> Result<Option<WorkoutHistoryEntry>, FitError> {
        let manager = self.lock()?;
        let record: Option<HistoryRecord> = store::last_completed(manager.storage())?;
        Ok(record.as_ref().map(WorkoutHistoryEntry::from))
    }

    pub fn history(&self) -> Result<Vec<WorkoutHistoryEntry>, FitError> {
        let manager = self.lock()?;
        Ok(store::history(manager.storage())?
            .iter()
            .map(WorkoutHistoryEntry::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_runs_a_workout_against_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        let tracker = WorkoutTracker::new(path.to_str().unwrap().to_string()).unwrap();
        assert!(tracker.active_state().unwrap().is_none());
        assert!(matches!(tracker.finish(), Err(FitError::NoActiveWorkout)));

        tracker
            .start_workout(
                "wo_ffi".into(),
                vec![TemplateExerciseInput {
                    id: "ex_dl".into(),
                    name: "Deadlift".into(),
                    muscle_group: "back".into(),
                    target_reps: None,
                }],
            )
            .unwrap();
        tracker
            .update_set_field(0, 0, SetFieldKind::Weight, "140".into())
            .unwrap();
        tracker
            .update_set_field(0, 0, SetFieldKind::Reps, "3".into())
            .unwrap();
        let state = tracker.toggle_set_completion(0, 0).unwrap();
        assert!(state.resting);
        assert!(matches!(
            tracker.select_exercise(1),
            Err(FitError::OutOfRange(_))
        ));

        let resumed = WorkoutTracker::new(path.to_str().unwrap().to_string()).unwrap();
        let state = resumed.active_state().unwrap().unwrap();
        assert_eq!(state.exercises[0].sets[0].actual_weight, Some(140.0));
        assert!(!state.resting);

        let entry = resumed.finish().unwrap();
        assert_eq!(entry.total_volume, 420.0);
        assert_eq!(entry.total_reps, 3);
        assert_eq!(resumed.history().unwrap().len(), 1);
        assert_eq!(resumed.last_completed().unwrap().unwrap().id, entry.id);
        resumed.discard().unwrap();
    }
}
