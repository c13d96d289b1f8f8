//! Starting, finishing and discarding the active workout.

use log::{info, warn};

use crate::catalog::{Catalog, WorkoutTemplate};
use crate::clock::Clock;
use crate::error::Result;
use crate::session::SessionManager;
use crate::session::model::Session;
use crate::session::summary::HistoryRecord;
use crate::store::{self, ACTIVE_SESSION_KEY, Storage};

impl<S: Storage, C: Clock> SessionManager<S, C> {
    /// Starts a workout from `template`, replacing any active one without
    /// recording it.
    pub fn start(&mut self, template: &WorkoutTemplate) -> Result<&Session> {
        let session = Session::from_template(template, self.clock.now());
        self.begin(session)
    }

    /// Like [`start`](Self::start), but copies each exercise's current name and
    /// muscle group from the catalog. Exercises missing from the catalog keep
    /// the template's copy.
    pub fn start_with_catalog<K: Catalog + ?Sized>(
        &mut self,
        template: &WorkoutTemplate,
        catalog: &K,
    ) -> Result<&Session> {
        let session = Session::from_template_with(template, self.clock.now(), |exercise| {
            catalog
                .get_by_id(&exercise.id)
                .map(|e| e.to_ref())
                .unwrap_or_else(|| exercise.exercise_ref())
        });
        self.begin(session)
    }

    fn begin(&mut self, session: Session) -> Result<&Session> {
        if let Some(previous) = &self.active {
            warn!(
                "Replacing active workout {} started at {} without saving it",
                previous.workout_id, previous.started_at
            );
        }
        info!(
            "Starting workout {} with {} exercises",
            session.workout_id,
            session.exercises.len()
        );
        self.rest_timer.reset();
        self.commit(session)
    }

    /// Ends the active workout, records it in history and clears the slot.
    /// Nothing is stored and the workout stays active if any write fails.
    pub fn finish(&mut self) -> Result<HistoryRecord> {
        let record = HistoryRecord::from_session(self.session()?, self.clock.now());

        store::record_finished(&self.storage, &record)?;
        self.active = None;
        self.rest_timer.reset();

        info!(
            "Finished workout {} in {}s: volume {}, reps {}",
            record.workout_id, record.duration_seconds, record.total_volume, record.total_reps
        );
        Ok(record)
    }

    /// Drops the active workout without recording it. A no-op without one.
    pub fn discard(&mut self) -> Result<()> {
        self.storage.remove_item(ACTIVE_SESSION_KEY)?;
        self.rest_timer.reset();
        if let Some(session) = self.active.take() {
            info!("Discarded workout {}", session.workout_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Exercise, MemoryCatalog, TemplateExercise};
    use crate::session::manager::tests::{clock, started, template};
    use crate::session::{SetField, SetRecord};
    use crate::error::SessionError;
    use crate::store::{HISTORY_KEY, MemoryStorage, history, last_completed, load_json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Memory storage whose active slot can be made to refuse removal, the way
    /// a locked database would.
    #[derive(Clone, Default)]
    struct LockableSlotStorage {
        inner: MemoryStorage,
        slot_locked: Arc<AtomicBool>,
    }

    impl Storage for LockableSlotStorage {
        fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> anyhow::Result<()> {
            if key == ACTIVE_SESSION_KEY && self.slot_locked.load(Ordering::SeqCst) {
                anyhow::bail!("database is locked");
            }
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn start_builds_one_entry_per_exercise_with_two_default_sets() {
        let (storage, clock, manager) = started(&["Bench", "Incline Press", "Dips"]);
        let session = manager.session().unwrap();

        assert_eq!(session.exercises.len(), 3);
        assert_eq!(session.current_exercise_index, 0);
        assert_eq!(session.started_at, clock.now());
        for entry in &session.exercises {
            assert_eq!(entry.sets, vec![SetRecord::new("6-8"); 2]);
        }

        let persisted: Session = load_json(&storage, ACTIVE_SESSION_KEY).unwrap().unwrap();
        assert_eq!(&persisted, session);
    }

    #[test]
    fn empty_template_starts_an_empty_session() {
        let mut manager = SessionManager::new(MemoryStorage::new(), clock());
        let session = manager.start(&template(&[])).unwrap();
        assert!(session.exercises.is_empty());
        assert_eq!(session.current_exercise_index, 0);
        assert!(session.current_exercise().is_none());
    }

    #[test]
    fn second_start_overwrites_and_only_it_reaches_history() {
        let (storage, clock, mut manager) = started(&["Bench"]);
        manager.update_set_field(0, 0, SetField::Weight, "999").unwrap();

        clock.advance_secs(60);
        let mut second = template(&["Squat"]);
        second.id = "wo_second".into();
        manager.start(&second).unwrap();

        let persisted: Session = load_json(&storage, ACTIVE_SESSION_KEY).unwrap().unwrap();
        assert_eq!(persisted.workout_id, "wo_second");
        assert!(history(&storage).unwrap().is_empty());

        let record = manager.finish().unwrap();
        assert_eq!(record.workout_id, "wo_second");
        let records = history(&storage).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exercises[0].exercise.name, "Squat");
    }

    #[test]
    fn restarting_resets_the_rest_timer() {
        let (_storage, clock, mut manager) = started(&["Bench"]);
        manager.toggle_set_completion(0, 0).unwrap();
        clock.advance_secs(45);
        assert_eq!(manager.rest_elapsed(), Duration::from_secs(45));

        manager.start(&template(&["Squat"])).unwrap();
        assert!(!manager.rest_timer_running());
        assert_eq!(manager.rest_elapsed(), Duration::ZERO);
    }

    #[test]
    fn failed_finish_stores_nothing_and_can_be_retried() {
        let storage = LockableSlotStorage::default();
        let mut manager = SessionManager::new(storage.clone(), clock());
        manager.start(&template(&["Bench"])).unwrap();
        manager.toggle_set_completion(0, 0).unwrap();
        storage.slot_locked.store(true, Ordering::SeqCst);

        assert!(matches!(manager.finish(), Err(SessionError::Storage(_))));
        assert!(manager.active().is_some());
        assert!(manager.rest_timer_running());
        assert!(storage.get_item(ACTIVE_SESSION_KEY).unwrap().is_some());
        assert_eq!(storage.get_item(HISTORY_KEY).unwrap(), None);
        assert_eq!(last_completed(&storage).unwrap(), None);

        storage.slot_locked.store(false, Ordering::SeqCst);
        let record = manager.finish().unwrap();
        assert_eq!(history(&storage).unwrap(), vec![record.clone()]);
        assert_eq!(last_completed(&storage).unwrap(), Some(record));
        assert_eq!(storage.get_item(ACTIVE_SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn unreadable_history_blocks_finish_without_losing_the_workout() {
        let (storage, _clock, mut manager) = started(&["Bench"]);
        storage.set_item(HISTORY_KEY, "{broken").unwrap();

        let err = manager.finish().unwrap_err();
        assert!(err.to_string().contains(HISTORY_KEY));
        assert!(manager.active().is_some());
        assert!(storage.get_item(ACTIVE_SESSION_KEY).unwrap().is_some());
        assert_eq!(storage.get_item(HISTORY_KEY).unwrap().as_deref(), Some("{broken"));

        manager.discard().unwrap();
        assert!(manager.active().is_none());
    }

    #[test]
    fn finish_computes_totals_and_clears_the_slot() {
        let (storage, clock, mut manager) = started(&["Bench"]);
        manager.update_set_field(0, 0, SetField::Weight, "100").unwrap();
        manager.update_set_field(0, 0, SetField::Reps, "5").unwrap();
        manager.toggle_set_completion(0, 0).unwrap();
        manager.update_set_field(0, 1, SetField::Weight, "100").unwrap();
        manager.update_set_field(0, 1, SetField::Reps, "3").unwrap();
        clock.advance_secs(1800);

        let record = manager.finish().unwrap();
        assert_eq!(record.total_volume, 500.0);
        assert_eq!(record.total_reps, 5);
        assert_eq!(record.duration_seconds, 1800);
        assert_eq!(record.ended_at, clock.now());

        assert!(manager.active().is_none());
        assert!(!manager.rest_timer_running());
        assert_eq!(storage.get_item(ACTIVE_SESSION_KEY).unwrap(), None);
        assert_eq!(last_completed(&storage).unwrap(), Some(record.clone()));
        assert_eq!(history(&storage).unwrap(), vec![record]);
    }

    #[test]
    fn finish_with_nothing_completed_records_zero_totals() {
        let (storage, _clock, mut manager) = started(&["Bench"]);
        manager.update_set_field(0, 0, SetField::Weight, "40").unwrap();

        let record = manager.finish().unwrap();
        assert_eq!(record.total_volume, 0.0);
        assert_eq!(record.total_reps, 0);
        assert_eq!(history(&storage).unwrap().len(), 1);
    }

    #[test]
    fn history_is_newest_first_and_records_are_snapshots() {
        let (storage, clock, mut manager) = started(&["Bench"]);
        let first = manager.finish().unwrap();

        clock.advance_secs(3600);
        let mut next = template(&["Row"]);
        next.id = "wo_pull".into();
        manager.start(&next).unwrap();
        manager.update_set_field(0, 0, SetField::Weight, "70").unwrap();
        let second = manager.finish().unwrap();

        let records = history(&storage).unwrap();
        assert_eq!(records, vec![second, first.clone()]);
        assert_eq!(records[1].exercises[0].sets[0].actual_weight, None);
    }

    #[test]
    fn discard_clears_without_history_and_is_idempotent() {
        let (storage, _clock, mut manager) = started(&["Bench"]);
        manager.toggle_set_completion(0, 0).unwrap();

        manager.discard().unwrap();
        assert!(manager.active().is_none());
        assert!(!manager.rest_timer_running());
        assert_eq!(storage.get_item(ACTIVE_SESSION_KEY).unwrap(), None);
        assert!(history(&storage).unwrap().is_empty());

        manager.discard().unwrap();
        assert!(history(&storage).unwrap().is_empty());
    }

    #[test]
    fn discard_without_any_session_leaves_history_alone() {
        let (storage, _clock, mut manager) = started(&["Bench"]);
        manager.finish().unwrap();
        let before = history(&storage).unwrap();

        let mut fresh = SessionManager::new(storage.clone(), clock());
        fresh.discard().unwrap();
        assert_eq!(history(&storage).unwrap(), before);
    }

    #[test]
    fn catalog_identity_is_copied_at_start_only() {
        let storage = MemoryStorage::new();
        let mut manager = SessionManager::new(storage, clock());
        let catalog = MemoryCatalog::new(vec![Exercise {
            id: "ex_bench".into(),
            name: "Flat Bench Press".into(),
            muscle_group: "chest".into(),
            archived: false,
            created_at: None,
        }]);
        let mut template = template(&["Bench", "Mystery"]);
        template.exercises.push(TemplateExercise {
            id: "ex_gone".into(),
            name: "Removed Exercise".into(),
            muscle_group: "abs".into(),
            sets: None,
        });

        let session = manager.start_with_catalog(&template, &catalog).unwrap();
        assert_eq!(session.exercises[0].exercise.name, "Flat Bench Press");
        assert_eq!(session.exercises[1].exercise.name, "Mystery");
        assert_eq!(session.exercises[2].exercise.name, "Removed Exercise");

        drop(catalog);
        let record = manager.finish().unwrap();
        assert_eq!(record.exercises[0].exercise.name, "Flat Bench Press");
    }
}
