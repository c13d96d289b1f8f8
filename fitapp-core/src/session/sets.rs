//! Per-set edits on the active session. Every call persists.

use log::debug;

use crate::clock::Clock;
use crate::error::{IndexKind, Result, SessionError};
use crate::session::SessionManager;
use crate::session::model::{Session, SetField, SetRecord, SetValue};
use crate::store::Storage;

impl<S: Storage, C: Clock> SessionManager<S, C> {
    /// Stores raw form input for `field`. Empty or non-numeric input clears it.
    pub fn update_set_field(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        field: SetField,
        raw_value: &str,
    ) -> Result<&Session> {
        self.set_field_value(exercise_index, set_index, field.parse(raw_value))
    }

    pub fn set_field_value(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        value: SetValue,
    ) -> Result<&Session> {
        self.mutate(|session| {
            session.set_mut(exercise_index, set_index)?.apply(value);
            Ok(())
        })?;
        debug!(
            "Updated exercise {} set {}: {:?}",
            exercise_index, set_index, value
        );
        self.session()
    }

    /// Flips completion. Completing restarts the rest timer from zero,
    /// un-completing stops it. Entered weight and reps are kept either way.
    pub fn toggle_set_completion(
        &mut self,
        exercise_index: usize,
        set_index: usize,
    ) -> Result<&Session> {
        let completed = self.mutate(|session| {
            let set = session.set_mut(exercise_index, set_index)?;
            set.completed = !set.completed;
            Ok(set.completed)
        })?;

        if completed {
            self.rest_timer.restart(self.clock.now());
        } else {
            self.rest_timer.reset();
        }
        debug!(
            "Exercise {} set {} completed={}",
            exercise_index, set_index, completed
        );
        self.session()
    }

    pub fn add_set(&mut self, exercise_index: usize) -> Result<&Session> {
        self.mutate(|session| {
            session
                .exercise_mut(exercise_index)?
                .sets
                .push(SetRecord::default());
            Ok(())
        })?;
        self.session()
    }

    /// Replaces the whole set list of an exercise, e.g. after a drag reorder.
    pub fn replace_sets(
        &mut self,
        exercise_index: usize,
        sets: Vec<SetRecord>,
    ) -> Result<&Session> {
        self.mutate(|session| {
            session.exercise_mut(exercise_index)?.sets = sets;
            Ok(())
        })?;
        self.session()
    }

    /// Removes the set at `from` and reinserts it at `to`.
    pub fn move_set(&mut self, exercise_index: usize, from: usize, to: usize) -> Result<&Session> {
        self.mutate(|session| {
            let sets = &mut session.exercise_mut(exercise_index)?.sets;
            let len = sets.len();
            for index in [from, to] {
                if index >= len {
                    return Err(SessionError::out_of_range(IndexKind::Set, index, len));
                }
            }
            let set = sets.remove(from);
            sets.insert(to, set);
            Ok(())
        })?;
        self.session()
    }
}
