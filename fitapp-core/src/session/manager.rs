use std::time::Duration;

use log::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{IndexKind, Result, SessionError};
use crate::session::model::Session;
use crate::store::{ACTIVE_SESSION_KEY, Storage, load_json_or_absent, save_json};
use crate::timer::Stopwatch;

pub struct SessionManager<S, C = SystemClock> {
    pub(super) storage: S,
    pub(super) clock: C,
    pub(super) active: Option<Session>,
    pub(super) rest_timer: Stopwatch,
}

impl<S: Storage, C: Clock> SessionManager<S, C> {
    /// A manager with no active session. Does not read the store.
    pub fn new(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            active: None,
            rest_timer: Stopwatch::default(),
        }
    }

    /// A manager resuming whatever session the store holds. An unreadable slot
    /// is treated as no session.
    pub fn open(storage: S, clock: C) -> Result<Self> {
        let active: Option<Session> = load_json_or_absent(&storage, ACTIVE_SESSION_KEY)?;
        match &active {
            Some(session) => info!(
                "Resuming workout {} started at {}",
                session.workout_id, session.started_at
            ),
            None => debug!("No active workout to resume"),
        }
        Ok(Self {
            storage,
            clock,
            active,
            rest_timer: Stopwatch::default(),
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn session(&self) -> Result<&Session> {
        self.active.as_ref().ok_or(SessionError::MissingSession)
    }

    pub fn select_exercise(&mut self, index: usize) -> Result<&Session> {
        self.mutate(|session| {
            let len = session.exercises.len();
            if index >= len {
                return Err(SessionError::out_of_range(IndexKind::Exercise, index, len));
            }
            session.current_exercise_index = index;
            Ok(())
        })?;
        debug!("Selected exercise {}", index);
        self.session()
    }

    pub fn elapsed_time(&self) -> Result<Duration> {
        Ok(self.session()?.elapsed(self.clock.now()))
    }

    pub fn rest_elapsed(&self) -> Duration {
        self.rest_timer.elapsed(self.clock.now())
    }

    pub fn rest_timer_running(&self) -> bool {
        self.rest_timer.is_running()
    }

    pub fn reset_rest_timer(&mut self) {
        self.rest_timer.reset();
    }

    /// Applies `op` to a copy of the active session, persists the copy, and
    /// only then makes it the active session.
    pub(super) fn mutate<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let mut next = self.session()?.clone();
        let out = op(&mut next)?;
        self.commit(next)?;
        Ok(out)
    }

    pub(super) fn commit(&mut self, session: Session) -> Result<&Session> {
        save_json(&self.storage, ACTIVE_SESSION_KEY, &session)?;
        Ok(&*self.active.insert(session))
    }
}
