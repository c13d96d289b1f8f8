//! Key-value persistence shaped like browser local storage.
//!
//! Values are JSON strings under fixed keys. The active session lives in a
//! single slot that is overwritten, never appended.

mod memory;

pub use memory::MemoryStorage;

use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::session::HistoryRecord;

pub const ACTIVE_SESSION_KEY: &str = "activeWorkoutState";
pub const HISTORY_KEY: &str = "fitapp_workout_history";
pub const COMPLETED_WORKOUT_KEY: &str = "completedWorkout";
pub const EXERCISES_KEY: &str = "fitapp_exercises";
pub const WORKOUTS_KEY: &str = "fitapp_workouts";

/// One write applied by [`Storage::write_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageWrite<'a> {
    Set(&'a str, &'a str),
    Remove(&'a str),
}

impl StorageWrite<'_> {
    pub fn key(&self) -> &str {
        match self {
            StorageWrite::Set(key, _) | StorageWrite::Remove(key) => *key,
        }
    }
}

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Applies all of `writes` or none of them.
    ///
    /// The default applies them one at a time and, when one fails, puts back
    /// the previous values of the keys already written.
    fn write_batch(&self, writes: &[StorageWrite<'_>]) -> Result<()> {
        let mut undo: Vec<(&str, Option<String>)> = Vec::with_capacity(writes.len());
        for write in writes {
            let applied = self.get_item(write.key()).and_then(|previous| {
                match write {
                    StorageWrite::Set(key, value) => self.set_item(key, value)?,
                    StorageWrite::Remove(key) => self.remove_item(key)?,
                }
                Ok(previous)
            });
            match applied {
                Ok(previous) => undo.push((write.key(), previous)),
                Err(e) => {
                    for (key, previous) in undo.into_iter().rev() {
                        let restored = match previous {
                            Some(value) => self.set_item(key, &value),
                            None => self.remove_item(key),
                        };
                        if let Err(restore_err) = restored {
                            warn!("Failed to restore {} after a failed batch: {:#}", key, restore_err);
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

pub fn load_json<T, S>(storage: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    match storage.get_item(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse stored value for {}", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn save_json<T, S>(storage: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: Storage + ?Sized,
{
    storage.set_item(key, &to_json(key, value)?)
}

fn to_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).with_context(|| format!("Failed to serialize value for {}", key))
}

/// Like [`load_json`], but an unreadable value is logged and treated as absent.
pub fn load_json_or_absent<T, S>(storage: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: Storage + ?Sized,
{
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Ignoring unreadable value stored under {}: {}", key, e);
            Ok(None)
        }
    }
}

/// Finished workouts, newest first.
///
/// Unreadable history is an error rather than an empty list, so that finishing
/// a workout never overwrites it.
pub fn history<S: Storage + ?Sized>(storage: &S) -> Result<Vec<HistoryRecord>> {
    let records = load_json(storage, HISTORY_KEY)
        .inspect_err(|e| warn!("Workout history under {} is unreadable: {:#}", HISTORY_KEY, e))
        .with_context(|| {
            format!(
                "Workout history under {} is unreadable; repair or remove it before finishing a workout",
                HISTORY_KEY
            )
        })?;
    Ok(records.unwrap_or_default())
}

/// Records a finished workout in one batch: prepends it to history, keeps it
/// as the last completed workout and clears the active slot.
pub fn record_finished<S: Storage + ?Sized>(storage: &S, record: &HistoryRecord) -> Result<()> {
    let mut records = history(storage)?;
    records.insert(0, record.clone());
    let history = to_json(HISTORY_KEY, &records)?;
    let completed = to_json(COMPLETED_WORKOUT_KEY, record)?;
    storage.write_batch(&[
        StorageWrite::Set(HISTORY_KEY, &history),
        StorageWrite::Set(COMPLETED_WORKOUT_KEY, &completed),
        StorageWrite::Remove(ACTIVE_SESSION_KEY),
    ])
}

/// The record of the most recently finished workout, kept for the summary view.
pub fn last_completed<S: Storage + ?Sized>(storage: &S) -> Result<Option<HistoryRecord>> {
    load_json_or_absent(storage, COMPLETED_WORKOUT_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_helpers_round_trip_through_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(load_json::<serde_json::Value, _>(&storage, "k").unwrap(), None);

        save_json(&storage, "k", &json!({"a": 1})).unwrap();
        assert_eq!(
            load_json::<serde_json::Value, _>(&storage, "k").unwrap(),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn corrupt_value_is_an_error_or_absent_depending_on_reader() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "{not json").unwrap();

        assert!(load_json::<serde_json::Value, _>(&storage, "k").is_err());
        assert_eq!(
            load_json_or_absent::<serde_json::Value, _>(&storage, "k").unwrap(),
            None
        );
    }

    /// Refuses every write to one key.
    struct RejectingStorage {
        inner: MemoryStorage,
        rejected: &'static str,
    }

    impl Storage for RejectingStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            if key == self.rejected {
                anyhow::bail!("write to {} rejected", key);
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn default_batch_puts_back_earlier_writes_when_one_fails() {
        let storage = RejectingStorage {
            inner: MemoryStorage::new(),
            rejected: "c",
        };
        storage.set_item("a", "old").unwrap();
        storage.set_item("gone", "kept").unwrap();

        let result = storage.write_batch(&[
            StorageWrite::Set("a", "new"),
            StorageWrite::Remove("gone"),
            StorageWrite::Set("b", "1"),
            StorageWrite::Set("c", "x"),
        ]);
        assert!(result.is_err());
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("old"));
        assert_eq!(storage.get_item("gone").unwrap().as_deref(), Some("kept"));
        assert_eq!(storage.get_item("b").unwrap(), None);
        assert_eq!(storage.get_item("c").unwrap(), None);
    }

    #[test]
    fn unreadable_history_names_its_key() {
        let storage = MemoryStorage::new();
        storage.set_item(HISTORY_KEY, "[{").unwrap();
        let err = history(&storage).unwrap_err();
        assert!(err.to_string().contains(HISTORY_KEY));
    }

    #[test]
    fn empty_history_reads_as_empty_list() {
        let storage = MemoryStorage::new();
        assert!(history(&storage).unwrap().is_empty());
        assert!(last_completed(&storage).unwrap().is_none());
    }
}
