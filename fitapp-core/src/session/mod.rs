//! Active workout session management.
//!
//! [`SessionManager`] owns the single active [`Session`], flushes every change
//! to the recoverable store, and turns a finished session into a
//! [`HistoryRecord`].

mod input;
mod manager;
mod model;
mod sets;
mod summary;
mod workout;

pub use input::{parse_optional_number, parse_optional_reps};
pub use manager::SessionManager;
pub use model::{
    DEFAULT_SET_COUNT, DEFAULT_TARGET_REPS, ExerciseEntry, ExerciseRef, Session, SetField,
    SetProgress, SetRecord, SetValue,
};
pub use summary::{CompletionSummary, HistoryRecord, Totals, compute_totals, format_duration_summary};
