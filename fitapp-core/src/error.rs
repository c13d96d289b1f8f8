use std::fmt;

use thiserror::Error;

/// Which sequence an out-of-range index pointed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Exercise,
    Set,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Exercise => write!(f, "exercise"),
            IndexKind::Set => write!(f, "set"),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("{kind} index {index} is out of range (length {len})")]
    OutOfRange {
        kind: IndexKind,
        index: usize,
        len: usize,
    },
    #[error("no active workout")]
    MissingSession,
    #[error("exercise {0} is not in the catalog")]
    UnknownExercise(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    pub fn out_of_range(kind: IndexKind, index: usize, len: usize) -> Self {
        SessionError::OutOfRange { kind, index, len }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
