use thiserror::Error as ThisError;
use uniffi::Error;

use crate::error::SessionError;

#[derive(Debug, ThisError, Error)]
#[uniffi(flat_error)]
#[non_exhaustive]
pub enum FitError {
    #[error("error: {0}")]
    Common(String),
    #[error("index out of range: {0}")]
    OutOfRange(String),
    #[error("no active workout")]
    NoActiveWorkout,
}

impl From<SessionError> for FitError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::OutOfRange { .. } => FitError::OutOfRange(e.to_string()),
            SessionError::MissingSession => FitError::NoActiveWorkout,
            other => FitError::Common(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for FitError {
    fn from(e: anyhow::Error) -> Self {
        FitError::Common(e.to_string())
    }
}

impl From<String> for FitError {
    fn from(s: String) -> Self {
        FitError::Common(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexKind;

    #[test]
    fn session_errors_keep_their_category() {
        let err = FitError::from(SessionError::out_of_range(IndexKind::Set, 4, 2));
        assert!(matches!(&err, FitError::OutOfRange(msg) if msg.contains("set index 4")));
        assert!(matches!(
            FitError::from(SessionError::MissingSession),
            FitError::NoActiveWorkout
        ));
        assert!(matches!(
            FitError::from(SessionError::UnknownExercise("ex_x".into())),
            FitError::Common(_)
        ));
    }
}
