//! Result retrieval errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResultError {
    /// The result did not arrive within the timeout. Callers treat this as
    /// "not yet collectable".
    #[error("Timed out after {0:?} waiting for result")]
    Timeout(Duration),

    /// The job ran and failed.
    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    /// The producer went away without reporting an outcome.
    #[error("Result of task {0} was lost")]
    Lost(String),
}

impl ResultError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResultError::Timeout(_))
    }
}
