//! Clock service errors.

use std::path::PathBuf;

use thiserror::Error;

use taskbeat_protocols::error::DispatchError;

/// Schedule store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schedule file {path:?} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Schedule store is closed")]
    Closed,
}

/// A due job could not be submitted.
///
/// The entry's bookkeeping has already advanced when this is raised.
#[derive(Debug, Error)]
#[error("Couldn't apply scheduled task {job_name}: {source}")]
pub struct SchedulingError {
    pub job_name: String,
    #[source]
    pub source: DispatchError,
}

/// Errors that end the clock service.
#[derive(Debug, Error)]
pub enum BeatError {
    #[error("Schedule store error: {0}")]
    Store(#[from] StoreError),

    #[error("Clock service cannot start from state {0}")]
    InvalidState(String),

    #[error("Clock service task failed: {0}")]
    Join(String),
}
