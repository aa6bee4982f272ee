//! Queue errors.

use thiserror::Error;

use taskbeat_protocols::error::RegistryError;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Slot index beyond the tracker length.
    #[error("Position {position} out of range for queue of length {length}")]
    PositionOutOfRange { position: usize, length: usize },

    /// The pool refuses new work.
    #[error("Worker pool is not running")]
    PoolNotRunning,

    /// Worker error.
    #[error("Worker error: {0}")]
    WorkerError(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
