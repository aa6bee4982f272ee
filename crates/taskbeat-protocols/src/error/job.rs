//! Job body errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
