//! Publisher errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to connect publisher: {0}")]
    Connection(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Publisher is closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
