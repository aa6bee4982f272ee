//! Daemon-related errors.

use std::path::PathBuf;

use thiserror::Error;

use taskbeat_beat::BeatError;

/// Errors that can occur while hosting the clock service.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Another live process holds the PID file.
    #[error("Beat already running (PID file: {path}, PID: {pid})")]
    AlreadyRunning { path: PathBuf, pid: u32 },

    #[error("Failed to create PID file at {path}: {reason}")]
    PidFileCreation { path: PathBuf, reason: String },

    #[error("Failed to read PID file at {path}: {reason}")]
    PidFileRead { path: PathBuf, reason: String },

    #[error("Failed to remove PID file at {path}: {reason}")]
    PidFileRemoval { path: PathBuf, reason: String },

    #[error("Failed to detach process: {0}")]
    DetachFailed(String),

    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    #[error(transparent)]
    Beat(#[from] BeatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
