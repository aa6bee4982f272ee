//! # taskbeat Daemon
//!
//! Hosts a clock service as a process: PID file, optional detach from
//! the terminal, and shutdown on SIGTERM/SIGINT.

pub mod beat;
pub mod detach;
pub mod error;
pub mod pid;
pub mod signal;

pub use beat::{BeatDaemon, DaemonOptions};
pub use detach::detach;
pub use error::DaemonError;
pub use pid::PidFile;
pub use signal::shutdown_token;
