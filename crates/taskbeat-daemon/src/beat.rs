//! Beat process host.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use taskbeat_beat::{ClockService, ClockServiceTask};

use crate::error::DaemonError;
use crate::pid::PidFile;
use crate::signal::shutdown_token;

/// How the beat process is hosted.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// PID file to hold while running. `None` skips the check.
    pub pid_file: Option<PathBuf>,
    /// Whether the process was detached before the runtime started.
    pub detach: bool,
    /// Log level reported in the startup banner.
    pub loglevel: String,
    /// Log file reported in the startup banner, stderr when `None`.
    pub logfile: Option<PathBuf>,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            pid_file: None,
            detach: false,
            loglevel: "info".to_string(),
            logfile: None,
        }
    }
}

/// Runs a [`ClockService`] until an OS shutdown signal arrives.
pub struct BeatDaemon {
    service: ClockService,
    options: DaemonOptions,
}

impl BeatDaemon {
    pub fn new(service: ClockService, options: DaemonOptions) -> Self {
        Self { service, options }
    }

    pub fn options(&self) -> &DaemonOptions {
        &self.options
    }

    /// Run until SIGTERM/SIGINT or until the service stops on its own.
    pub async fn run(self) -> Result<(), DaemonError> {
        let shutdown = shutdown_token()?;
        self.run_with_shutdown(shutdown).await
    }

    /// Run until `shutdown` is cancelled or the service stops on its own.
    ///
    /// The PID file, when configured, is held for the whole run and
    /// removed on every exit path.
    pub async fn run_with_shutdown(self, shutdown: CancellationToken) -> Result<(), DaemonError> {
        let mut pid_file = match &self.options.pid_file {
            Some(path) => {
                let mut pid_file = PidFile::new(path);
                pid_file.acquire()?;
                Some(pid_file)
            }
            None => None,
        };

        info!(
            "taskbeat beat starting (PID: {}, loglevel: {}, logfile: {}, detached: {})",
            std::process::id(),
            self.options.loglevel,
            self.options
                .logfile
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "[stderr]".to_string()),
            self.options.detach
        );

        let task = ClockServiceTask::spawn(self.service);
        let result = task.run_until(shutdown).await;

        match &result {
            Ok(()) => info!("Clock service stopped"),
            Err(e) => error!("Clock service exited with error: {}", e),
        }

        if let Some(pid_file) = pid_file.as_mut() {
            pid_file.release()?;
        }

        result.map_err(DaemonError::from)
    }
}

#[cfg(test)]
#[path = "beat_tests.rs"]
mod tests;
