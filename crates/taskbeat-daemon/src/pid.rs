//! PID file guarding against two beats sharing one schedule.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DaemonError;

/// PID file held for the lifetime of the beat process.
///
/// Dropping a held file removes it.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    held: bool,
}

impl PidFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            held: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// PID recorded in the file, if the file exists.
    pub fn read_pid(&self) -> Result<Option<u32>, DaemonError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DaemonError::PidFileRead {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        contents
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| DaemonError::PidFileRead {
                path: self.path.clone(),
                reason: format!("Invalid PID format: {}", e),
            })
    }

    /// Take the PID file for this process.
    ///
    /// Fails when the recorded process is alive; a stale file is replaced.
    pub fn acquire(&mut self) -> Result<(), DaemonError> {
        if let Some(pid) = self.read_pid()? {
            if pid != std::process::id() && is_process_running(pid) {
                return Err(DaemonError::AlreadyRunning {
                    path: self.path.clone(),
                    pid,
                });
            }
            warn!(
                "Replacing stale PID file {} (PID {} not running)",
                self.path.display(),
                pid
            );
        }
        self.write(std::process::id())
    }

    fn write(&mut self, pid: u32) -> Result<(), DaemonError> {
        let creation_error = |reason: String| DaemonError::PidFileCreation {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| creation_error(format!("Failed to create parent directory: {}", e)))?;
        }
        fs::write(&self.path, pid.to_string()).map_err(|e| creation_error(e.to_string()))?;

        self.held = true;
        info!("PID file created: {} (PID: {})", self.path.display(), pid);
        Ok(())
    }

    /// Remove the file if this process holds it.
    pub fn release(&mut self) -> Result<(), DaemonError> {
        if !self.held {
            return Ok(());
        }
        self.held = false;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("PID file removed: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DaemonError::PidFileRemoval {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to remove PID file on drop: {}", e);
        }
    }
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // Signal 0 probes for existence without delivering anything. EPERM
    // means the process exists but belongs to someone else.
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    true
}

#[cfg(test)]
#[path = "pid_tests.rs"]
mod tests;
