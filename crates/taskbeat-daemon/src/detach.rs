//! Detaching from the controlling terminal.

use std::path::Path;

use tracing::info;

use crate::error::DaemonError;

/// Turn the current process into a background daemon.
///
/// Double fork with `setsid` in between, `chdir` to `work_dir` (or `/`)
/// and standard streams pointed at `/dev/null`. Only the grandchild
/// returns. Must be called before any threads are started, which rules
/// out calling it from inside a tokio runtime.
#[cfg(unix)]
pub fn detach(work_dir: Option<&Path>) -> Result<(), DaemonError> {
    use std::os::unix::io::AsRawFd;

    use nix::unistd::{ForkResult, chdir, dup2, fork, setsid};

    // SAFETY: called before the runtime spawns any threads.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(DaemonError::DetachFailed(e.to_string())),
    }

    setsid().map_err(|e| DaemonError::DetachFailed(format!("setsid failed: {}", e)))?;

    // SAFETY: still single threaded.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(DaemonError::DetachFailed(e.to_string())),
    }

    let dir = work_dir.unwrap_or_else(|| Path::new("/"));
    chdir(dir).map_err(|e| DaemonError::DetachFailed(format!("chdir failed: {}", e)))?;

    let dev_null = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|e| DaemonError::DetachFailed(format!("Failed to open /dev/null: {}", e)))?;
    let fd = dev_null.as_raw_fd();
    for target in 0..=2 {
        dup2(fd, target)
            .map_err(|e| DaemonError::DetachFailed(format!("dup2 failed: {}", e)))?;
    }

    info!("Detached (PID: {})", std::process::id());
    Ok(())
}

#[cfg(not(unix))]
pub fn detach(_work_dir: Option<&Path>) -> Result<(), DaemonError> {
    Err(DaemonError::DetachFailed(
        "detaching is not supported on this platform".to_string(),
    ))
}
