//! Clock service: drives the scheduler until stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use taskbeat_protocols::registry::JobRegistry;
use taskbeat_protocols::submit::TaskSubmitter;

use crate::error::BeatError;
use crate::scheduler::Scheduler;
use crate::store::{ScheduleStore, StoreOpener};

/// Clock service lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClockState {
    /// Not started.
    Created = 0,
    /// Ticking.
    Running = 1,
    /// Stop requested, loop still winding down.
    ShutdownRequested = 2,
    /// Store closed, loop exited.
    Stopped = 3,
}

impl From<u8> for ClockState {
    fn from(v: u8) -> Self {
        match v {
            0 => ClockState::Created,
            1 => ClockState::Running,
            2 => ClockState::ShutdownRequested,
            _ => ClockState::Stopped,
        }
    }
}

impl std::fmt::Display for ClockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockState::Created => write!(f, "created"),
            ClockState::Running => write!(f, "running"),
            ClockState::ShutdownRequested => write!(f, "shutdown_requested"),
            ClockState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Publishes the stopped state when the loop exits by any path,
/// including a panic or the start future being dropped.
struct StoppedGuard<'a> {
    state: &'a AtomicU8,
    stopped_tx: &'a watch::Sender<bool>,
}

impl Drop for StoppedGuard<'_> {
    fn drop(&mut self) {
        self.state.store(ClockState::Stopped as u8, Ordering::SeqCst);
        self.stopped_tx.send_replace(true);
    }
}

/// Periodically ticks a [`Scheduler`] over a store it opens itself.
pub struct ClockService {
    registry: Arc<dyn JobRegistry>,
    submitter: Arc<dyn TaskSubmitter>,
    opener: Arc<dyn StoreOpener>,
    interval: Option<Duration>,
    state: AtomicU8,
    shutdown: CancellationToken,
    stopped_tx: watch::Sender<bool>,
}

impl ClockService {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        submitter: Arc<dyn TaskSubmitter>,
        opener: Arc<dyn StoreOpener>,
    ) -> Self {
        let (stopped_tx, _) = watch::channel(false);
        Self {
            registry,
            submitter,
            opener,
            interval: None,
            state: AtomicU8::new(ClockState::Created as u8),
            shutdown: CancellationToken::new(),
            stopped_tx,
        }
    }

    /// Override the scheduler's tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn state(&self) -> ClockState {
        ClockState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped_tx.borrow()
    }

    /// Run until [`stop`](Self::stop) is called or the store fails.
    ///
    /// The store is closed before this returns, whatever the exit path.
    /// Starting a stopped service does nothing; starting a running one
    /// is an error.
    pub async fn start(&self) -> Result<(), BeatError> {
        match self.state.compare_exchange(
            ClockState::Created as u8,
            ClockState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {}
            Err(current) if ClockState::from(current) == ClockState::Stopped => {
                debug!("Clock service already stopped, not starting");
                return Ok(());
            }
            Err(current) => {
                return Err(BeatError::InvalidState(ClockState::from(current).to_string()));
            }
        }

        let _guard = StoppedGuard {
            state: &self.state,
            stopped_tx: &self.stopped_tx,
        };

        info!("Clock service starting");
        let store = self.opener.open().await?;
        let result = self.run(store.clone()).await;

        if let Err(e) = store.close().await {
            error!("Failed to close schedule store: {}", e);
        }
        match &result {
            Ok(()) => info!("Clock service stopped"),
            Err(e) => error!("Clock service stopped with error: {}", e),
        }
        result
    }

    async fn run(&self, store: Arc<dyn ScheduleStore>) -> Result<(), BeatError> {
        let mut scheduler =
            Scheduler::new(self.registry.clone(), store, self.submitter.clone()).await?;
        if let Some(interval) = self.interval {
            scheduler = scheduler.with_interval(interval);
        }
        let interval = scheduler.interval();
        debug!("Clock service ticking every {:?}", interval);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            for result in scheduler.tick().await? {
                match result.outcome {
                    Ok(sent) => debug!("Task {} sent as {}", result.job_name, sent.task_id()),
                    Err(e) => error!("{}", e),
                }
            }
            if let Some(next) = scheduler.next_due_in().await? {
                debug!("Next scheduled run in {:?}", next);
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        Ok(())
    }

    /// Request shutdown. With `wait`, return once the store is closed.
    ///
    /// A service that never started goes straight to `Stopped`.
    pub async fn stop(&self, wait: bool) {
        self.shutdown.cancel();

        if self
            .state
            .compare_exchange(
                ClockState::Created as u8,
                ClockState::Stopped as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            self.stopped_tx.send_replace(true);
            return;
        }

        let _ = self.state.compare_exchange(
            ClockState::Running as u8,
            ClockState::ShutdownRequested as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        info!("Clock service shutdown requested");

        if wait {
            let mut rx = self.stopped_tx.subscribe();
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }
}

/// A [`ClockService`] running on its own tokio task.
pub struct ClockServiceTask {
    service: Arc<ClockService>,
    handle: JoinHandle<Result<(), BeatError>>,
}

impl ClockServiceTask {
    pub fn spawn(service: ClockService) -> Self {
        let service = Arc::new(service);
        let runner = service.clone();
        let handle = tokio::spawn(async move { runner.start().await });
        Self { service, handle }
    }

    pub fn service(&self) -> &Arc<ClockService> {
        &self.service
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the service, wait for it and return how its loop ended.
    pub async fn stop(self) -> Result<(), BeatError> {
        self.service.stop(true).await;
        self.join().await
    }

    /// Run until the loop ends on its own or `shutdown` fires, in which
    /// case the service is stopped and awaited.
    pub async fn run_until(mut self, shutdown: CancellationToken) -> Result<(), BeatError> {
        tokio::select! {
            joined = &mut self.handle => match joined {
                Ok(result) => result,
                Err(e) => Err(BeatError::Join(e.to_string())),
            },
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, stopping clock service");
                self.stop().await
            }
        }
    }

    /// Wait for the loop to end on its own.
    pub async fn join(self) -> Result<(), BeatError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(BeatError::Join(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
