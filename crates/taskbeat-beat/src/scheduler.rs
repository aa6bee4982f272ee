//! Scheduler: one tick of the clock service.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use taskbeat_protocols::job::Job;
use taskbeat_protocols::registry::JobRegistry;
use taskbeat_protocols::result::AsyncResult;
use taskbeat_protocols::submit::TaskSubmitter;

use crate::entry::ScheduleEntry;
use crate::error::{BeatError, SchedulingError, StoreError};
use crate::store::ScheduleStore;

/// Tick interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of submitting one due entry.
#[derive(Debug)]
pub struct TickResult {
    pub job_name: String,
    pub outcome: Result<AsyncResult, SchedulingError>,
}

impl TickResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Keeps the persisted schedule in line with the registry and submits
/// due jobs.
pub struct Scheduler {
    registry: Arc<dyn JobRegistry>,
    store: Arc<dyn ScheduleStore>,
    submitter: Arc<dyn TaskSubmitter>,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler over an open store and add every periodic job
    /// missing from it.
    pub async fn new(
        registry: Arc<dyn JobRegistry>,
        store: Arc<dyn ScheduleStore>,
        submitter: Arc<dyn TaskSubmitter>,
    ) -> Result<Self, BeatError> {
        let scheduler = Self {
            registry,
            store,
            submitter,
            interval: DEFAULT_INTERVAL,
        };
        scheduler.schedule_registry().await?;
        Ok(scheduler)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    /// Insert a fresh entry for each periodic job without one. Existing
    /// entries keep their history. Returns the number of entries added.
    pub async fn schedule_registry(&self) -> Result<usize, BeatError> {
        let mut added = 0;
        for name in self.registry.get_all_periodic().into_keys() {
            if self.store.get(&name).await?.is_none() {
                debug!("Scheduling new periodic task {}", name);
                self.store.set(ScheduleEntry::new(name)).await?;
                added += 1;
            }
        }
        if added > 0 {
            self.store.sync().await?;
        }
        Ok(added)
    }

    /// Entries whose interval has elapsed.
    pub async fn get_due_tasks(&self) -> Result<Vec<ScheduleEntry>, BeatError> {
        Ok(self
            .due_entries()
            .await?
            .into_iter()
            .map(|(entry, _)| entry)
            .collect())
    }

    /// Time until the earliest entry is due.
    pub async fn next_due_in(&self) -> Result<Option<Duration>, BeatError> {
        let mut next: Option<Duration> = None;
        for entry in self.store.entries().await? {
            if let Some(run_every) = self.run_every_of(&entry.name) {
                let remaining = entry.remaining(run_every);
                next = Some(next.map_or(remaining, |n| n.min(remaining)));
            }
        }
        Ok(next)
    }

    /// Submit every due entry once and persist the updated bookkeeping.
    ///
    /// A failed submission is reported in its [`TickResult`]; only store
    /// failures end the tick with an error.
    pub async fn tick(&mut self) -> Result<Vec<TickResult>, BeatError> {
        let due = self.due_entries().await?;
        let mut results = Vec::with_capacity(due.len());

        for (mut entry, job) in due {
            info!("Scheduler: Sending due task {}", entry.name);
            let outcome = entry.execute(job, self.submitter.as_ref()).await;
            let job_name = entry.name.clone();
            self.store.set(entry).await?;
            results.push(TickResult { job_name, outcome });
        }

        if !results.is_empty() {
            self.store.sync().await?;
        }
        Ok(results)
    }

    /// Close the underlying store.
    pub async fn close(self) -> Result<(), StoreError> {
        self.store.close().await
    }

    fn run_every_of(&self, name: &str) -> Option<Duration> {
        self.registry.lookup(name).ok().and_then(|job| job.run_every())
    }

    async fn due_entries(&self) -> Result<Vec<(ScheduleEntry, Arc<dyn Job>)>, BeatError> {
        let mut due = Vec::new();
        for entry in self.store.entries().await? {
            let job = match self.registry.lookup(&entry.name) {
                Ok(job) => job,
                Err(_) => {
                    debug!("Skipping schedule entry {}: task no longer registered", entry.name);
                    continue;
                }
            };
            let Some(run_every) = job.run_every() else {
                debug!("Skipping schedule entry {}: task is not periodic", entry.name);
                continue;
            };
            if entry.is_due(run_every) {
                due.push((entry, job));
            }
        }
        Ok(due)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
