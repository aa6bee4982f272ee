//! Schedule entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskbeat_protocols::job::Job;
use taskbeat_protocols::result::AsyncResult;
use taskbeat_protocols::submit::{ApplyRequest, TaskSubmitter};

use crate::error::SchedulingError;

/// Persisted run bookkeeping of one periodic job.
///
/// The recurrence interval is not stored; it belongs to the job and is
/// passed in by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub name: String,
    pub last_run_at: DateTime<Utc>,
    pub total_run_count: u64,
}

impl ScheduleEntry {
    /// A fresh entry, due on the first tick.
    ///
    /// The last run is seeded at the Unix epoch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_run_at: DateTime::<Utc>::default(),
            total_run_count: 0,
        }
    }

    /// Whether the entry has never run.
    pub fn is_fresh(&self) -> bool {
        self.total_run_count == 0 && self.last_run_at == DateTime::<Utc>::default()
    }

    pub fn with_last_run_at(mut self, last_run_at: DateTime<Utc>) -> Self {
        self.last_run_at = last_run_at;
        self
    }

    pub fn with_total_run_count(mut self, total_run_count: u64) -> Self {
        self.total_run_count = total_run_count;
        self
    }

    /// Due once more than `run_every` has passed since the last run.
    pub fn is_due(&self, run_every: Duration) -> bool {
        self.is_due_at(run_every, Utc::now())
    }

    pub fn is_due_at(&self, run_every: Duration, now: DateTime<Utc>) -> bool {
        self.next_run_at(run_every).is_some_and(|next| now > next)
    }

    /// Time left until the entry is due, zero when it already is.
    pub fn remaining(&self, run_every: Duration) -> Duration {
        self.remaining_at(run_every, Utc::now())
    }

    pub fn remaining_at(&self, run_every: Duration, now: DateTime<Utc>) -> Duration {
        match self.next_run_at(run_every) {
            Some(next) => (next - now).to_std().unwrap_or(Duration::ZERO),
            None => Duration::MAX,
        }
    }

    fn next_run_at(&self, run_every: Duration) -> Option<DateTime<Utc>> {
        let run_every = chrono::Duration::from_std(run_every).ok()?;
        self.last_run_at.checked_add_signed(run_every)
    }

    /// Record a run and submit `job`.
    ///
    /// The timestamp and counter advance before submission and stay
    /// advanced when it fails.
    pub async fn execute(
        &mut self,
        job: Arc<dyn Job>,
        submitter: &dyn TaskSubmitter,
    ) -> Result<AsyncResult, SchedulingError> {
        self.last_run_at = Utc::now();
        self.total_run_count += 1;

        submitter
            .apply_async(job, ApplyRequest::new())
            .await
            .map_err(|source| SchedulingError {
                job_name: self.name.clone(),
                source,
            })
    }
}
