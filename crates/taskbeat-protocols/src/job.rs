//! Job capability trait.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::JobError;
use crate::options::ExecOptions;

/// Positional arguments passed to a job body.
pub type TaskArgs = Vec<Value>;

/// Keyword arguments passed to a job body.
pub type TaskKwargs = Map<String, Value>;

/// A unit of work known to the registry.
///
/// The scheduling core depends only on this interface. A job exposes its
/// registered name, an optional recurrence interval (which makes it
/// periodic), default submission options and an asynchronous body.
#[async_trait]
pub trait Job: Send + Sync {
    /// Registered name of the job.
    fn name(&self) -> &str;

    /// Recurrence interval. `Some` marks the job as periodic.
    fn run_every(&self) -> Option<Duration> {
        None
    }

    /// Whether the scheduler should pick this job up.
    fn is_periodic(&self) -> bool {
        self.run_every().is_some()
    }

    /// Default submission options. Per-call overrides win over these.
    fn exec_options(&self) -> ExecOptions {
        ExecOptions::default()
    }

    /// Eager execution context keys (`task_id`, `task_name`, `task_retries`,
    /// `task_is_eager`, `logfile`, `loglevel`) the body wants merged into
    /// its keyword arguments. Keys not listed here are never injected.
    fn accepted_context(&self) -> &[&'static str] {
        &[]
    }

    /// Run the job body.
    async fn run(&self, args: TaskArgs, kwargs: TaskKwargs) -> Result<Value, JobError>;
}
