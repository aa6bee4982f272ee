//! Asynchronous submission capability.
//!
//! The scheduler submits due jobs through [`TaskSubmitter`] without
//! knowing whether they run inline or get published.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DispatchError;
use crate::job::{Job, TaskArgs, TaskKwargs};
use crate::options::ExecOptions;
use crate::publisher::Publisher;
use crate::result::AsyncResult;

/// Per-call parameters of `apply_async`.
#[derive(Clone, Default)]
pub struct ApplyRequest {
    pub args: TaskArgs,
    pub kwargs: TaskKwargs,
    /// Relative delay, converted to an absolute eta at submission.
    pub countdown: Option<Duration>,
    /// Absolute earliest execution time. Exclusive with `countdown`.
    pub eta: Option<DateTime<Utc>>,
    pub task_id: Option<String>,
    /// Publisher to reuse. It is left open after submission.
    pub publisher: Option<Arc<dyn Publisher>>,
    /// Overrides for the job's default options.
    pub options: ExecOptions,
}

impl ApplyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args(mut self, args: TaskArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: TaskKwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = Some(countdown);
        self
    }

    pub fn with_eta(mut self, eta: DateTime<Utc>) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for ApplyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyRequest")
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("countdown", &self.countdown)
            .field("eta", &self.eta)
            .field("task_id", &self.task_id)
            .field("publisher", &self.publisher.as_ref().map(|_| "<publisher>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Asynchronous submission of a job.
#[async_trait]
pub trait TaskSubmitter: Send + Sync {
    async fn apply_async(
        &self,
        job: Arc<dyn Job>,
        request: ApplyRequest,
    ) -> Result<AsyncResult, DispatchError>;
}
