//! Dispatcher: the `apply_async` / `apply` pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use taskbeat_core::gen_unique_id;
use taskbeat_protocols::error::DispatchError;
use taskbeat_protocols::job::{Job, TaskArgs, TaskKwargs};
use taskbeat_protocols::publisher::{Connector, TaskMessage};
use taskbeat_protocols::registry::JobRegistry;
use taskbeat_protocols::result::{AsyncResult, EagerResult, RemoteResult};
use taskbeat_protocols::submit::{ApplyRequest, TaskSubmitter};

use crate::context::EagerContext;
use crate::trace::TaskTrace;

/// Dispatcher settings.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Run every submission inline.
    pub always_eager: bool,

    /// Offered to eager jobs as the `logfile` context key.
    pub logfile: Option<String>,

    /// Offered to eager jobs as the `loglevel` context key.
    pub loglevel: Option<String>,
}

/// Submits jobs either inline or through a publisher.
pub struct Dispatcher {
    registry: Arc<dyn JobRegistry>,
    connector: Arc<dyn Connector>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<dyn JobRegistry>, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry,
            connector,
            config: DispatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run `job` inline under a fresh task id.
    ///
    /// Never touches a publisher. The body's failure or panic is captured
    /// in the returned result.
    pub async fn apply(
        &self,
        job: Arc<dyn Job>,
        args: TaskArgs,
        kwargs: TaskKwargs,
        retries: u32,
    ) -> EagerResult {
        let task_id = gen_unique_id();
        let context = EagerContext::new(job.name(), task_id.clone())
            .with_retries(retries)
            .with_logging(self.config.logfile.clone(), self.config.loglevel.clone());
        let kwargs = context.extend_kwargs(kwargs, job.accepted_context());

        debug!("Applying {}[{}] eagerly", job.name(), task_id);
        TaskTrace::new(job, task_id, args, kwargs).execute().await
    }

    /// Look up a job by name and submit it with default options.
    pub async fn delay_task(
        &self,
        name: &str,
        args: TaskArgs,
        kwargs: TaskKwargs,
    ) -> Result<AsyncResult, DispatchError> {
        let job = self.registry.lookup(name)?;
        let request = ApplyRequest::new().with_args(args).with_kwargs(kwargs);
        self.apply_async(job, request).await
    }

    async fn publish(
        &self,
        job: Arc<dyn Job>,
        request: ApplyRequest,
    ) -> Result<AsyncResult, DispatchError> {
        let job = self.registry.lookup(job.name())?;
        let options = job.exec_options().merged_with(&request.options);

        let eta = match (request.countdown, request.eta) {
            (Some(_), Some(_)) => return Err(DispatchError::ConflictingSchedule),
            (Some(countdown), None) => {
                let delta = chrono::Duration::from_std(countdown)
                    .map_err(|e| DispatchError::InvalidCountdown(e.to_string()))?;
                let eta = Utc::now().checked_add_signed(delta).ok_or_else(|| {
                    DispatchError::InvalidCountdown(format!(
                        "{}s is past the latest representable time",
                        countdown.as_secs()
                    ))
                })?;
                Some(eta)
            }
            (None, eta) => eta,
        };

        let (publisher, acquired) = match request.publisher {
            Some(publisher) => (publisher, false),
            None => (
                self.connector.publisher(options.exchange.as_deref()).await?,
                true,
            ),
        };

        let message = TaskMessage {
            task: job.name().to_string(),
            id: request.task_id,
            args: request.args,
            kwargs: request.kwargs,
            eta,
            options,
        };

        let published = publisher.delay_task(message).await;

        if acquired {
            if let Err(e) = publisher.close().await {
                warn!("Failed to close publisher for {}: {}", job.name(), e);
            }
        }

        let task_id = published?;
        info!("Sent task {}[{}]", job.name(), task_id);
        Ok(AsyncResult::Remote(RemoteResult::new(task_id)))
    }
}

#[async_trait]
impl TaskSubmitter for Dispatcher {
    async fn apply_async(
        &self,
        job: Arc<dyn Job>,
        request: ApplyRequest,
    ) -> Result<AsyncResult, DispatchError> {
        if self.config.always_eager {
            let result = self.apply(job, request.args, request.kwargs, 0).await;
            return Ok(AsyncResult::Eager(result));
        }
        self.publish(job, request).await
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
