//! Fakes shared by the unit tests of this crate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use taskbeat_protocols::error::{DispatchError, JobError, PublishError};
use taskbeat_protocols::job::{Job, TaskArgs, TaskKwargs};
use taskbeat_protocols::result::{AsyncResult, RemoteResult};
use taskbeat_protocols::submit::{ApplyRequest, TaskSubmitter};

pub struct PeriodicJob {
    name: String,
    every: Option<Duration>,
}

#[async_trait]
impl Job for PeriodicJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_every(&self) -> Option<Duration> {
        self.every
    }

    async fn run(&self, _args: TaskArgs, _kwargs: TaskKwargs) -> Result<Value, JobError> {
        Ok(Value::Null)
    }
}

pub fn periodic(name: &str, secs: u64) -> Arc<dyn Job> {
    periodic_every(name, Duration::from_secs(secs))
}

pub fn periodic_every(name: &str, every: Duration) -> Arc<dyn Job> {
    Arc::new(PeriodicJob {
        name: name.to_string(),
        every: Some(every),
    })
}

pub fn on_demand(name: &str) -> Arc<dyn Job> {
    Arc::new(PeriodicJob {
        name: name.to_string(),
        every: None,
    })
}

/// Records submitted job names, failing for the configured ones.
#[derive(Default)]
pub struct RecordingSubmitter {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingSubmitter {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == name).count()
    }
}

#[async_trait]
impl TaskSubmitter for RecordingSubmitter {
    async fn apply_async(
        &self,
        job: Arc<dyn Job>,
        _request: ApplyRequest,
    ) -> Result<AsyncResult, DispatchError> {
        let name = job.name().to_string();
        let id = format!("{}-{}", name, self.calls.lock().len());
        self.calls.lock().push(name.clone());

        if self.failing.contains(&name) {
            return Err(DispatchError::Publish(PublishError::Connection(
                "broker unreachable".to_string(),
            )));
        }
        Ok(AsyncResult::Remote(RemoteResult::new(id)))
    }
}
