//! Inline execution of a job body.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info};

use taskbeat_protocols::job::{Job, TaskArgs, TaskKwargs};
use taskbeat_protocols::result::EagerResult;

/// Runs one job body and turns its outcome, including a panic, into an
/// [`EagerResult`].
pub struct TaskTrace {
    job: Arc<dyn Job>,
    task_id: String,
    args: TaskArgs,
    kwargs: TaskKwargs,
}

impl TaskTrace {
    pub fn new(job: Arc<dyn Job>, task_id: impl Into<String>, args: TaskArgs, kwargs: TaskKwargs) -> Self {
        Self {
            job,
            task_id: task_id.into(),
            args,
            kwargs,
        }
    }

    pub async fn execute(self) -> EagerResult {
        let name = self.job.name().to_string();
        let outcome = AssertUnwindSafe(self.job.run(self.args, self.kwargs))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => {
                info!("Task {}[{}] succeeded", name, self.task_id);
                EagerResult::success(self.task_id, value)
            }
            Ok(Err(e)) => {
                error!("Task {}[{}] raised: {}", name, self.task_id, e);
                EagerResult::failure(self.task_id, format_error(&e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Task {}[{}] panicked: {}", name, self.task_id, message);
                EagerResult::failure(self.task_id, format!("panicked: {}", message))
            }
        }
    }
}

/// Error and its source chain, one cause per line.
fn format_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str("\ncaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
