//! Task results and result handles.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResultError;

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Not started, or state unknown.
    Pending,
    /// Picked up by a worker.
    Started,
    /// Finished and returned a value.
    Success,
    /// Finished with an error.
    Failure,
}

impl TaskState {
    /// Whether the task has finished, successfully or not.
    pub fn is_ready(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Started => write!(f, "STARTED"),
            TaskState::Success => write!(f, "SUCCESS"),
            TaskState::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Handle to an in-flight or completed job.
#[async_trait]
pub trait ResultHandle: Send + Sync {
    /// Id of the task this handle tracks.
    fn task_id(&self) -> &str;

    /// Whether a result is available without waiting.
    fn ready(&self) -> bool;

    /// Resolve once the handle is ready.
    async fn wait_ready(&self);

    /// Fetch the result, waiting at most `timeout` (forever when `None`).
    ///
    /// [`ResultError::Timeout`] is distinct from the job's own failure,
    /// which is reported as [`ResultError::TaskFailed`].
    async fn get(&self, timeout: Option<Duration>) -> Result<Value, ResultError>;
}

/// Result of a job executed inline by the dispatch path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EagerResult {
    pub task_id: String,
    /// Return value on success.
    pub result: Option<Value>,
    pub status: TaskState,
    /// Captured failure trace.
    pub traceback: Option<String>,
}

impl EagerResult {
    pub fn success(task_id: impl Into<String>, value: Value) -> Self {
        Self {
            task_id: task_id.into(),
            result: Some(value),
            status: TaskState::Success,
            traceback: None,
        }
    }

    pub fn failure(task_id: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            result: None,
            status: TaskState::Failure,
            traceback: Some(traceback.into()),
        }
    }

    pub fn successful(&self) -> bool {
        self.status == TaskState::Success
    }

    /// The return value, or the failure as an error.
    pub fn value(&self) -> Result<Value, ResultError> {
        match self.status {
            TaskState::Success => Ok(self.result.clone().unwrap_or(Value::Null)),
            _ => Err(ResultError::TaskFailed {
                task_id: self.task_id.clone(),
                reason: self.traceback.clone().unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ResultHandle for EagerResult {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn ready(&self) -> bool {
        true
    }

    async fn wait_ready(&self) {}

    async fn get(&self, _timeout: Option<Duration>) -> Result<Value, ResultError> {
        self.value()
    }
}

/// Result of a job handed to a publisher. Only the id is known locally;
/// querying its state belongs to a result backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResult {
    pub task_id: String,
}

impl RemoteResult {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

/// What `apply_async` returns.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncResult {
    /// The job already ran inline.
    Eager(EagerResult),
    /// The job was published.
    Remote(RemoteResult),
}

impl AsyncResult {
    pub fn task_id(&self) -> &str {
        match self {
            AsyncResult::Eager(result) => &result.task_id,
            AsyncResult::Remote(result) => &result.task_id,
        }
    }

    pub fn is_eager(&self) -> bool {
        matches!(self, AsyncResult::Eager(_))
    }

    pub fn as_eager(&self) -> Option<&EagerResult> {
        match self {
            AsyncResult::Eager(result) => Some(result),
            AsyncResult::Remote(_) => None,
        }
    }
}
