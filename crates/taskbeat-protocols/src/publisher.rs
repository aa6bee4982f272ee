//! Publisher contract.
//!
//! The transport behind a publisher is external to the scheduling core.
//! A [`Connector`] hands out publishers; the dispatch path closes the ones
//! it acquired itself.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::job::{TaskArgs, TaskKwargs};
use crate::options::ExecOptions;

/// A task submission as handed to a publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Registered job name.
    pub task: String,
    /// Caller supplied id. The publisher generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub args: TaskArgs,
    #[serde(default)]
    pub kwargs: TaskKwargs,
    /// Earliest execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: ExecOptions,
}

impl TaskMessage {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            id: None,
            args: TaskArgs::new(),
            kwargs: TaskKwargs::new(),
            eta: None,
            options: ExecOptions::default(),
        }
    }
}

/// Submits task messages towards workers.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a task, returning the id it was published under.
    async fn delay_task(&self, message: TaskMessage) -> Result<String, PublishError>;

    /// Release the publisher's resources.
    async fn close(&self) -> Result<(), PublishError>;
}

/// Acquires publishers.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a publisher, optionally bound to a named exchange.
    async fn publisher(&self, exchange: Option<&str>) -> Result<Arc<dyn Publisher>, PublishError>;
}
