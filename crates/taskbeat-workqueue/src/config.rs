//! Queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker pool and result queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of jobs executing at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Outstanding results tolerated before `add` drains the queue.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Wait applied to each ready handle during collection.
    #[serde(default)]
    pub process_timeout_ms: Option<u64>,

    /// Message logged per collected result.
    #[serde(default)]
    pub done_msg: Option<String>,
}

fn default_concurrency() -> usize {
    4
}

fn default_limit() -> usize {
    16
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            limit: default_limit(),
            process_timeout_ms: None,
            done_msg: None,
        }
    }
}

impl QueueConfig {
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_ms.map(Duration::from_millis)
    }
}
