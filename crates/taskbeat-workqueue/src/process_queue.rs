//! Bounded result collection.

use std::sync::Arc;
use std::time::Duration;

use futures::future::select_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use taskbeat_protocols::result::ResultHandle;

use crate::config::QueueConfig;

/// Pause after a collection pass that removed nothing.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

struct QueueEntry {
    handle: Arc<dyn ResultHandle>,
    task_name: String,
    task_id: String,
}

/// Queue of in-flight results with a capacity limit.
///
/// Adding the entry that brings the queue to its limit drains every
/// outstanding result before `add` returns, which throttles the producer
/// to the pace of the workers.
pub struct TaskProcessQueue {
    limit: usize,
    process_timeout: Option<Duration>,
    done_msg: Option<String>,
    entries: Vec<QueueEntry>,
    collections: u64,
    processed: u64,
}

impl TaskProcessQueue {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            process_timeout: None,
            done_msg: None,
            entries: Vec::new(),
            collections: 0,
            processed: 0,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        let mut queue = Self::new(config.limit);
        queue.process_timeout = config.process_timeout();
        queue.done_msg = config.done_msg.clone();
        queue
    }

    /// Per-handle wait applied while collecting.
    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = Some(timeout);
        self
    }

    /// Template logged per collected result.
    pub fn with_done_msg(mut self, done_msg: impl Into<String>) -> Self {
        self.done_msg = Some(done_msg.into());
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `collect` runs so far.
    pub fn collections(&self) -> u64 {
        self.collections
    }

    /// Results removed from the queue so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Track a result. Drains the queue when the limit is reached.
    pub async fn add(
        &mut self,
        handle: Arc<dyn ResultHandle>,
        task_name: impl Into<String>,
        task_id: impl Into<String>,
    ) {
        self.entries.push(QueueEntry {
            handle,
            task_name: task_name.into(),
            task_id: task_id.into(),
        });

        if self.entries.len() >= self.limit {
            self.collect().await;
        }
    }

    /// Wait for every entry present now and remove it once its result is in.
    pub async fn collect(&mut self) {
        self.collections += 1;
        let mut pending = std::mem::take(&mut self.entries);
        debug!("Collecting {} outstanding results", pending.len());

        while !pending.is_empty() {
            if !pending.iter().any(|entry| entry.handle.ready()) {
                let waits: Vec<_> = pending.iter().map(|entry| entry.handle.wait_ready()).collect();
                select_all(waits).await;
            }

            let mut progressed = false;
            let mut remaining = Vec::with_capacity(pending.len());

            for entry in pending {
                if !entry.handle.ready() {
                    remaining.push(entry);
                    continue;
                }

                match entry.handle.get(self.process_timeout).await {
                    Ok(value) => {
                        self.on_ready(&entry, &value);
                        progressed = true;
                    }
                    Err(e) if e.is_timeout() => remaining.push(entry),
                    Err(e) => {
                        warn!("Task {}[{}] finished with error: {}", entry.task_name, entry.task_id, e);
                        self.processed += 1;
                        progressed = true;
                    }
                }
            }

            pending = remaining;
            if !progressed && !pending.is_empty() {
                tokio::time::sleep(IDLE_BACKOFF).await;
            }
        }
    }

    fn on_ready(&mut self, entry: &QueueEntry, value: &Value) {
        self.processed += 1;
        match self.done_msg {
            Some(ref template) => info!("{}", format_done_msg(template, entry, value)),
            None => debug!("Task {}[{}] collected", entry.task_name, entry.task_id),
        }
    }
}

fn format_done_msg(template: &str, entry: &QueueEntry, value: &Value) -> String {
    template
        .replace("{name}", &entry.task_name)
        .replace("{id}", &entry.task_id)
        .replace("{return_value}", &value.to_string())
}

#[cfg(test)]
#[path = "process_queue_tests.rs"]
mod tests;
