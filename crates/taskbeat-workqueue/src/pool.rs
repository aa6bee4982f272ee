//! Worker pool for job execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Semaphore, watch};
use tracing::{debug, info};

use taskbeat_execute::TaskTrace;
use taskbeat_protocols::error::ResultError;
use taskbeat_protocols::job::{Job, TaskArgs, TaskKwargs};
use taskbeat_protocols::result::{ResultHandle, TaskState};

use crate::config::QueueConfig;
use crate::error::QueueError;

type Outcome = Option<Result<Value, String>>;

/// Handle to a job submitted to a [`WorkerPool`].
#[derive(Clone)]
pub struct PoolResult {
    task_id: String,
    rx: watch::Receiver<Outcome>,
}

impl PoolResult {
    /// Whether the job ran and succeeded. `None` while still pending.
    pub fn successful(&self) -> Option<bool> {
        self.rx.borrow().as_ref().map(|r| r.is_ok())
    }

    async fn settled(&self) {
        let mut rx = self.rx.clone();
        // An error here means the worker dropped the sender, which
        // `get` reports as a lost result.
        let _ = rx.wait_for(|outcome| outcome.is_some()).await;
    }
}

#[async_trait]
impl ResultHandle for PoolResult {
    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn ready(&self) -> bool {
        self.rx.borrow().is_some() || self.rx.has_changed().is_err()
    }

    async fn wait_ready(&self) {
        self.settled().await;
    }

    async fn get(&self, timeout: Option<Duration>) -> Result<Value, ResultError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.settled())
                .await
                .map_err(|_| ResultError::Timeout(limit))?,
            None => self.settled().await,
        }

        let outcome = self.rx.borrow().clone();
        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(ResultError::TaskFailed {
                task_id: self.task_id.clone(),
                reason,
            }),
            None => Err(ResultError::Lost(self.task_id.clone())),
        }
    }
}

/// Worker pool for concurrent job execution.
pub struct WorkerPool {
    config: QueueConfig,
    semaphore: Arc<Semaphore>,
    running: Arc<AtomicBool>,
    total_processed: Arc<AtomicU64>,
    total_failed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(config: QueueConfig) -> Self {
        let permits = config.concurrency.max(1);
        Self {
            config,
            semaphore: Arc::new(Semaphore::new(permits)),
            running: Arc::new(AtomicBool::new(false)),
            total_processed: Arc::new(AtomicU64::new(0)),
            total_failed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Start the worker pool.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("Worker pool started with concurrency {}", self.config.concurrency);
    }

    /// Stop accepting jobs. Jobs already submitted still run.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("Worker pool stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Jobs that finished successfully.
    pub fn total_processed(&self) -> u64 {
        self.total_processed.load(Ordering::SeqCst)
    }

    /// Jobs that failed or panicked.
    pub fn total_failed(&self) -> u64 {
        self.total_failed.load(Ordering::SeqCst)
    }

    /// Get number of idle execution slots.
    pub fn available_workers(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Submit a job. It starts no earlier than `eta` and once a slot is free.
    pub fn submit(
        &self,
        job: Arc<dyn Job>,
        task_id: String,
        args: TaskArgs,
        kwargs: TaskKwargs,
        eta: Option<DateTime<Utc>>,
    ) -> Result<PoolResult, QueueError> {
        if !self.is_running() {
            return Err(QueueError::PoolNotRunning);
        }

        let (tx, rx) = watch::channel(None);
        let semaphore = self.semaphore.clone();
        let total_processed = self.total_processed.clone();
        let total_failed = self.total_failed.clone();
        let id = task_id.clone();

        tokio::spawn(async move {
            if let Some(eta) = eta {
                if let Ok(delay) = (eta - Utc::now()).to_std() {
                    debug!("Task {}[{}] waiting {:?} for eta", job.name(), id, delay);
                    tokio::time::sleep(delay).await;
                }
            }

            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };

            let result = TaskTrace::new(job, id, args, kwargs).execute().await;
            let outcome = match result.status {
                TaskState::Success => {
                    total_processed.fetch_add(1, Ordering::SeqCst);
                    Ok(result.result.unwrap_or(Value::Null))
                }
                _ => {
                    total_failed.fetch_add(1, Ordering::SeqCst);
                    Err(result.traceback.unwrap_or_default())
                }
            };
            let _ = tx.send(Some(outcome));
        });

        Ok(PoolResult { task_id, rx })
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
