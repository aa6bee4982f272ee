//! Local worker: a pool plus the result queue draining it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use taskbeat_core::gen_unique_id;
use taskbeat_protocols::publisher::TaskMessage;
use taskbeat_protocols::registry::JobRegistry;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::pool::WorkerPool;
use crate::process_queue::TaskProcessQueue;

/// Executes task messages on an in-process [`WorkerPool`] and tracks the
/// results in a [`TaskProcessQueue`].
pub struct LocalWorker {
    registry: Arc<dyn JobRegistry>,
    pool: WorkerPool,
    queue: Mutex<TaskProcessQueue>,
}

impl LocalWorker {
    pub fn new(registry: Arc<dyn JobRegistry>, config: QueueConfig) -> Self {
        let queue = TaskProcessQueue::from_config(&config);
        Self {
            registry,
            pool: WorkerPool::new(config),
            queue: Mutex::new(queue),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn start(&self) {
        self.pool.start();
    }

    /// Stop accepting work and wait for outstanding results.
    pub async fn shutdown(&self) {
        self.pool.stop();
        self.drain().await;
    }

    /// Run a task message, returning its task id.
    ///
    /// Blocks while the result queue drains if it has reached its limit.
    pub async fn execute(&self, message: TaskMessage) -> Result<String, QueueError> {
        let job = self.registry.lookup(&message.task)?;
        let task_id = message.id.unwrap_or_else(gen_unique_id);

        let handle = self.pool.submit(
            job,
            task_id.clone(),
            message.args,
            message.kwargs,
            message.eta,
        )?;
        debug!("Queued task {}[{}]", message.task, task_id);

        self.queue
            .lock()
            .await
            .add(Arc::new(handle), message.task, task_id.clone())
            .await;
        Ok(task_id)
    }

    /// Collect every outstanding result.
    pub async fn drain(&self) {
        self.queue.lock().await.collect().await;
    }

    /// Results not yet collected.
    pub async fn outstanding(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn collections(&self) -> u64 {
        self.queue.lock().await.collections()
    }
}
