//! In-process publisher feeding a [`LocalWorker`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use taskbeat_protocols::error::PublishError;
use taskbeat_protocols::publisher::{Connector, Publisher, TaskMessage};

use crate::worker::LocalWorker;

/// Hands out publishers bound to one local worker.
pub struct PoolConnector {
    worker: Arc<LocalWorker>,
}

impl PoolConnector {
    pub fn new(worker: Arc<LocalWorker>) -> Self {
        Self { worker }
    }
}

#[async_trait]
impl Connector for PoolConnector {
    async fn publisher(&self, exchange: Option<&str>) -> Result<Arc<dyn Publisher>, PublishError> {
        if let Some(exchange) = exchange {
            debug!("Exchange {} ignored by the local pool", exchange);
        }
        let publisher: Arc<dyn Publisher> = Arc::new(PoolPublisher::new(self.worker.clone()));
        Ok(publisher)
    }
}

/// Publisher that runs messages on the local worker.
pub struct PoolPublisher {
    worker: Arc<LocalWorker>,
    closed: AtomicBool,
}

impl PoolPublisher {
    pub fn new(worker: Arc<LocalWorker>) -> Self {
        Self {
            worker,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for PoolPublisher {
    async fn delay_task(&self, message: TaskMessage) -> Result<String, PublishError> {
        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        self.worker
            .execute(message)
            .await
            .map_err(|e| PublishError::Rejected(e.to_string()))
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
